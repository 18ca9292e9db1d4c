//! ir-core: Shared types for the impulse-response crates
//!
//! This crate provides the foundational types used by `ir-file` and `ir-dsp`.

mod error;
mod gain;
mod sample;

pub use error::*;
pub use gain::*;
pub use sample::*;

/// Decibel value wrapper
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Decibels(pub f64);

impl Decibels {
    /// Linear gain; -144 dB and below is silence
    #[inline]
    pub fn to_gain(self) -> f64 {
        if self.0 <= -144.0 {
            0.0
        } else {
            10.0_f64.powf(self.0 / 20.0)
        }
    }
}

/// Validate a sample rate coming from a host or a file header.
#[inline]
pub fn check_sample_rate(sample_rate: f64) -> IrResult<f64> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(sample_rate)
    } else {
        Err(IrError::InvalidSampleRate(sample_rate))
    }
}
