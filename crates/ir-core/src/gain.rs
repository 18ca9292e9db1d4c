//! Sample-rate-dependent kernel gain

use serde::{Deserialize, Serialize};

use crate::{Decibels, IrResult, check_sample_rate};

/// Loudness normalization applied to every kernel tap.
///
/// A kernel built at a higher sample rate has proportionally more taps
/// covering the same stretch of time, so the per-tap gain is scaled by
/// `reference_sample_rate / target_sample_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GainConfig {
    /// Reference level the IR is normalized to
    pub reference_db: Decibels,
    /// Sample rate at which `reference_db` applies unscaled
    pub reference_sample_rate: f64,
}

impl Default for GainConfig {
    fn default() -> Self {
        Self {
            reference_db: Decibels(-18.0),
            reference_sample_rate: 48000.0,
        }
    }
}

impl GainConfig {
    /// Per-tap gain for a kernel running at `target_sample_rate`.
    pub fn gain_for(&self, target_sample_rate: f64) -> IrResult<f64> {
        let target = check_sample_rate(target_sample_rate)?;
        let reference = check_sample_rate(self.reference_sample_rate)?;
        Ok(self.reference_db.to_gain() * reference / target)
    }
}
