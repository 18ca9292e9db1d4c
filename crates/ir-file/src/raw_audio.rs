//! Decoded impulse-response audio

use ir_core::Tap;
use serde::{Deserialize, Serialize};

/// Source audio of an impulse response, before resampling and gain.
///
/// This is what a host persists with its state: restoring it rebuilds the
/// kernel for whatever sample rate the host runs at after reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAudio {
    /// Normalized samples, roughly in [-1, 1]
    pub samples: Vec<Tap>,
    /// Native sample rate of the file in Hz
    pub sample_rate: f64,
}

impl RawAudio {
    pub fn new(samples: Vec<Tap>, sample_rate: f64) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Number of samples
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
