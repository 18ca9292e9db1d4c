//! ir-dsp: Impulse-response convolution
//!
//! Direct (time-domain) convolution of live audio with a mono IR, as used
//! for guitar cabinet simulation.
//!
//! ## Modules
//! - `resample` - Catmull-Rom cubic resampling of the IR to the host rate
//! - `history` - Rolling input history with a sliding dot-product window
//! - `impulse_response` - Kernel construction and block processing
//! - `handoff` - Lock-free installation of new IRs on the audio thread

pub mod handoff;
pub mod history;
pub mod impulse_response;
pub mod resample;

mod error;

pub use error::*;
pub use handoff::{HandoffError, IrLoader, IrSlot, ir_channel};
pub use impulse_response::{ImpulseResponse, ImpulseResponseConfig, LoadState, ProcessedBlock};
pub use ir_file::{LoadError, RawAudio};

/// Trait for all DSP processors
pub trait Processor: Send + Sync {
    /// Reset processor state
    fn reset(&mut self);

    /// Get latency in samples
    fn latency(&self) -> usize {
        0
    }
}
