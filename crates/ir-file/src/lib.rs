//! ir-file: Impulse-response file loading
//!
//! Reads mono WAV files into normalized `f32` samples:
//! - PCM 16-bit and 24-bit integer
//! - PCM / IEEE float 32-bit
//!
//! Non-standard chunk layouts are tolerated: unknown chunks ahead of the
//! `fmt ` and `data` chunks are skipped, and oversized `fmt ` chunks are
//! accepted.

mod error;
mod raw_audio;
pub mod wav;

pub use error::*;
pub use raw_audio::*;
pub use wav::{decode, load};
