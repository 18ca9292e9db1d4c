//! Convolution engine error types

use ir_core::IrError;
use ir_file::LoadError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImpulseResponseError {
    #[error("Failed to load IR: {0}")]
    Load(#[from] LoadError),

    #[error(transparent)]
    Core(#[from] IrError),

    #[error("Impulse response is not loaded")]
    NotLoaded,

    #[error("Buffer mismatch: {channels} channels, {available} samples for {frames} frames")]
    BufferMismatch {
        channels: usize,
        frames: usize,
        available: usize,
    },
}

pub type ImpulseResponseResult<T> = Result<T, ImpulseResponseError>;
