//! Error types shared across the IR crates

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Impulse response contains no samples")]
    EmptyAudio,
}

/// Result type alias
pub type IrResult<T> = Result<T, IrError>;
