//! IR load error types

use std::fmt;

use thiserror::Error;

/// Reasons a WAV file can be rejected as an impulse response.
///
/// `Display` renders `message()`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadError {
    Opening,
    NotRiff,
    NotWave,
    MissingFormat,
    InvalidFile,
    UnsupportedAlaw,
    UnsupportedMulaw,
    UnsupportedExtensible,
    NotMono,
    UnsupportedBitsPerSample,
}

impl LoadError {
    /// Human-readable message for display in a host UI
    pub fn message(&self) -> &'static str {
        match self {
            Self::Opening => "Failed to open file (is it being used by another program?)",
            Self::NotRiff | Self::NotWave => "File is not a WAV file.",
            Self::MissingFormat => "File is missing expected format chunk.",
            Self::InvalidFile => "WAV file contents are invalid.",
            Self::UnsupportedAlaw => "Unsupported file format \"A-law\"",
            Self::UnsupportedMulaw => "Unsupported file format \"mu-law\"",
            Self::UnsupportedExtensible => "Unsupported file format \"extensible\"",
            Self::NotMono => "File is not mono.",
            Self::UnsupportedBitsPerSample => "Unsupported bits per sample",
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Truncated reads are the only I/O failure a parse can hit once the file
/// is open; a short stream is an invalid file.
impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        log::warn!("I/O error while reading WAV: {}", err);
        LoadError::InvalidFile
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
