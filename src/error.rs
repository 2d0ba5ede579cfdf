use std::io;

use thiserror::Error;

/// Errors raised by track construction, mixing, the codec and playback.
#[derive(Debug, Error)]
pub enum SonoError {
    /// A duration, frequency, cue position or constructor argument is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The string is not in scientific pitch notation.
    #[error("unknown note: {0:?}")]
    InvalidPitchName(String),

    /// The WAV container is compressed, multi-channel or malformed.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// File or network failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No playback sink is usable in the current environment.
    #[error("no playback backend available: {0}")]
    BackendUnavailable(String),

    /// Malformed score or configuration document.
    #[error("invalid score: {0}")]
    Score(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SonoError>;

impl SonoError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SonoError::InvalidParameter(msg.into())
    }
}

impl From<hound::Error> for SonoError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => SonoError::Io(io),
            other => SonoError::UnsupportedFormat(other.to_string()),
        }
    }
}
