//! Error types for the DSP crate.

use thiserror::Error;

/// Result type for DSP operations.
pub type DspResult<T> = Result<T, DspError>;

/// Errors that can occur during audio analysis or modulation.
#[derive(Debug, Error)]
pub enum DspError {
    /// The input audio could not be decoded.
    #[error("failed to decode audio: {message}")]
    Decode {
        /// Decoder error message.
        message: String,
    },

    /// The input contained no voiced frames, so no pitch estimate exists.
    #[error("no voiced frames detected in input audio")]
    NoVoicedFrames,

    /// A modulation ratio was not strictly positive.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// A modulation stage failed.
    #[error("modulation failed at stage '{stage}': {message}")]
    Modulation {
        /// Name of the offending stage (pitch, speed, energy).
        stage: String,
        /// Error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DspError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a modulation stage error.
    pub fn modulation(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Modulation {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}
