//! Error types for the identity registry.

use thiserror::Error;
use voxkit_dsp::DspError;

/// Result type for registry operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors that can occur in the voice identity registry.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Registration attempted without explicit consent.
    #[error("explicit consent is required to register a voice")]
    ConsentDenied,

    /// The registration audio sample does not exist.
    #[error("audio sample not found for registration")]
    AudioNotFound,

    /// The voice id is unknown or already revoked.
    #[error("voice '{voice_id}' not found")]
    NotFound {
        /// The requested voice id.
        voice_id: String,
    },

    /// Feature extraction or decoding of the sample failed.
    #[error("audio analysis failed: {0}")]
    Audio(#[from] DspError),

    /// A durable read or write failed.
    #[error("persistence failure during {action}: {message}")]
    Persistence {
        /// The operation that failed (e.g. "metadata write").
        action: String,
        /// Underlying error message.
        message: String,
    },
}

impl IdentityError {
    /// Creates a not-found error.
    pub fn not_found(voice_id: impl Into<String>) -> Self {
        Self::NotFound {
            voice_id: voice_id.into(),
        }
    }

    /// Creates a persistence error.
    pub fn persistence(action: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Persistence {
            action: action.into(),
            message: message.to_string(),
        }
    }
}
