//! Error types for the synthesis orchestrator.

use thiserror::Error;
use voxkit_dsp::DspError;
use voxkit_identity::IdentityError;

use crate::generator::GeneratorError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while orchestrating a synthesis request.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested voice is unknown or has been revoked.
    #[error("voice '{voice_id}' not found or revoked")]
    VoiceNotFound {
        /// The requested voice id.
        voice_id: String,
    },

    /// The voice exists but its consent flag is no longer set.
    ///
    /// Unreachable while the registry invariant holds (consent is required
    /// at creation and revocation removes the voice), but consent state is
    /// re-checked at synthesis time anyway.
    #[error("consent withdrawn for voice '{voice_id}'")]
    ConsentWithdrawn {
        /// The affected voice id.
        voice_id: String,
    },

    /// The external base-waveform generator failed.
    #[error("base waveform generation failed: {0}")]
    Upstream(#[from] GeneratorError),

    /// A registry operation failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Parameter validation or a modulation stage failed.
    #[error(transparent)]
    Dsp(#[from] DspError),
}

impl EngineError {
    /// Creates a voice-not-found error.
    pub fn voice_not_found(voice_id: impl Into<String>) -> Self {
        Self::VoiceNotFound {
            voice_id: voice_id.into(),
        }
    }
}
