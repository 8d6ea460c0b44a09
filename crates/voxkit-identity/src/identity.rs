//! Voice identity records and their public views.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A registered voice identity.
///
/// Instances are owned exclusively by the store; callers receive
/// [`VoiceSummary`] views or cloned feature vectors, never mutable aliases
/// into stored state.
#[derive(Debug, Clone)]
pub struct VoiceIdentity {
    /// Opaque stable id, 16 lowercase hex characters. Immutable once
    /// assigned.
    pub voice_id: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Whether explicit consent was granted. Always true at creation;
    /// creation fails otherwise.
    pub consent_granted: bool,
    /// Fixed-length spectral feature vector
    /// ([`voxkit_dsp::FEATURE_DIM`] elements).
    pub feature_vector: Vec<f64>,
    /// Registration timestamp, RFC 3339.
    pub created_at: String,
    /// Caller-supplied namespace for grouping and bulk purge.
    pub project_scope: String,
    /// Free-form string metadata.
    pub metadata: BTreeMap<String, String>,
    /// One-way revocation flag. Never cleared.
    pub revoked: bool,
}

impl VoiceIdentity {
    /// Returns the public view of this identity (no feature vector).
    pub fn summary(&self) -> VoiceSummary {
        VoiceSummary {
            voice_id: self.voice_id.clone(),
            display_name: self.display_name.clone(),
            consent_granted: self.consent_granted,
            created_at: self.created_at.clone(),
            project_scope: self.project_scope.clone(),
            metadata: self.metadata.clone(),
            revoked: self.revoked,
        }
    }
}

/// Public identity view, safe to hand to callers and to persist as
/// metadata. Deliberately excludes the feature vector, which lives in its
/// own per-voice artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSummary {
    /// Opaque stable id.
    pub voice_id: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Whether explicit consent was granted.
    pub consent_granted: bool,
    /// Registration timestamp, RFC 3339.
    pub created_at: String,
    /// Caller-supplied namespace.
    pub project_scope: String,
    /// Free-form string metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// One-way revocation flag.
    #[serde(default)]
    pub revoked: bool,
}

impl VoiceSummary {
    /// Reconstructs a full identity from a persisted summary plus its
    /// feature vector. Used when loading the store from disk.
    pub(crate) fn into_identity(self, feature_vector: Vec<f64>) -> VoiceIdentity {
        VoiceIdentity {
            voice_id: self.voice_id,
            display_name: self.display_name,
            consent_granted: self.consent_granted,
            feature_vector,
            created_at: self.created_at,
            project_scope: self.project_scope,
            metadata: self.metadata,
            revoked: self.revoked,
        }
    }
}
