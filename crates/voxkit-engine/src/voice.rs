//! Voice selection resolution.
//!
//! A synthesis request may name a registered voice, one of the two
//! pretrained defaults, or nothing (which means the female default). The
//! resolved voice contributes one scalar to the pipeline: a base pitch that
//! is normalized against the reference pitch to bias the request's pitch
//! ratio.

use std::sync::Arc;

use voxkit_dsp::{default_features, DefaultProfile};
use voxkit_identity::VoiceStore;

use crate::error::{EngineError, EngineResult};

/// Reference pitch for normalization, in Hz (the female-default base pitch).
pub const REFERENCE_PITCH_HZ: f64 = 220.0;

/// Id of the pretrained male default voice.
pub const MALE_DEFAULT_ID: &str = "male_default";

/// Id of the pretrained female default voice.
pub const FEMALE_DEFAULT_ID: &str = "female_default";

/// A voice selection resolved to concrete synthesis inputs.
#[derive(Debug, Clone)]
pub struct ResolvedVoice {
    /// The id the resolution came from, if any was requested.
    pub voice_id: Option<String>,
    /// Base pitch read from the voice's feature vector, in Hz.
    ///
    /// For the pretrained defaults this is their configured base pitch; for
    /// registered voices it is element 0 of the stored vector (see
    /// DESIGN.md for the layout asymmetry).
    pub base_pitch: f64,
}

impl ResolvedVoice {
    /// Pitch bias relative to the reference pitch.
    pub fn pitch_bias(&self) -> f64 {
        self.base_pitch / REFERENCE_PITCH_HZ
    }
}

/// Resolves an optional voice id against the store and the pretrained
/// defaults.
///
/// # Errors
/// - [`EngineError::VoiceNotFound`] for unknown or revoked ids
/// - [`EngineError::ConsentWithdrawn`] when the stored consent flag is
///   false (the registry refuses to create such records, but the flag is
///   re-checked here anyway)
pub fn resolve_voice(store: &Arc<VoiceStore>, voice_id: Option<&str>) -> EngineResult<ResolvedVoice> {
    let requested = match voice_id {
        None => {
            return Ok(ResolvedVoice {
                voice_id: None,
                base_pitch: default_features(DefaultProfile::Female)[0],
            })
        }
        Some(id) => id,
    };

    let profile = match requested {
        MALE_DEFAULT_ID => Some(DefaultProfile::Male),
        FEMALE_DEFAULT_ID => Some(DefaultProfile::Female),
        _ => None,
    };
    if let Some(profile) = profile {
        return Ok(ResolvedVoice {
            voice_id: Some(requested.to_string()),
            base_pitch: default_features(profile)[0],
        });
    }

    let summary = store
        .get(requested)
        .ok_or_else(|| EngineError::voice_not_found(requested))?;
    if !summary.consent_granted {
        return Err(EngineError::ConsentWithdrawn {
            voice_id: requested.to_string(),
        });
    }

    let features = store
        .feature_vector(requested)
        .ok_or_else(|| EngineError::voice_not_found(requested))?;
    // Element 0 of an extracted vector is a cepstral mean, not a pitch
    // (see voxkit_dsp::features). Anything unusable as a pitch falls back
    // to the reference so the bias degrades to 1.0 instead of poisoning
    // ratio validation downstream.
    let base_pitch = features
        .first()
        .copied()
        .filter(|p| p.is_finite() && *p > 0.0)
        .unwrap_or(REFERENCE_PITCH_HZ);

    Ok(ResolvedVoice {
        voice_id: Some(requested.to_string()),
        base_pitch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn empty_store(tmp: &TempDir) -> Arc<VoiceStore> {
        Arc::new(VoiceStore::open(tmp.path().join("store")).unwrap())
    }

    #[test]
    fn test_no_voice_uses_female_default() {
        let tmp = TempDir::new().unwrap();
        let store = empty_store(&tmp);
        let resolved = resolve_voice(&store, None).unwrap();
        assert_eq!(resolved.voice_id, None);
        assert_eq!(resolved.base_pitch, 220.0);
        assert!((resolved.pitch_bias() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pretrained_defaults_bypass_store() {
        let tmp = TempDir::new().unwrap();
        let store = empty_store(&tmp);

        let male = resolve_voice(&store, Some(MALE_DEFAULT_ID)).unwrap();
        assert_eq!(male.base_pitch, 120.0);
        assert!(male.pitch_bias() < 1.0);

        let female = resolve_voice(&store, Some(FEMALE_DEFAULT_ID)).unwrap();
        assert_eq!(female.base_pitch, 220.0);
    }

    #[test]
    fn test_unknown_voice_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = empty_store(&tmp);
        let err = resolve_voice(&store, Some("ffffffffffffffff")).unwrap_err();
        assert!(matches!(err, EngineError::VoiceNotFound { .. }));
    }

    #[test]
    fn test_withdrawn_consent_is_rejected() {
        // The registry refuses to create a record with consent_granted set
        // to false, so build one on disk directly and load it.
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("store");
        let voices = root.join("voices");
        std::fs::create_dir_all(&voices).unwrap();

        let id = "aaaaaaaaaaaaaaaa";
        std::fs::write(voices.join(format!("{id}_features.json")), "[180.0]").unwrap();
        std::fs::write(
            root.join("voices_metadata.json"),
            format!(
                r#"{{"{id}": {{"voice_id": "{id}", "display_name": "NoConsent", "consent_granted": false, "created_at": "2026-01-01T00:00:00Z", "project_scope": "default"}}}}"#
            ),
        )
        .unwrap();

        let store = Arc::new(VoiceStore::open(&root).unwrap());
        assert!(store.get(id).is_some());

        let err = resolve_voice(&store, Some(id)).unwrap_err();
        assert!(matches!(err, EngineError::ConsentWithdrawn { .. }));
    }
}
