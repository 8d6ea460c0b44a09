//! The voice identity store.
//!
//! Directory layout under the store root:
//!
//! ```text
//! <root>/
//!   voices/                      per-voice feature-vector artifacts
//!     <id>_features.json
//!   voices_metadata.json         id -> public record map
//!   consent_log.json             append-only audit trail
//! ```
//!
//! Durable writes are the atomicity boundary: an identity becomes visible
//! to `list`/`get` only after its feature vector and metadata have both been
//! written, and revocation removes the in-memory entry only after every
//! durable side effect succeeded. A crash between steps can leave a feature
//! file with no metadata record (harmless, invisible) but never the
//! reverse being served.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;
use serde::Serialize;

use crate::consent::{ConsentAction, ConsentLog, ConsentLogEntry};
use crate::error::{IdentityError, IdentityResult};
use crate::identity::{VoiceIdentity, VoiceSummary};

/// Length of a voice id in hex characters.
pub const VOICE_ID_LEN: usize = 16;

/// Outcome of a project purge. Individual revocation failures do not abort
/// the purge; they are reported here and the purge is safe to retry.
#[derive(Debug, Clone, Serialize)]
pub struct PurgeReport {
    /// The project scope that was purged.
    pub project_scope: String,
    /// Ids successfully revoked.
    pub revoked: Vec<String>,
    /// Ids that failed to revoke, with the error message.
    pub failed: Vec<PurgeFailure>,
}

/// A single failed revocation inside a purge.
#[derive(Debug, Clone, Serialize)]
pub struct PurgeFailure {
    /// The voice that could not be revoked.
    pub voice_id: String,
    /// Why revocation failed.
    pub error: String,
}

impl PurgeReport {
    /// True when every matching voice was revoked.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Registered voices indexed by id, with stable insertion order.
#[derive(Debug, Default)]
struct StoreInner {
    voices: HashMap<String, VoiceIdentity>,
    order: Vec<String>,
}

/// Consent-scoped voice identity store.
///
/// Shared mutable state behind a coarse reader/writer lock: registration
/// and revocation take the write lock, lookups the read lock, so a revoke
/// can never race a lookup into handing out a feature vector that is being
/// deleted.
#[derive(Debug)]
pub struct VoiceStore {
    voices_dir: PathBuf,
    metadata_path: PathBuf,
    consent_log: ConsentLog,
    inner: RwLock<StoreInner>,
}

impl VoiceStore {
    /// Opens a store rooted at `root`, creating the layout if needed and
    /// loading previously registered voices.
    ///
    /// Metadata records whose feature-vector artifact is missing (revoked
    /// tombstones, partial writes) are skipped, as are records flagged
    /// revoked.
    pub fn open(root: impl Into<PathBuf>) -> IdentityResult<Self> {
        let root = root.into();
        let voices_dir = root.join("voices");
        fs::create_dir_all(&voices_dir)
            .map_err(|e| IdentityError::persistence("store layout create", e))?;

        let store = Self {
            metadata_path: root.join("voices_metadata.json"),
            consent_log: ConsentLog::new(root.join("consent_log.json")),
            voices_dir,
            inner: RwLock::new(StoreInner::default()),
        };
        store.load()?;
        Ok(store)
    }

    /// Registers a new voice identity from an audio sample.
    ///
    /// The consent check runs before any I/O. On success the feature
    /// vector is extracted from the sample, the identity is persisted, a
    /// `register` entry is appended to the consent log, and the new id is
    /// returned.
    pub fn register(
        &self,
        audio_path: &Path,
        display_name: &str,
        consent: bool,
        project_scope: &str,
        metadata: BTreeMap<String, String>,
    ) -> IdentityResult<String> {
        if !consent {
            return Err(IdentityError::ConsentDenied);
        }
        if !audio_path.exists() {
            return Err(IdentityError::AudioNotFound);
        }

        // CPU-bound analysis happens outside the lock.
        let buffer = voxkit_dsp::decode_wav_file(audio_path)?;
        let feature_vector = voxkit_dsp::extract(&buffer.samples, buffer.sample_rate)?;

        let created_at = Utc::now().to_rfc3339();
        let voice_id = derive_voice_id(display_name, &created_at);

        let identity = VoiceIdentity {
            voice_id: voice_id.clone(),
            display_name: display_name.to_string(),
            consent_granted: consent,
            feature_vector,
            created_at,
            project_scope: project_scope.to_string(),
            metadata,
            revoked: false,
        };

        let mut inner = self.inner.write().expect("store lock poisoned");

        // Feature vector first, metadata second: a crash in between leaves
        // no record visible in list/get.
        self.write_features(&voice_id, &identity.feature_vector)?;
        let mut records = summaries_for_persist(&inner);
        records.insert(voice_id.clone(), identity.summary());
        self.write_metadata(&records)?;

        let mut details = BTreeMap::new();
        details.insert("name".to_string(), identity.display_name.clone());
        details.insert("project_scope".to_string(), identity.project_scope.clone());
        details.insert("consent".to_string(), consent.to_string());
        details.insert(
            "sample_seconds".to_string(),
            format!("{:.2}", buffer.duration()),
        );
        self.consent_log
            .append(&voice_id, ConsentAction::Register, details)?;

        inner.order.push(voice_id.clone());
        inner.voices.insert(voice_id.clone(), identity);

        Ok(voice_id)
    }

    /// Lists active identities in insertion order, optionally filtered by
    /// project scope. Revoked identities never appear.
    pub fn list(&self, project_scope: Option<&str>) -> Vec<VoiceSummary> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .order
            .iter()
            .filter_map(|id| inner.voices.get(id))
            .filter(|v| !v.revoked)
            .filter(|v| project_scope.map_or(true, |scope| v.project_scope == scope))
            .map(|v| v.summary())
            .collect()
    }

    /// Looks up an active identity. Revoked and unknown ids are
    /// indistinguishable: both return `None`.
    pub fn get(&self, voice_id: &str) -> Option<VoiceSummary> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .voices
            .get(voice_id)
            .filter(|v| !v.revoked)
            .map(|v| v.summary())
    }

    /// Returns a copy of an active identity's feature vector.
    pub fn feature_vector(&self, voice_id: &str) -> Option<Vec<f64>> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .voices
            .get(voice_id)
            .filter(|v| !v.revoked)
            .map(|v| v.feature_vector.clone())
    }

    /// Irrevocably revokes a voice identity.
    ///
    /// Durable side effects, in order: delete the feature-vector artifact,
    /// append a `revoke` consent-log entry, persist the updated metadata
    /// (with the revoked tombstone). The in-memory entry is touched only
    /// after every durable step succeeded: a failure part-way leaves the
    /// identity visible in `list`/`get`, so the revocation stays
    /// retryable and durable and in-memory views cannot silently diverge.
    pub fn revoke(&self, voice_id: &str) -> IdentityResult<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");

        let display_name = inner
            .voices
            .get(voice_id)
            .ok_or_else(|| IdentityError::not_found(voice_id))?
            .display_name
            .clone();

        let features_path = self.features_path(voice_id);
        if features_path.exists() {
            fs::remove_file(&features_path)
                .map_err(|e| IdentityError::persistence("feature vector delete", e))?;
        }

        let mut details = BTreeMap::new();
        details.insert("name".to_string(), display_name);
        self.consent_log
            .append(voice_id, ConsentAction::Revoke, details)?;

        // Tombstone stays in this metadata write; the next write drops it.
        let mut records = summaries_for_persist(&inner);
        if let Some(record) = records.get_mut(voice_id) {
            record.revoked = true;
        }
        self.write_metadata(&records)?;

        inner.voices.remove(voice_id);
        inner.order.retain(|id| id != voice_id);

        Ok(())
    }

    /// Revokes every identity in a project scope.
    ///
    /// Not atomic as a whole: failures are collected per voice and
    /// reported, and retrying is safe since already-revoked voices no
    /// longer match.
    pub fn purge_project(&self, project_scope: &str) -> PurgeReport {
        let targets: Vec<String> = self
            .list(Some(project_scope))
            .into_iter()
            .map(|v| v.voice_id)
            .collect();

        let mut report = PurgeReport {
            project_scope: project_scope.to_string(),
            revoked: Vec::new(),
            failed: Vec::new(),
        };
        for voice_id in targets {
            match self.revoke(&voice_id) {
                Ok(()) => report.revoked.push(voice_id),
                Err(e) => report.failed.push(PurgeFailure {
                    voice_id,
                    error: e.to_string(),
                }),
            }
        }
        report
    }

    /// Reads the full consent log, oldest first.
    pub fn consent_log(&self) -> IdentityResult<Vec<ConsentLogEntry>> {
        self.consent_log.read_all()
    }

    fn features_path(&self, voice_id: &str) -> PathBuf {
        self.voices_dir.join(format!("{voice_id}_features.json"))
    }

    fn write_features(&self, voice_id: &str, features: &[f64]) -> IdentityResult<()> {
        let json = serde_json::to_string(features)
            .map_err(|e| IdentityError::persistence("feature vector encode", e))?;
        fs::write(self.features_path(voice_id), json)
            .map_err(|e| IdentityError::persistence("feature vector write", e))
    }

    fn write_metadata(&self, records: &BTreeMap<String, VoiceSummary>) -> IdentityResult<()> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| IdentityError::persistence("metadata encode", e))?;
        fs::write(&self.metadata_path, json)
            .map_err(|e| IdentityError::persistence("metadata write", e))
    }

    fn load(&self) -> IdentityResult<()> {
        if !self.metadata_path.exists() {
            return Ok(());
        }

        let json = fs::read_to_string(&self.metadata_path)
            .map_err(|e| IdentityError::persistence("metadata read", e))?;
        let records: BTreeMap<String, VoiceSummary> = serde_json::from_str(&json)
            .map_err(|e| IdentityError::persistence("metadata decode", e))?;

        let mut loaded: Vec<VoiceIdentity> = Vec::new();
        for (voice_id, summary) in records {
            if summary.revoked {
                continue;
            }
            let features_path = self.features_path(&voice_id);
            if !features_path.exists() {
                // Tombstone or partial write; skip rather than fail the
                // whole store.
                continue;
            }
            let features_json = fs::read_to_string(&features_path)
                .map_err(|e| IdentityError::persistence("feature vector read", e))?;
            let features: Vec<f64> = serde_json::from_str(&features_json)
                .map_err(|e| IdentityError::persistence("feature vector decode", e))?;
            loaded.push(summary.into_identity(features));
        }

        // Insertion order across restarts: oldest registration first.
        loaded.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.voice_id.cmp(&b.voice_id))
        });

        let mut inner = self.inner.write().expect("store lock poisoned");
        for identity in loaded {
            inner.order.push(identity.voice_id.clone());
            inner.voices.insert(identity.voice_id.clone(), identity);
        }
        Ok(())
    }
}

/// Snapshot of all live records, keyed by id, for the metadata file.
fn summaries_for_persist(inner: &StoreInner) -> BTreeMap<String, VoiceSummary> {
    inner
        .voices
        .values()
        .map(|v| (v.voice_id.clone(), v.summary()))
        .collect()
}

/// Derives a voice id from the display name and registration timestamp:
/// BLAKE3 of the concatenation, truncated to [`VOICE_ID_LEN`] hex chars.
///
/// Collisions for rapid same-name registrations are accepted as negligible
/// and not defended against.
fn derive_voice_id(display_name: &str, created_at: &str) -> String {
    let hash = blake3::hash(format!("{display_name}{created_at}").as_bytes());
    hash.to_hex().to_string()[..VOICE_ID_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// Writes a 0.5 s 220 Hz sine WAV usable as a registration sample.
    fn write_sample(dir: &Path) -> PathBuf {
        let path = dir.join("sample.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..11025 {
            let s = (2.0 * std::f64::consts::PI * 220.0 * i as f64 / 22050.0).sin() * 0.5;
            writer.write_sample((s * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    fn open_store(tmp: &TempDir) -> VoiceStore {
        VoiceStore::open(tmp.path().join("store")).unwrap()
    }

    #[test]
    fn test_register_returns_16_hex_id() {
        let tmp = TempDir::new().unwrap();
        let sample = write_sample(tmp.path());
        let store = open_store(&tmp);

        let id = store
            .register(&sample, "Narrator", true, "default", BTreeMap::new())
            .unwrap();
        assert_eq!(id.len(), VOICE_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_register_without_consent_fails_before_io() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);

        // The path does not exist; consent is checked first.
        let err = store
            .register(
                Path::new("/nonexistent.wav"),
                "X",
                false,
                "default",
                BTreeMap::new(),
            )
            .unwrap_err();
        assert!(matches!(err, IdentityError::ConsentDenied));
        assert!(store.consent_log().unwrap().is_empty());
    }

    #[test]
    fn test_register_missing_audio() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);
        let err = store
            .register(
                Path::new("/nonexistent.wav"),
                "X",
                true,
                "default",
                BTreeMap::new(),
            )
            .unwrap_err();
        assert!(matches!(err, IdentityError::AudioNotFound));
    }

    #[test]
    fn test_register_silent_audio_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("silence.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..11025 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let store = open_store(&tmp);
        let err = store
            .register(&path, "Silent", true, "default", BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, IdentityError::Audio(_)));
    }

    #[test]
    fn test_get_and_list() {
        let tmp = TempDir::new().unwrap();
        let sample = write_sample(tmp.path());
        let store = open_store(&tmp);

        let id_a = store
            .register(&sample, "A", true, "proj1", BTreeMap::new())
            .unwrap();
        let id_b = store
            .register(&sample, "B", true, "proj2", BTreeMap::new())
            .unwrap();

        let got = store.get(&id_a).unwrap();
        assert_eq!(got.display_name, "A");
        assert!(got.consent_granted);

        let all = store.list(None);
        assert_eq!(all.len(), 2);
        // Insertion order.
        assert_eq!(all[0].voice_id, id_a);
        assert_eq!(all[1].voice_id, id_b);

        let proj1 = store.list(Some("proj1"));
        assert_eq!(proj1.len(), 1);
        assert_eq!(proj1[0].voice_id, id_a);

        assert!(store.get("0000000000000000").is_none());
    }

    #[test]
    fn test_revoke_removes_voice_and_features() {
        let tmp = TempDir::new().unwrap();
        let sample = write_sample(tmp.path());
        let store = open_store(&tmp);

        let id = store
            .register(&sample, "A", true, "default", BTreeMap::new())
            .unwrap();
        let features_path = store.features_path(&id);
        assert!(features_path.exists());

        store.revoke(&id).unwrap();

        assert!(store.get(&id).is_none());
        assert!(store.feature_vector(&id).is_none());
        assert!(store.list(None).is_empty());
        assert!(!features_path.exists());

        let log = store.consent_log().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].action, ConsentAction::Revoke);
        assert_eq!(log[1].voice_id, id);
    }

    #[test]
    fn test_revocation_is_terminal() {
        let tmp = TempDir::new().unwrap();
        let sample = write_sample(tmp.path());
        let store = open_store(&tmp);

        let id = store
            .register(&sample, "A", true, "default", BTreeMap::new())
            .unwrap();
        store.revoke(&id).unwrap();

        // Once removed from the index, a second revoke is NotFound.
        let err = store.revoke(&id).unwrap_err();
        assert!(matches!(err, IdentityError::NotFound { .. }));

        // Reopening does not resurrect it.
        drop(store);
        let reopened = VoiceStore::open(tmp.path().join("store")).unwrap();
        assert!(reopened.get(&id).is_none());
        assert_eq!(reopened.consent_log().unwrap().len(), 2);
    }

    #[test]
    fn test_reopen_preserves_identities() {
        let tmp = TempDir::new().unwrap();
        let sample = write_sample(tmp.path());

        let id = {
            let store = open_store(&tmp);
            store
                .register(&sample, "Keep", true, "default", BTreeMap::new())
                .unwrap()
        };

        let store = open_store(&tmp);
        let got = store.get(&id).unwrap();
        assert_eq!(got.display_name, "Keep");
        let features = store.feature_vector(&id).unwrap();
        assert_eq!(features.len(), voxkit_dsp::FEATURE_DIM);
    }

    #[test]
    fn test_load_skips_records_without_features() {
        let tmp = TempDir::new().unwrap();
        let sample = write_sample(tmp.path());
        let id = {
            let store = open_store(&tmp);
            store
                .register(&sample, "Orphan", true, "default", BTreeMap::new())
                .unwrap()
        };

        // Simulate a partial write: metadata present, artifact gone.
        fs::remove_file(tmp.path().join("store/voices").join(format!("{id}_features.json")))
            .unwrap();

        let store = open_store(&tmp);
        assert!(store.get(&id).is_none());
        assert!(store.list(None).is_empty());
    }

    #[test]
    fn test_purge_project() {
        let tmp = TempDir::new().unwrap();
        let sample = write_sample(tmp.path());
        let store = open_store(&tmp);

        let id1 = store
            .register(&sample, "A", true, "game", BTreeMap::new())
            .unwrap();
        let id2 = store
            .register(&sample, "B", true, "game", BTreeMap::new())
            .unwrap();
        let keep = store
            .register(&sample, "C", true, "other", BTreeMap::new())
            .unwrap();

        let report = store.purge_project("game");
        assert!(report.is_complete());
        assert_eq!(report.revoked, vec![id1.clone(), id2.clone()]);

        assert!(store.get(&id1).is_none());
        assert!(store.get(&id2).is_none());
        assert!(store.get(&keep).is_some());

        // Retry is a no-op.
        let retry = store.purge_project("game");
        assert!(retry.revoked.is_empty());
        assert!(retry.is_complete());
    }

    #[test]
    fn test_purge_reports_failure_and_retry_completes() {
        let tmp = TempDir::new().unwrap();
        let sample = write_sample(tmp.path());
        let store = open_store(&tmp);

        let id = store
            .register(&sample, "A", true, "game", BTreeMap::new())
            .unwrap();

        // Make the consent-log append fail by occupying its path with a
        // directory.
        let log_path = tmp.path().join("store/consent_log.json");
        fs::remove_file(&log_path).unwrap();
        fs::create_dir(&log_path).unwrap();

        let report = store.purge_project("game");
        assert!(!report.is_complete());
        assert!(report.revoked.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].voice_id, id);

        // The failed revocation left the identity visible for retry.
        assert!(store.get(&id).is_some());
        assert_eq!(store.list(Some("game")).len(), 1);

        // Repair the log and retry: the purge must re-attempt the revoke.
        fs::remove_dir(&log_path).unwrap();
        let retry = store.purge_project("game");
        assert!(retry.is_complete());
        assert_eq!(retry.revoked, vec![id.clone()]);
        assert!(store.get(&id).is_none());

        let log = store.consent_log().unwrap();
        assert!(log
            .iter()
            .any(|e| e.voice_id == id && e.action == ConsentAction::Revoke));

        // The tombstone made it to durable metadata.
        drop(store);
        let reopened = VoiceStore::open(tmp.path().join("store")).unwrap();
        assert!(reopened.get(&id).is_none());
    }

    #[test]
    fn test_failed_revoke_keeps_identity_visible() {
        let tmp = TempDir::new().unwrap();
        let sample = write_sample(tmp.path());
        let store = open_store(&tmp);

        let id = store
            .register(&sample, "A", true, "default", BTreeMap::new())
            .unwrap();

        let log_path = tmp.path().join("store/consent_log.json");
        fs::remove_file(&log_path).unwrap();
        fs::create_dir(&log_path).unwrap();

        let err = store.revoke(&id).unwrap_err();
        assert!(matches!(err, IdentityError::Persistence { .. }));
        assert!(store.get(&id).is_some());

        fs::remove_dir(&log_path).unwrap();
        store.revoke(&id).unwrap();
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_metadata_records_project_and_consent() {
        let tmp = TempDir::new().unwrap();
        let sample = write_sample(tmp.path());
        let store = open_store(&tmp);

        let mut meta = BTreeMap::new();
        meta.insert("source".to_string(), "studio".to_string());
        let id = store
            .register(&sample, "A", true, "game", meta)
            .unwrap();

        let log = store.consent_log().unwrap();
        assert_eq!(log[0].voice_id, id);
        assert_eq!(log[0].details.get("project_scope").unwrap(), "game");
        assert_eq!(log[0].details.get("consent").unwrap(), "true");
        assert_eq!(log[0].details.get("sample_seconds").unwrap(), "0.50");

        let summary = store.get(&id).unwrap();
        assert_eq!(summary.metadata.get("source").unwrap(), "studio");
    }

    #[test]
    fn test_derive_voice_id_shape() {
        let id = derive_voice_id("Narrator", "2026-01-01T00:00:00Z");
        assert_eq!(id.len(), VOICE_ID_LEN);
        // Deterministic for identical inputs.
        assert_eq!(id, derive_voice_id("Narrator", "2026-01-01T00:00:00Z"));
        // Timestamp participates.
        assert_ne!(id, derive_voice_id("Narrator", "2026-01-01T00:00:01Z"));
    }
}
