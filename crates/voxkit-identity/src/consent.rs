//! Append-only consent audit log.
//!
//! Every registration and revocation appends an entry. Entries are never
//! mutated or deleted, even for revoked voices: the log is the evidence
//! that consent was once granted and later withdrawn.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, IdentityResult};

/// Audited consent actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentAction {
    /// A voice was registered with explicit consent.
    Register,
    /// A voice was revoked and its feature data deleted.
    Revoke,
}

/// One entry in the consent log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentLogEntry {
    /// When the action happened, RFC 3339.
    pub timestamp: String,
    /// The voice the action applies to.
    pub voice_id: String,
    /// What happened.
    pub action: ConsentAction,
    /// Action-specific context (display name, project scope, ...).
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

/// File-backed append-only consent log (JSON array, oldest first).
#[derive(Debug)]
pub struct ConsentLog {
    path: PathBuf,
}

impl ConsentLog {
    /// Opens (or prepares to create) the log at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Appends an entry with the current timestamp.
    pub fn append(
        &self,
        voice_id: &str,
        action: ConsentAction,
        details: BTreeMap<String, String>,
    ) -> IdentityResult<()> {
        let mut entries = self.read_all()?;
        entries.push(ConsentLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            voice_id: voice_id.to_string(),
            action,
            details,
        });

        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| IdentityError::persistence("consent log encode", e))?;
        fs::write(&self.path, json)
            .map_err(|e| IdentityError::persistence("consent log write", e))?;
        Ok(())
    }

    /// Reads the full log, oldest first. A missing file is an empty log.
    pub fn read_all(&self) -> IdentityResult<Vec<ConsentLogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path)
            .map_err(|e| IdentityError::persistence("consent log read", e))?;
        serde_json::from_str(&json)
            .map_err(|e| IdentityError::persistence("consent log decode", e))
    }
}
