//! voxkit Identity Registry
//!
//! Consent-scoped storage for synthetic voice identities. The store
//! guarantees:
//!
//! - registration requires explicit consent, checked before any I/O
//! - revocation is irreversible: the feature vector is deleted from disk
//!   and the identity disappears from every lookup
//! - the consent log is append-only and survives revocation, proving that
//!   consent was once granted and later withdrawn
//! - callers only ever see copies or read-only views of stored state
//!
//! Persistence is JSON on the local filesystem; see [`store`] for the
//! layout and write-ordering rules.

pub mod consent;
pub mod error;
pub mod identity;
pub mod store;

pub use consent::{ConsentAction, ConsentLog, ConsentLogEntry};
pub use error::{IdentityError, IdentityResult};
pub use identity::{VoiceIdentity, VoiceSummary};
pub use store::{PurgeFailure, PurgeReport, VoiceStore, VOICE_ID_LEN};
