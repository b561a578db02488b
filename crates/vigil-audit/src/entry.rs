//! Audit entry types.
//!
//! One entry is written per resolved (or auto-executed) action. Entries are
//! chain-linked (each contains the hash of the previous) and signed by the
//! runtime.

use std::fmt;

use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vigil_core::{ActionId, Category, Sensitivity, SessionId, Timestamp};

use crate::error::{AuditError, AuditResult};
use crate::hash::ContentHash;
use crate::keys::{self, RuntimeKey};

/// Unique identifier for an audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEntryId(pub Uuid);

impl AuditEntryId {
    /// Create a new random entry ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AuditEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "audit:{}", self.0)
    }
}

/// The decision an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditDecision {
    /// Approved with original parameters.
    Approve,
    /// Rejected by the user.
    Reject,
    /// Approved with edited parameters.
    Edit,
    /// Answered with a free-text response instead of executing.
    Response,
    /// Dismissed without a decision.
    Ignore,
    /// No decision before the deadline.
    Timeout,
    /// Replaced by an identical retry.
    Superseded,
    /// Executed without queuing (policy or session preference).
    AutoExecute,
}

impl AuditDecision {
    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Edit => "edit",
            Self::Response => "response",
            Self::Ignore => "ignore",
            Self::Timeout => "timeout",
            Self::Superseded => "superseded",
            Self::AutoExecute => "auto_execute",
        }
    }

    /// Whether the decision lets the tool call run.
    #[must_use]
    pub fn permits_execution(self) -> bool {
        matches!(self, Self::Approve | Self::Edit | Self::AutoExecute)
    }
}

impl fmt::Display for AuditDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller-supplied contents of an entry, before chaining and signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Session the decision was made in.
    pub session_id: SessionId,
    /// The action that was decided.
    pub action_id: ActionId,
    /// Tool the action would invoke.
    pub tool_name: String,
    /// Category of the tool.
    pub category: Category,
    /// Risk tier of the action.
    pub sensitivity: Sensitivity,
    /// What was decided.
    pub decision: AuditDecision,
    /// Why (rule name, abort reason), when there is one.
    pub reason: Option<String>,
    /// Time from enqueue to decision (0 for auto-executions).
    pub latency_ms: u64,
}

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier.
    pub id: AuditEntryId,
    /// Position in the log, starting at 0.
    pub sequence: u64,
    /// When this entry was created.
    pub timestamp: Timestamp,
    /// The recorded decision.
    #[serde(flatten)]
    pub record: AuditRecord,
    /// Hash of the previous entry (zero for the first).
    pub previous_hash: ContentHash,
    /// Runtime public key that signed this entry.
    pub runtime_key: VerifyingKey,
    /// Signature over [`AuditEntry::signing_data`].
    pub signature: Signature,
}

impl AuditEntry {
    /// Create and sign a new entry.
    #[must_use]
    pub fn create(
        record: AuditRecord,
        sequence: u64,
        previous_hash: ContentHash,
        runtime_key: &RuntimeKey,
    ) -> Self {
        let mut entry = Self {
            id: AuditEntryId::new(),
            sequence,
            timestamp: Timestamp::now(),
            record,
            previous_hash,
            runtime_key: runtime_key.verifying_key(),
            signature: Signature::from_bytes(&[0u8; 64]),
        };
        entry.signature = runtime_key.sign(&entry.signing_data());
        entry
    }

    /// Get the data used for signing and hashing.
    ///
    /// String fields are NUL-terminated so adjacent fields cannot run into
    /// each other.
    #[must_use]
    pub fn signing_data(&self) -> Vec<u8> {
        let r = &self.record;
        let mut data = Vec::with_capacity(256);
        data.extend_from_slice(self.id.0.as_bytes());
        data.extend_from_slice(&self.sequence.to_le_bytes());
        data.extend_from_slice(&self.timestamp.0.timestamp_micros().to_le_bytes());
        data.extend_from_slice(r.session_id.0.as_bytes());
        data.extend_from_slice(r.action_id.0.as_bytes());
        for field in [
            r.tool_name.as_str(),
            r.category.name(),
            r.sensitivity.as_str(),
            r.decision.as_str(),
            r.reason.as_deref().unwrap_or_default(),
        ] {
            data.extend_from_slice(field.as_bytes());
            data.push(0);
        }
        data.push(u8::from(r.reason.is_some()));
        data.extend_from_slice(&r.latency_ms.to_le_bytes());
        data.extend_from_slice(self.previous_hash.as_bytes());
        data.extend_from_slice(self.runtime_key.as_bytes());
        data
    }

    /// Compute the content hash of this entry.
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::hash(&self.signing_data())
    }

    /// Verify the entry's signature.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidSignature`] if the signature does not match
    /// the entry contents.
    pub fn verify_signature(&self) -> AuditResult<()> {
        if keys::verify(&self.runtime_key, &self.signing_data(), &self.signature) {
            Ok(())
        } else {
            Err(AuditError::InvalidSignature {
                entry_id: self.id.to_string(),
                sequence: self.sequence,
            })
        }
    }

    /// Check if this entry follows another (chain linking).
    #[must_use]
    pub fn follows(&self, previous: &AuditEntry) -> bool {
        self.previous_hash == previous.content_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(decision: AuditDecision) -> AuditRecord {
        AuditRecord {
            session_id: SessionId::new(),
            action_id: ActionId::new(),
            tool_name: "transfer_funds".to_owned(),
            category: Category::Finance,
            sensitivity: Sensitivity::Critical,
            decision,
            reason: None,
            latency_ms: 42,
        }
    }

    #[test]
    fn test_create_and_verify() {
        let key = RuntimeKey::generate();
        let entry = AuditEntry::create(record(AuditDecision::Approve), 0, ContentHash::zero(), &key);
        assert!(entry.verify_signature().is_ok());
        assert_eq!(entry.runtime_key, key.verifying_key());
    }

    #[test]
    fn test_tampering_breaks_signature() {
        let key = RuntimeKey::generate();
        let mut entry =
            AuditEntry::create(record(AuditDecision::Reject), 0, ContentHash::zero(), &key);
        entry.record.decision = AuditDecision::Approve;
        assert!(matches!(
            entry.verify_signature(),
            Err(AuditError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_reason_none_differs_from_empty() {
        let key = RuntimeKey::generate();
        let mut entry =
            AuditEntry::create(record(AuditDecision::Timeout), 0, ContentHash::zero(), &key);
        let before = entry.content_hash();
        entry.record.reason = Some(String::new());
        assert_ne!(entry.content_hash(), before);
    }

    #[test]
    fn test_follows() {
        let key = RuntimeKey::generate();
        let first = AuditEntry::create(record(AuditDecision::Approve), 0, ContentHash::zero(), &key);
        let second =
            AuditEntry::create(record(AuditDecision::Edit), 1, first.content_hash(), &key);
        assert!(second.follows(&first));
        assert!(!first.follows(&second));
    }

    #[test]
    fn test_serde_keeps_signature_valid() {
        let key = RuntimeKey::generate();
        let entry =
            AuditEntry::create(record(AuditDecision::AutoExecute), 3, ContentHash::zero(), &key);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"decision\":\"auto_execute\""));
        assert!(json.contains("\"category\":\"finance\""));
        let back: AuditEntry = serde_json::from_str(&json).unwrap();
        assert!(back.verify_signature().is_ok());
        assert_eq!(back.content_hash(), entry.content_hash());
    }

    #[test]
    fn test_permits_execution() {
        assert!(AuditDecision::Edit.permits_execution());
        assert!(!AuditDecision::Timeout.permits_execution());
        assert!(!AuditDecision::Superseded.permits_execution());
    }
}
