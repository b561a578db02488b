//! Audit log - main interface for audit logging.
//!
//! Provides a high-level API for recording and verifying audit entries.

use std::sync::Mutex;

use tracing::{debug, error, warn};
use vigil_core::ActionId;

use crate::entry::{AuditEntry, AuditEntryId, AuditRecord};
use crate::error::AuditResult;
use crate::hash::ContentHash;
use crate::keys::RuntimeKey;
use crate::storage::{AuditStorage, InMemoryAuditStorage};

/// Cached chain position: the next sequence number and the head hash.
#[derive(Clone, Copy)]
struct ChainHead {
    next_sequence: u64,
    hash: ContentHash,
}

/// Append-only, chain-linked, signed audit log.
pub struct AuditLog {
    storage: Box<dyn AuditStorage>,
    runtime_key: RuntimeKey,
    /// Held for the whole of `append` so entries link in storage order.
    head: Mutex<Option<ChainHead>>,
}

impl AuditLog {
    /// Create a new audit log with a custom storage backend.
    #[must_use]
    pub fn with_storage(storage: Box<dyn AuditStorage>, runtime_key: RuntimeKey) -> Self {
        Self {
            storage,
            runtime_key,
            head: Mutex::new(None),
        }
    }

    /// Create an in-memory audit log.
    #[must_use]
    pub fn in_memory(runtime_key: RuntimeKey) -> Self {
        Self::with_storage(Box::new(InMemoryAuditStorage::new()), runtime_key)
    }

    /// Append a new audit entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be stored.
    pub fn append(&self, record: AuditRecord) -> AuditResult<AuditEntryId> {
        let mut head = self.head.lock().unwrap_or_else(|e| {
            warn!("AuditLog head lock poisoned, recovering");
            e.into_inner()
        });

        let current = match *head {
            Some(h) => h,
            None => self.load_head()?,
        };

        let entry = AuditEntry::create(
            record,
            current.next_sequence,
            current.hash,
            &self.runtime_key,
        );

        debug!(
            entry_id = %entry.id,
            action_id = %entry.record.action_id,
            decision = %entry.record.decision,
            sequence = entry.sequence,
            "Appending audit entry"
        );

        self.storage.store(&entry)?;

        *head = Some(ChainHead {
            next_sequence: current.next_sequence.saturating_add(1),
            hash: entry.content_hash(),
        });

        Ok(entry.id)
    }

    /// Read the chain head from storage (first append after construction).
    fn load_head(&self) -> AuditResult<ChainHead> {
        Ok(match self.storage.head()? {
            Some(entry) => ChainHead {
                next_sequence: entry.sequence.saturating_add(1),
                hash: entry.content_hash(),
            },
            None => ChainHead {
                next_sequence: 0,
                hash: ContentHash::zero(),
            },
        })
    }

    /// Get an entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to retrieve the entry.
    pub fn get(&self, id: &AuditEntryId) -> AuditResult<Option<AuditEntry>> {
        self.storage.get(id)
    }

    /// All entries in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to retrieve entries.
    pub fn entries(&self) -> AuditResult<Vec<AuditEntry>> {
        self.storage.entries()
    }

    /// Entries recorded for one action.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to retrieve entries.
    pub fn entries_for_action(&self, action_id: &ActionId) -> AuditResult<Vec<AuditEntry>> {
        self.storage.entries_for_action(action_id)
    }

    /// Count total entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn count(&self) -> AuditResult<usize> {
        self.storage.count()
    }

    /// Hex ID of the key entries are signed with.
    #[must_use]
    pub fn key_id(&self) -> String {
        self.runtime_key.key_id_hex()
    }

    /// Verify the integrity of the whole chain.
    ///
    /// # Errors
    ///
    /// Returns an error if entries cannot be retrieved from storage.
    pub fn verify_chain(&self) -> AuditResult<ChainVerificationResult> {
        let mut entries = self.storage.entries()?;
        entries.sort_by_key(|e| e.sequence);

        let mut issues = Vec::new();

        if let Some(first) = entries.first()
            && !first.previous_hash.is_zero()
        {
            issues.push(ChainIssue::InvalidGenesis {
                entry_id: first.id.clone(),
            });
        }

        let mut expected_sequence: u64 = 0;
        for entry in &entries {
            if let Err(e) = entry.verify_signature() {
                error!(entry_id = %entry.id, error = %e, "Invalid signature");
                issues.push(ChainIssue::InvalidSignature {
                    entry_id: entry.id.clone(),
                });
            }
            if entry.sequence != expected_sequence {
                issues.push(ChainIssue::SequenceGap {
                    entry_id: entry.id.clone(),
                    expected: expected_sequence,
                    actual: entry.sequence,
                });
            }
            expected_sequence = entry.sequence.saturating_add(1);
        }

        for pair in entries.windows(2) {
            let [prev, curr] = pair else { continue };
            if !curr.follows(prev) {
                warn!(current = %curr.id, previous = %prev.id, "Chain link broken");
                issues.push(ChainIssue::BrokenLink {
                    entry_id: curr.id.clone(),
                    expected_previous: prev.content_hash(),
                    actual_previous: curr.previous_hash,
                });
            }
        }

        Ok(ChainVerificationResult {
            valid: issues.is_empty(),
            entries_verified: entries.len(),
            issues,
        })
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("key_id", &self.key_id())
            .finish_non_exhaustive()
    }
}

/// Result of chain verification.
#[derive(Debug, Clone)]
pub struct ChainVerificationResult {
    /// Whether the chain is valid.
    pub valid: bool,
    /// Number of entries verified.
    pub entries_verified: usize,
    /// Issues found during verification.
    pub issues: Vec<ChainIssue>,
}

/// Issues that can be found in an audit chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainIssue {
    /// The first entry does not point at the zero hash.
    InvalidGenesis {
        /// Entry ID.
        entry_id: AuditEntryId,
    },
    /// Entry signature does not verify.
    InvalidSignature {
        /// Entry ID.
        entry_id: AuditEntryId,
    },
    /// Entry does not hash-link to its predecessor.
    BrokenLink {
        /// Entry ID.
        entry_id: AuditEntryId,
        /// Hash of the predecessor as stored.
        expected_previous: ContentHash,
        /// Hash the entry claims.
        actual_previous: ContentHash,
    },
    /// Sequence numbers skip or repeat (an entry was removed or duplicated).
    SequenceGap {
        /// Entry ID.
        entry_id: AuditEntryId,
        /// Sequence expected at this position.
        expected: u64,
        /// Sequence found.
        actual: u64,
    },
}
