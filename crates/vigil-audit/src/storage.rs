//! Audit log storage trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use vigil_core::{ActionId, SessionId};

use crate::entry::{AuditEntry, AuditEntryId};
use crate::error::AuditResult;

/// Storage backend for audit logs.
///
/// Implementations must be thread-safe and append-only: entries are never
/// updated or removed once stored.
pub trait AuditStorage: Send + Sync {
    /// Store an audit entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted.
    fn store(&self, entry: &AuditEntry) -> AuditResult<()>;

    /// Get an entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval fails.
    fn get(&self, id: &AuditEntryId) -> AuditResult<Option<AuditEntry>>;

    /// The most recently stored entry (the chain head).
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval fails.
    fn head(&self) -> AuditResult<Option<AuditEntry>>;

    /// All entries in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval fails.
    fn entries(&self) -> AuditResult<Vec<AuditEntry>>;

    /// Entries recorded for one action, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval fails.
    fn entries_for_action(&self, action_id: &ActionId) -> AuditResult<Vec<AuditEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| &e.record.action_id == action_id)
            .collect())
    }

    /// Entries recorded in one session, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval fails.
    fn entries_for_session(&self, session_id: &SessionId) -> AuditResult<Vec<AuditEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| &e.record.session_id == session_id)
            .collect())
    }

    /// Count total entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    fn count(&self) -> AuditResult<usize>;
}

#[derive(Default)]
struct Inner {
    entries: Vec<AuditEntry>,
    by_id: HashMap<AuditEntryId, usize>,
}

/// In-memory audit storage.
///
/// Entries live for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryAuditStorage {
    inner: RwLock<Inner>,
}

impl InMemoryAuditStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| {
            tracing::warn!("InMemoryAuditStorage read lock poisoned, recovering");
            e.into_inner()
        })
    }
}

impl AuditStorage for InMemoryAuditStorage {
    fn store(&self, entry: &AuditEntry) -> AuditResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(|e| {
            tracing::warn!("InMemoryAuditStorage lock poisoned, recovering");
            e.into_inner()
        });
        let index = inner.entries.len();
        inner.by_id.insert(entry.id.clone(), index);
        inner.entries.push(entry.clone());
        Ok(())
    }

    fn get(&self, id: &AuditEntryId) -> AuditResult<Option<AuditEntry>> {
        let inner = self.read();
        Ok(inner
            .by_id
            .get(id)
            .and_then(|&i| inner.entries.get(i))
            .cloned())
    }

    fn head(&self) -> AuditResult<Option<AuditEntry>> {
        Ok(self.read().entries.last().cloned())
    }

    fn entries(&self) -> AuditResult<Vec<AuditEntry>> {
        Ok(self.read().entries.clone())
    }

    fn count(&self) -> AuditResult<usize> {
        Ok(self.read().entries.len())
    }
}

impl std::fmt::Debug for InMemoryAuditStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAuditStorage")
            .field("entries", &self.read().entries.len())
            .finish()
    }
}
