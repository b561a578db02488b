//! The pending-action registry.
//!
//! Slots live in a sharded [`DashMap`] keyed by action id, so operations on
//! distinct ids never share a lock. Removal of a slot is the single
//! linearization point of resolution: whichever caller removes it owns the
//! outcome, and every other caller sees [`ResolutionError::AlreadyResolved`].
//!
//! A second index maps each parameter [`Fingerprint`] to the id currently
//! queued under it; inserting a candidate with a known fingerprint supersedes
//! the queued one and inherits its FIFO position.
//!
//! Lock order is fingerprint shard, then slot shard. No code path holds a slot
//! shard while acquiring a fingerprint shard.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use tokio::sync::oneshot;
use tokio::time::Instant;
use vigil_core::{ActionId, Category, Fingerprint};

use crate::action::PendingAction;
use crate::decision::Outcome;
use crate::error::{ResolutionError, ResolutionResult};

/// One queued action and the channel its waiter listens on.
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) action: PendingAction,
    pub(crate) fingerprint: Fingerprint,
    seq: u64,
    pub(crate) enqueued_at: Instant,
    /// Timeout armed at enqueue; `None` when the action never expires.
    pub(crate) armed_timeout: Option<Duration>,
    pub(crate) waiter: Option<oneshot::Sender<Outcome>>,
}

impl Slot {
    pub(crate) fn new(
        action: PendingAction,
        fingerprint: Fingerprint,
        waiter: oneshot::Sender<Outcome>,
    ) -> Self {
        Self {
            action,
            fingerprint,
            seq: 0,
            enqueued_at: Instant::now(),
            armed_timeout: None,
            waiter: Some(waiter),
        }
    }

    #[must_use]
    pub(crate) fn with_timeout(mut self, after: Option<Duration>) -> Self {
        self.armed_timeout = after;
        self
    }

    /// Deliver `outcome` to the waiter, if it is still listening.
    pub(crate) fn notify(&mut self, outcome: Outcome) {
        if let Some(waiter) = self.waiter.take()
            && waiter.send(outcome).is_err()
        {
            tracing::debug!(action_id = %self.action.id, "waiter dropped before outcome");
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct PendingActionRegistry {
    slots: DashMap<ActionId, Slot>,
    by_fingerprint: DashMap<Fingerprint, ActionId>,
    /// Ids removed since the session started. Grows by one per resolved or
    /// superseded action and is emptied only by [`Self::clear_tombstones`].
    tombstones: DashSet<ActionId>,
    next_seq: AtomicU64,
}

impl PendingActionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Remove the slot for `id`, recording its tombstone under the shard lock.
    fn remove_slot(&self, id: &ActionId) -> Option<Slot> {
        self.slots
            .remove_if(id, |key, _| {
                self.tombstones.insert(key.clone());
                true
            })
            .map(|(_, slot)| slot)
    }

    /// Queue `slot`. Returns the slot it superseded, if any.
    pub(crate) fn insert(&self, mut slot: Slot) -> Option<Slot> {
        let id = slot.action.id.clone();
        match self.by_fingerprint.entry(slot.fingerprint) {
            Entry::Occupied(mut entry) => {
                let superseded = self.remove_slot(entry.get());
                slot.seq = superseded
                    .as_ref()
                    .map_or_else(|| self.next_seq(), |old| old.seq);
                self.slots.insert(id.clone(), slot);
                entry.insert(id);
                superseded
            },
            Entry::Vacant(entry) => {
                slot.seq = self.next_seq();
                self.slots.insert(id.clone(), slot);
                entry.insert(id);
                None
            },
        }
    }

    /// Remove `id` exactly once.
    ///
    /// # Errors
    ///
    /// [`ResolutionError::AlreadyResolved`] if it was removed before,
    /// [`ResolutionError::NotFound`] if it was never queued this session.
    pub(crate) fn take(&self, id: &ActionId) -> ResolutionResult<Slot> {
        let Some(slot) = self.remove_slot(id) else {
            return Err(self.missing(id));
        };
        self.by_fingerprint
            .remove_if(&slot.fingerprint, |_, queued| queued == id);
        Ok(slot)
    }

    /// Copy of the pending action for `id`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::take`].
    pub(crate) fn get(&self, id: &ActionId) -> ResolutionResult<PendingAction> {
        self.slots
            .get(id)
            .map(|slot| slot.action.clone())
            .ok_or_else(|| self.missing(id))
    }

    fn missing(&self, id: &ActionId) -> ResolutionError {
        if self.is_resolved(id) {
            ResolutionError::AlreadyResolved { id: id.clone() }
        } else {
            ResolutionError::NotFound { id: id.clone() }
        }
    }

    pub(crate) fn contains(&self, id: &ActionId) -> bool {
        self.slots.contains_key(id)
    }

    /// Pending actions in FIFO order.
    pub(crate) fn list(&self) -> Vec<PendingAction> {
        let mut entries: Vec<(u64, PendingAction)> = self
            .slots
            .iter()
            .map(|slot| (slot.seq, slot.action.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, action)| action).collect()
    }

    /// Ids of pending actions in `category`, in FIFO order.
    pub(crate) fn ids_in_category(&self, category: &Category) -> Vec<ActionId> {
        let mut entries: Vec<(u64, ActionId)> = self
            .slots
            .iter()
            .filter(|slot| slot.action.category == *category)
            .map(|slot| (slot.seq, slot.key().clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, id)| id).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_resolved(&self, id: &ActionId) -> bool {
        self.tombstones.contains(id)
    }

    /// Forget resolved ids. Later lookups of them report `NotFound`.
    /// Returns how many were dropped.
    pub(crate) fn clear_tombstones(&self) -> usize {
        let count = self.tombstones.len();
        self.tombstones.clear();
        count
    }
}
