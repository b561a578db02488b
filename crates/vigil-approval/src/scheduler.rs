//! Per-action timeout timers.

use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use vigil_core::ActionId;

/// Receives timer expiries.
///
/// The scheduler holds only a weak reference, so a dropped handler silently
/// cancels its outstanding timers.
pub(crate) trait ExpiryHandler: Send + Sync {
    /// `id`'s timer fired. The action may already have been resolved.
    fn on_expired(&self, id: &ActionId);
}

/// One tokio task per armed action, aborted on disarm or drop.
#[derive(Debug, Default)]
pub(crate) struct TimeoutScheduler {
    timers: Arc<DashMap<ActionId, AbortHandle>>,
}

impl TimeoutScheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fire `handler.on_expired(id)` after `after`, unless disarmed first.
    pub(crate) fn arm(
        &self,
        runtime: &Handle,
        id: ActionId,
        after: Duration,
        handler: Weak<dyn ExpiryHandler>,
    ) {
        let timers = Arc::clone(&self.timers);
        let task_id = id.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep(after).await;
            timers.remove(&task_id);
            match handler.upgrade() {
                Some(handler) => handler.on_expired(&task_id),
                None => tracing::trace!(action_id = %task_id, "timer fired after engine shutdown"),
            }
        });

        if let Some(previous) = self.timers.insert(id.clone(), task.abort_handle()) {
            previous.abort();
        }
        // The task may have finished before its handle was recorded.
        if task.is_finished() {
            self.timers.remove_if(&id, |_, handle| handle.is_finished());
        }
    }

    /// Cancel `id`'s timer. Returns whether one was armed.
    pub(crate) fn disarm(&self, id: &ActionId) -> bool {
        match self.timers.remove(id) {
            Some((_, handle)) => {
                handle.abort();
                true
            },
            None => false,
        }
    }

    pub(crate) fn armed_count(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for TimeoutScheduler {
    fn drop(&mut self) {
        for entry in self.timers.iter() {
            entry.value().abort();
        }
        self.timers.clear();
    }
}
