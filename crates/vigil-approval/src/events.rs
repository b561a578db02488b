//! Push notifications for engine state changes.
//!
//! Every queue, resolution, supersession, auto-execution, settings update and
//! session end is published on a broadcast channel. Receivers that fall behind
//! lose the oldest events and log a warning; they can always re-sync with
//! `list_pending`.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};
use vigil_audit::AuditDecision;
use vigil_core::{ActionId, Category, SessionId};

use crate::action::PendingAction;
use crate::decision::Outcome;
use crate::policy::PolicyRule;
use crate::settings::Settings;

/// Default channel capacity for the event bus.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A change in engine state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A candidate was queued for confirmation.
    ActionQueued {
        /// The new pending action.
        action: PendingAction,
    },
    /// A pending action was resolved by a human or by its timer.
    ActionResolved {
        /// The action.
        id: ActionId,
        /// The audited decision.
        decision: AuditDecision,
        /// What the waiter received.
        outcome: Outcome,
    },
    /// A pending action was replaced by an identical retry.
    ActionSuperseded {
        /// The removed action.
        id: ActionId,
        /// The action that took its place.
        replaced_by: ActionId,
    },
    /// A candidate ran without confirmation.
    AutoExecuted {
        /// Tool name.
        tool_name: String,
        /// Tool category.
        category: Category,
        /// The rule that allowed it.
        rule: PolicyRule,
    },
    /// Settings changed.
    SettingsUpdated {
        /// The settings now in effect.
        settings: Settings,
    },
    /// The session ended and its preferences were dropped.
    SessionEnded {
        /// The session that ended.
        session_id: SessionId,
        /// How many preferences were cleared.
        cleared_preferences: usize,
    },
}

impl EngineEvent {
    /// Stable name of the event variant.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ActionQueued { .. } => "action_queued",
            Self::ActionResolved { .. } => "action_resolved",
            Self::ActionSuperseded { .. } => "action_superseded",
            Self::AutoExecuted { .. } => "auto_executed",
            Self::SettingsUpdated { .. } => "settings_updated",
            Self::SessionEnded { .. } => "session_ended",
        }
    }
}

/// Broadcast channel for [`EngineEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<EngineEvent>>,
}

impl EventBus {
    /// Create a bus with [`DEFAULT_EVENT_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a bus with the given capacity (at least 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Returns how many receivers got it.
    pub fn publish(&self, event: EngineEvent) -> usize {
        let event = Arc::new(event);
        if let Ok(count) = self.sender.send(Arc::clone(&event)) {
            debug!(event_type = event.event_type(), receiver_count = count, "Event published");
            count
        } else {
            trace!(event_type = event.event_type(), "No receivers for event");
            0
        }
    }

    /// Subscribe to all events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of an [`EventBus`] subscription.
#[derive(Debug)]
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<EngineEvent>>,
}

impl EventReceiver {
    /// Wait for the next event. Returns `None` once the engine is dropped.
    pub async fn recv(&mut self) -> Option<Arc<EngineEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next event if one is ready.
    pub fn try_recv(&mut self) -> Option<Arc<EngineEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}
