//! Exactly-once application of decisions to pending actions.
//!
//! The resolver owns every piece of mutable engine state: the registry, the
//! timers, the session preferences, the settings and the audit log handle.
//! A resolution runs in three phases:
//!
//! 1. **Validate** against a copy of the action and a settings snapshot. A
//!    refusal here leaves the action pending and has no side effects.
//! 2. **Take** the slot from the registry. This is the linearization point;
//!    a concurrent human decision or timer that loses sees `AlreadyResolved`.
//! 3. **Apply**: cancel the timer, write preferences, append the audit entry,
//!    deliver the outcome to the waiter and publish an event.

use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use vigil_audit::{AuditDecision, AuditLog, AuditRecord};
use vigil_core::{ActionId, Category, SessionId, Timestamp, fingerprint};

use crate::action::{PendingAction, ToolCandidate};
use crate::decision::{
    AbortReason, Authorization, ConfirmationResult, DecisionKind, Outcome,
};
use crate::error::{EngineResult, ResolutionError, ResolutionResult};
use crate::events::{EngineEvent, EventBus, EventReceiver};
use crate::policy::PolicyRule;
use crate::preview::build_preview;
use crate::registry::{PendingActionRegistry, Slot};
use crate::scheduler::{ExpiryHandler, TimeoutScheduler};
use crate::session::{SessionPreference, SessionPreferenceStore, SessionPreferences};
use crate::settings::{Settings, SettingsPatch, SettingsStore};

/// Milliseconds since `since`, saturating.
fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

pub(crate) struct ConfirmationResolver {
    me: Weak<Self>,
    registry: PendingActionRegistry,
    scheduler: TimeoutScheduler,
    preferences: SessionPreferenceStore,
    settings: SettingsStore,
    audit: Arc<AuditLog>,
    events: EventBus,
    session_id: RwLock<SessionId>,
}

impl ConfirmationResolver {
    pub(crate) fn new(settings: Settings, audit: Arc<AuditLog>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            registry: PendingActionRegistry::new(),
            scheduler: TimeoutScheduler::new(),
            preferences: SessionPreferenceStore::new(),
            settings: SettingsStore::new(settings),
            audit,
            events: EventBus::new(),
            session_id: RwLock::new(SessionId::new()),
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub(crate) fn settings(&self) -> Settings {
        self.settings.snapshot()
    }

    pub(crate) fn preferences(&self) -> SessionPreferences {
        self.preferences.snapshot()
    }

    pub(crate) fn preference_list(&self) -> Vec<SessionPreference> {
        self.preferences.list()
    }

    pub(crate) fn list_pending(&self) -> Vec<PendingAction> {
        self.registry.list()
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.registry.len()
    }

    pub(crate) fn armed_timers(&self) -> usize {
        self.scheduler.armed_count()
    }

    pub(crate) fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    pub(crate) fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub(crate) fn session_id(&self) -> SessionId {
        self.session_id
            .read()
            .unwrap_or_else(|e| {
                warn!("session id lock poisoned, recovering");
                e.into_inner()
            })
            .clone()
    }

    // -----------------------------------------------------------------------
    // Queueing
    // -----------------------------------------------------------------------

    /// Record an auto-executed call and build its outcome.
    pub(crate) fn auto_execute(&self, candidate: ToolCandidate, rule: PolicyRule) -> Outcome {
        self.append_audit(AuditRecord {
            session_id: self.session_id(),
            action_id: ActionId::new(),
            tool_name: candidate.tool_name.clone(),
            category: candidate.category.clone(),
            sensitivity: candidate.sensitivity,
            decision: AuditDecision::AutoExecute,
            reason: Some(rule.as_str().to_owned()),
            latency_ms: 0,
        });
        debug!(
            tool = %candidate.tool_name,
            category = %candidate.category,
            rule = %rule,
            "Auto-executing tool call"
        );
        self.events.publish(EngineEvent::AutoExecuted {
            tool_name: candidate.tool_name,
            category: candidate.category,
            rule,
        });
        Outcome::Execute {
            parameters: candidate.parameters,
            authorization: Authorization::AutoExecute { rule },
        }
    }

    /// Queue `candidate` and arm its timer. `timer` is `None` when timeouts
    /// are disabled.
    pub(crate) fn enqueue(
        &self,
        candidate: ToolCandidate,
        rule: PolicyRule,
        settings: &Settings,
        timer: Option<(Handle, Duration)>,
    ) -> (ActionId, oneshot::Receiver<Outcome>) {
        let id = ActionId::new();
        let created_at = Timestamp::now();
        let expires_at = settings
            .timeout()
            .and_then(|_| created_at.plus_seconds(settings.confirmation_timeout_seconds));
        let preview = build_preview(&candidate);
        let fp = fingerprint(&candidate.tool_name, &candidate.parameters);
        let action = PendingAction::from_candidate(id.clone(), candidate, preview, created_at, expires_at);

        info!(
            action_id = %id,
            tool = %action.tool_name,
            category = %action.category,
            sensitivity = %action.sensitivity,
            rule = %rule,
            fingerprint = %fp,
            "Action queued for confirmation"
        );

        let (tx, rx) = oneshot::channel();
        let queued = action.clone();
        let slot =
            Slot::new(action, fp, tx).with_timeout(timer.as_ref().map(|(_, after)| *after));
        if let Some(superseded) = self.registry.insert(slot) {
            self.finish_superseded(superseded, &id);
        }
        self.events.publish(EngineEvent::ActionQueued { action: queued });

        if let Some((runtime, after)) = timer {
            let handler: Weak<dyn ExpiryHandler> = self.me.clone();
            self.scheduler.arm(&runtime, id.clone(), after, handler);
            // Resolved between insert and arm: the timer must not outlive it.
            if !self.registry.contains(&id) {
                self.scheduler.disarm(&id);
            }
        }

        (id, rx)
    }

    fn finish_superseded(&self, mut slot: Slot, replaced_by: &ActionId) {
        let id = slot.action.id.clone();
        self.scheduler.disarm(&id);
        info!(action_id = %id, replaced_by = %replaced_by, "Pending action superseded");

        self.append_audit(self.record_for(
            &slot.action,
            AuditDecision::Superseded,
            Some(format!("superseded by {replaced_by}")),
            elapsed_ms(slot.enqueued_at),
        ));
        slot.notify(Outcome::abort(AbortReason::Superseded));
        self.events.publish(EngineEvent::ActionSuperseded {
            id,
            replaced_by: replaced_by.clone(),
        });
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Check `result` against `action` and build the outcome it would produce.
    fn prepare(
        action: &PendingAction,
        result: &ConfirmationResult,
        settings: &Settings,
    ) -> ResolutionResult<Outcome> {
        if result.bulk_approval && !settings.allow_bulk_actions {
            return Err(ResolutionError::invalid("bulk actions are disabled"));
        }

        match result.action {
            DecisionKind::Approve => Ok(Outcome::Execute {
                parameters: action.parameters.clone(),
                authorization: Authorization::Approved,
            }),
            DecisionKind::Edit => {
                if !action.editable {
                    return Err(ResolutionError::invalid(format!(
                        "action {} is not editable",
                        action.id
                    )));
                }
                let parameters = result
                    .modified_parameters
                    .clone()
                    .ok_or_else(|| ResolutionError::invalid("edit requires modified_parameters"))?;
                Ok(Outcome::Execute {
                    parameters,
                    authorization: Authorization::Edited,
                })
            },
            DecisionKind::Response => match result.response_text.as_deref() {
                Some(text) if !text.trim().is_empty() => Ok(Outcome::Respond {
                    text: text.to_owned(),
                }),
                _ => Err(ResolutionError::invalid(
                    "response requires a non-empty response_text",
                )),
            },
            DecisionKind::Reject => Ok(Outcome::abort(AbortReason::Rejected)),
            DecisionKind::Ignore => Ok(Outcome::abort(AbortReason::Ignored)),
            DecisionKind::Timeout => Ok(Outcome::abort(AbortReason::Timeout)),
        }
    }

    /// `armed` is the timeout the action was queued with, not the current one.
    fn audit_reason(result: &ConfirmationResult, armed: Option<Duration>) -> Option<String> {
        match result.action {
            DecisionKind::Timeout => Some(armed.map_or_else(
                || "no decision".to_owned(),
                |after| format!("no decision within {}s", after.as_secs()),
            )),
            DecisionKind::Edit => Some("parameters edited".to_owned()),
            DecisionKind::Approve if result.bulk_approval => Some("bulk approval".to_owned()),
            DecisionKind::Approve if result.remember_choice => {
                Some("remembered for session".to_owned())
            },
            _ => None,
        }
    }

    /// Apply a caller's decision. Timeouts belong to the expiry timer.
    pub(crate) fn resolve(
        &self,
        id: &ActionId,
        result: ConfirmationResult,
    ) -> ResolutionResult<Outcome> {
        if result.action == DecisionKind::Timeout {
            return Err(ResolutionError::invalid(
                "timeout is reserved for the expiry timer",
            ));
        }
        self.resolve_inner(id, result)
    }

    fn resolve_inner(
        &self,
        id: &ActionId,
        result: ConfirmationResult,
    ) -> ResolutionResult<Outcome> {
        let settings = self.settings.snapshot();
        let action = self.registry.get(id)?;
        let outcome = Self::prepare(&action, &result, &settings)?;

        let mut slot = self.registry.take(id)?;
        self.scheduler.disarm(id);
        let latency_ms = elapsed_ms(slot.enqueued_at);

        if outcome.is_execute() && settings.remember_preferences {
            if result.bulk_approval {
                self.preferences.remember_category(slot.action.category.clone());
            } else if result.remember_choice {
                self.preferences
                    .remember_tool(slot.action.category.clone(), &slot.action.tool_name);
            }
        }

        let decision = AuditDecision::from(result.action);
        self.append_audit(self.record_for(
            &slot.action,
            decision,
            Self::audit_reason(&result, slot.armed_timeout),
            latency_ms,
        ));

        info!(
            action_id = %id,
            tool = %slot.action.tool_name,
            decision = decision.as_str(),
            latency_ms,
            "Action resolved"
        );

        slot.notify(outcome.clone());
        self.events.publish(EngineEvent::ActionResolved {
            id: id.clone(),
            decision,
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    pub(crate) fn resolve_category(
        &self,
        category: &Category,
        result: &ConfirmationResult,
    ) -> ResolutionResult<Vec<(ActionId, ResolutionResult<Outcome>)>> {
        if !self.settings.snapshot().allow_bulk_actions {
            return Err(ResolutionError::invalid("bulk actions are disabled"));
        }
        match result.action {
            DecisionKind::Edit => {
                return Err(ResolutionError::invalid(
                    "edit cannot be applied to a whole category",
                ));
            },
            DecisionKind::Timeout => {
                return Err(ResolutionError::invalid(
                    "timeout is reserved for the expiry timer",
                ));
            },
            _ => {},
        }

        let ids = self.registry.ids_in_category(category);
        info!(category = %category, count = ids.len(), decision = %result.action, "Bulk resolving category");
        Ok(ids
            .into_iter()
            .map(|id| {
                let outcome = self.resolve(&id, result.clone());
                (id, outcome)
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Settings and session
    // -----------------------------------------------------------------------

    pub(crate) fn update_settings(&self, patch: &SettingsPatch) -> EngineResult<Settings> {
        let settings = self.settings.update(patch)?;
        info!(
            default_mode = %settings.default_mode,
            timeout_seconds = settings.confirmation_timeout_seconds,
            overrides = settings.per_category.len(),
            "Settings updated"
        );
        self.events.publish(EngineEvent::SettingsUpdated {
            settings: settings.clone(),
        });
        Ok(settings)
    }

    pub(crate) fn end_session(&self) -> usize {
        let cleared = self.preferences.clear();
        let forgotten = self.registry.clear_tombstones();
        let ended = {
            let mut guard = self.session_id.write().unwrap_or_else(|e| {
                warn!("session id lock poisoned, recovering");
                e.into_inner()
            });
            std::mem::replace(&mut *guard, SessionId::new())
        };

        info!(
            session_id = %ended,
            cleared_preferences = cleared,
            forgotten_ids = forgotten,
            pending = self.registry.len(),
            "Session ended"
        );
        self.events.publish(EngineEvent::SessionEnded {
            session_id: ended,
            cleared_preferences: cleared,
        });
        cleared
    }

    // -----------------------------------------------------------------------
    // Audit
    // -----------------------------------------------------------------------

    fn record_for(
        &self,
        action: &PendingAction,
        decision: AuditDecision,
        reason: Option<String>,
        latency_ms: u64,
    ) -> AuditRecord {
        AuditRecord {
            session_id: self.session_id(),
            action_id: action.id.clone(),
            tool_name: action.tool_name.clone(),
            category: action.category.clone(),
            sensitivity: action.sensitivity,
            decision,
            reason,
            latency_ms,
        }
    }

    /// Audit failures are logged; they never undo or block a resolution.
    fn append_audit(&self, record: AuditRecord) {
        let action_id = record.action_id.clone();
        if let Err(e) = self.audit.append(record) {
            error!(action_id = %action_id, error = %e, "Failed to write audit entry");
        }
    }
}

impl ExpiryHandler for ConfirmationResolver {
    fn on_expired(&self, id: &ActionId) {
        match self.resolve_inner(id, ConfirmationResult::timeout()) {
            Ok(_) => debug!(action_id = %id, "Action timed out"),
            Err(
                e @ (ResolutionError::AlreadyResolved { .. } | ResolutionError::NotFound { .. }),
            ) => debug!(action_id = %id, reason = %e, "Timer lost the race"),
            Err(e) => warn!(action_id = %id, error = %e, "Timeout resolution refused"),
        }
    }
}
