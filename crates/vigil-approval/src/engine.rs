//! The public confirmation engine.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{error, warn};
use vigil_audit::{AuditLog, RuntimeKey};
use vigil_config::ConfirmationSection;
use vigil_core::{ActionId, Category, SessionId};

use crate::action::{PendingAction, ToolCandidate};
use crate::decision::{AbortReason, ConfirmationResult, Outcome};
use crate::error::{EngineError, EngineResult, ResolutionResult};
use crate::events::EventReceiver;
use crate::policy::{self, PolicyDecision};
use crate::resolver::ConfirmationResolver;
use crate::session::SessionPreference;
use crate::settings::{Settings, SettingsPatch};

/// Future for the outcome of a queued action.
///
/// Resolves exactly once. If the engine is dropped before the action is
/// resolved, resolves to `Abort { reason: abandoned }`.
#[derive(Debug)]
pub struct Ticket {
    id: ActionId,
    rx: oneshot::Receiver<Outcome>,
}

impl Ticket {
    /// The queued action's id.
    #[must_use]
    pub fn id(&self) -> &ActionId {
        &self.id
    }
}

impl Future for Ticket {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id.clone();
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                warn!(action_id = %id, "engine dropped before the action was resolved");
                Outcome::abort(AbortReason::Abandoned)
            })
        })
    }
}

/// What [`ConfirmationEngine::submit`] did with a candidate.
#[derive(Debug)]
pub enum Submission {
    /// Policy allowed the call; no pending action was created.
    Immediate(Outcome),
    /// The call is waiting for a decision.
    Queued {
        /// Id to pass to `resolve`.
        id: ActionId,
        /// Completes with the decision.
        ticket: Ticket,
    },
}

impl Submission {
    /// The pending action's id, if one was queued.
    #[must_use]
    pub fn id(&self) -> Option<&ActionId> {
        match self {
            Self::Immediate(_) => None,
            Self::Queued { id, .. } => Some(id),
        }
    }

    /// Whether a pending action was created.
    #[must_use]
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }

    /// Wait for the final outcome.
    pub async fn outcome(self) -> Outcome {
        match self {
            Self::Immediate(outcome) => outcome,
            Self::Queued { ticket, .. } => ticket.await,
        }
    }
}

/// Human-in-the-loop gate for agent tool calls.
///
/// Cheap to clone; clones share all state. Dropping the last clone cancels
/// outstanding timers and resolves every waiting [`Ticket`] as abandoned.
#[derive(Clone)]
pub struct ConfirmationEngine {
    inner: Arc<ConfirmationResolver>,
}

impl ConfirmationEngine {
    /// Create an engine with an in-memory audit log and a fresh runtime key.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self::with_audit(
            settings,
            Arc::new(AuditLog::in_memory(RuntimeKey::generate())),
        )
    }

    /// Create an engine that writes to an existing audit log.
    #[must_use]
    pub fn with_audit(settings: Settings, audit: Arc<AuditLog>) -> Self {
        Self {
            inner: ConfirmationResolver::new(settings, audit),
        }
    }

    /// Create an engine from the `[confirmation]` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if the section holds an unknown mode, category
    /// setting or an out-of-range timeout.
    pub fn from_config(section: &ConfirmationSection) -> EngineResult<Self> {
        Ok(Self::new(Settings::try_from(section)?))
    }

    /// Dry-run policy for `candidate` against the current settings and
    /// session preferences. Nothing is queued or audited.
    #[must_use]
    pub fn decide(&self, candidate: &ToolCandidate) -> PolicyDecision {
        policy::decide(candidate, &self.inner.settings(), &self.inner.preferences())
    }

    /// Run policy and either authorize `candidate` immediately or queue it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoRuntime`] if the candidate must be queued
    /// with a timeout outside a Tokio runtime.
    pub fn submit(&self, candidate: ToolCandidate) -> EngineResult<Submission> {
        let settings = self.inner.settings();
        match policy::decide(&candidate, &settings, &self.inner.preferences()) {
            PolicyDecision::AutoExecute(rule) => Ok(Submission::Immediate(
                self.inner.auto_execute(candidate, rule),
            )),
            PolicyDecision::RequireConfirmation(rule) => {
                let timer = settings
                    .timeout()
                    .map(|after| {
                        Handle::try_current()
                            .map(|runtime| (runtime, after))
                            .map_err(|_| EngineError::NoRuntime)
                    })
                    .transpose()?;
                let (id, rx) = self.inner.enqueue(candidate, rule, &settings, timer);
                Ok(Submission::Queued {
                    id: id.clone(),
                    ticket: Ticket { id, rx },
                })
            },
        }
    }

    /// Submit `candidate` and wait for its outcome.
    ///
    /// Never fails: if the candidate cannot be queued the outcome is
    /// `Abort { reason: unavailable }`.
    pub async fn request_confirmation(&self, candidate: ToolCandidate) -> Outcome {
        match self.submit(candidate) {
            Ok(submission) => submission.outcome().await,
            Err(e) => {
                error!(error = %e, "Cannot queue action for confirmation");
                Outcome::abort(AbortReason::Unavailable)
            },
        }
    }

    /// Pending actions, oldest first.
    #[must_use]
    pub fn list_pending(&self) -> Vec<PendingAction> {
        self.inner.list_pending()
    }

    /// Number of pending actions.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending_count()
    }

    /// Number of timers still armed.
    #[must_use]
    pub fn armed_timers(&self) -> usize {
        self.inner.armed_timers()
    }

    /// Apply a decision to a pending action, exactly once.
    ///
    /// # Errors
    ///
    /// - [`ResolutionError::NotFound`](crate::ResolutionError::NotFound) if
    ///   `id` was never queued (or was forgotten by `end_session`)
    /// - [`ResolutionError::AlreadyResolved`](crate::ResolutionError::AlreadyResolved)
    ///   if it was resolved before
    /// - [`ResolutionError::InvalidTransition`](crate::ResolutionError::InvalidTransition)
    ///   if the decision does not fit the action or the settings, or is
    ///   `timeout`, which only the expiry timer may record; the action stays
    ///   pending
    pub fn resolve(&self, id: &ActionId, result: ConfirmationResult) -> ResolutionResult<Outcome> {
        self.inner.resolve(id, result)
    }

    /// Apply one decision to every pending action in `category`.
    ///
    /// Each action is resolved independently; the per-id results are
    /// returned in queue order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if bulk actions are disabled or the
    /// decision is `edit` or `timeout`.
    pub fn resolve_category(
        &self,
        category: &Category,
        result: &ConfirmationResult,
    ) -> ResolutionResult<Vec<(ActionId, ResolutionResult<Outcome>)>> {
        self.inner.resolve_category(category, result)
    }

    /// Current settings.
    #[must_use]
    pub fn get_settings(&self) -> Settings {
        self.inner.settings()
    }

    /// Patch the settings. Timers of already-queued actions keep their
    /// original deadline.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSettings`] if the patched settings are
    /// out of range; nothing changes in that case.
    pub fn update_settings(&self, patch: &SettingsPatch) -> EngineResult<Settings> {
        self.inner.update_settings(patch)
    }

    /// Subscribe to engine events.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        self.inner.subscribe()
    }

    /// End the session: forget remembered approvals and resolved ids, and
    /// start a new session id. Pending actions are not touched.
    ///
    /// The engine keeps one id per resolved or superseded action so a late
    /// decision reports `AlreadyResolved` rather than `NotFound`. That set is
    /// only released here, so hosts running long sessions should end them
    /// periodically.
    ///
    /// Returns how many preferences were cleared.
    pub fn end_session(&self) -> usize {
        self.inner.end_session()
    }

    /// Remembered approvals of the current session, oldest first.
    #[must_use]
    pub fn session_preferences(&self) -> Vec<SessionPreference> {
        self.inner.preference_list()
    }

    /// Id of the current session.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.inner.session_id()
    }

    /// The audit log this engine writes to.
    #[must_use]
    pub fn audit(&self) -> &Arc<AuditLog> {
        self.inner.audit()
    }
}

impl fmt::Debug for ConfirmationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationEngine")
            .field("session_id", &self.inner.session_id())
            .field("pending", &self.inner.pending_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
