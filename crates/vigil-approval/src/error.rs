use thiserror::Error;
use vigil_core::{ActionId, CoreError};

/// Why a `resolve` call was refused.
///
/// A refused resolution has no side effects: the action (if any) stays
/// pending, nothing is audited and no waiter is notified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The id was never queued, or its tombstone was cleared by `end_session`.
    #[error("no pending action with id {id}")]
    NotFound {
        /// The id that was looked up.
        id: ActionId,
    },

    /// The action was already resolved (by a human, a timeout or supersession).
    #[error("action {id} was already resolved")]
    AlreadyResolved {
        /// The id that was looked up.
        id: ActionId,
    },

    /// The decision is not valid for this action or the current settings.
    #[error("invalid transition: {reason}")]
    InvalidTransition {
        /// What was wrong with the decision.
        reason: String,
    },
}

impl ResolutionError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            reason: reason.into(),
        }
    }
}

/// Errors raised by engine operations other than `resolve`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Queuing needs a Tokio runtime to run the timeout timer.
    #[error("no tokio runtime available to schedule confirmation timeouts")]
    NoRuntime,

    /// A settings value or patch was rejected.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A mode, category or sensitivity string could not be parsed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for `resolve` operations.
pub type ResolutionResult<T> = Result<T, ResolutionError>;

/// Result type for other engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
