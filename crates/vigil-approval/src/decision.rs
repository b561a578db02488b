//! Decisions submitted by humans (or the timer) and the outcomes handed back
//! to the agent.

use std::fmt;

use serde::{Deserialize, Serialize};
use vigil_audit::AuditDecision;
use vigil_core::Parameters;

use crate::policy::PolicyRule;

/// What the human (or the timer) decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Run with the original parameters.
    Approve,
    /// Do not run.
    Reject,
    /// Run with `modified_parameters` instead of the original ones.
    Edit,
    /// Do not run; hand `response_text` back to the model instead.
    Response,
    /// Dismissed without a decision.
    Ignore,
    /// No decision arrived in time.
    Timeout,
}

impl DecisionKind {
    /// Whether this decision lets the tool call run.
    #[must_use]
    pub fn is_approving(self) -> bool {
        matches!(self, Self::Approve | Self::Edit)
    }

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
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DecisionKind> for AuditDecision {
    fn from(kind: DecisionKind) -> Self {
        match kind {
            DecisionKind::Approve => Self::Approve,
            DecisionKind::Reject => Self::Reject,
            DecisionKind::Edit => Self::Edit,
            DecisionKind::Response => Self::Response,
            DecisionKind::Ignore => Self::Ignore,
            DecisionKind::Timeout => Self::Timeout,
        }
    }
}

/// A decision for one pending action, as submitted to `resolve`.
///
/// # Example
///
/// ```
/// use vigil_approval::{ConfirmationResult, DecisionKind};
///
/// let result = ConfirmationResult::approve().remember_choice();
/// assert_eq!(result.action, DecisionKind::Approve);
/// assert!(result.remember_choice);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationResult {
    /// The decision.
    pub action: DecisionKind,
    /// Replacement parameters; required for `edit`, ignored otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_parameters: Option<Parameters>,
    /// Model-facing text; required for `response`, ignored otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    /// Remember an approval of this tool for the rest of the session.
    #[serde(default)]
    pub remember_choice: bool,
    /// Remember an approval of this whole category for the rest of the session.
    #[serde(default)]
    pub bulk_approval: bool,
}

impl ConfirmationResult {
    fn of(action: DecisionKind) -> Self {
        Self {
            action,
            modified_parameters: None,
            response_text: None,
            remember_choice: false,
            bulk_approval: false,
        }
    }

    /// Approve with the original parameters.
    #[must_use]
    pub fn approve() -> Self {
        Self::of(DecisionKind::Approve)
    }

    /// Reject.
    #[must_use]
    pub fn reject() -> Self {
        Self::of(DecisionKind::Reject)
    }

    /// Approve with replacement parameters.
    #[must_use]
    pub fn edit(parameters: Parameters) -> Self {
        Self {
            modified_parameters: Some(parameters),
            ..Self::of(DecisionKind::Edit)
        }
    }

    /// Answer the model instead of running the tool.
    #[must_use]
    pub fn response(text: impl Into<String>) -> Self {
        Self {
            response_text: Some(text.into()),
            ..Self::of(DecisionKind::Response)
        }
    }

    /// Dismiss.
    #[must_use]
    pub fn ignore() -> Self {
        Self::of(DecisionKind::Ignore)
    }

    /// The decision the timer submits.
    #[must_use]
    pub fn timeout() -> Self {
        Self::of(DecisionKind::Timeout)
    }

    /// Set `remember_choice`.
    #[must_use]
    pub fn remember_choice(mut self) -> Self {
        self.remember_choice = true;
        self
    }

    /// Set `bulk_approval`.
    #[must_use]
    pub fn bulk_approval(mut self) -> Self {
        self.bulk_approval = true;
        self
    }
}

/// Why a tool call must not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// The human rejected it.
    Rejected,
    /// The human dismissed it.
    Ignored,
    /// No decision arrived before the deadline.
    Timeout,
    /// An identical retry replaced it in the queue.
    Superseded,
    /// The engine went away before a decision was delivered.
    Abandoned,
    /// The engine could not queue it (no async runtime).
    Unavailable,
}

impl AbortReason {
    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rejected => "rejected",
            Self::Ignored => "ignored",
            Self::Timeout => "timeout",
            Self::Superseded => "superseded",
            Self::Abandoned => "abandoned",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an executing tool call was authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Authorization {
    /// No confirmation was needed.
    AutoExecute {
        /// The policy rule that allowed it.
        rule: PolicyRule,
    },
    /// A human approved the original parameters.
    Approved,
    /// A human approved edited parameters.
    Edited,
}

/// The single, final answer the agent receives for a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Run the tool with exactly these parameters.
    Execute {
        /// Parameters to run with.
        parameters: Parameters,
        /// How the call was authorized.
        authorization: Authorization,
    },
    /// Do not run the tool; feed `text` to the model instead.
    Respond {
        /// Model-facing response from the human.
        text: String,
    },
    /// Do not run the tool.
    Abort {
        /// Why.
        reason: AbortReason,
    },
}

impl Outcome {
    pub(crate) fn abort(reason: AbortReason) -> Self {
        Self::Abort { reason }
    }

    /// Whether the caller may run the tool.
    #[must_use]
    pub fn is_execute(&self) -> bool {
        matches!(self, Self::Execute { .. })
    }

    /// Parameters to run with, if executing.
    #[must_use]
    pub fn parameters(&self) -> Option<&Parameters> {
        match self {
            Self::Execute { parameters, .. } => Some(parameters),
            _ => None,
        }
    }

    /// Abort reason, if aborted.
    #[must_use]
    pub fn reason(&self) -> Option<AbortReason> {
        match self {
            Self::Abort { reason } => Some(*reason),
            _ => None,
        }
    }

    /// Response text, if responding.
    #[must_use]
    pub fn response_text(&self) -> Option<&str> {
        match self {
            Self::Respond { text } => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_builders() {
        let mut params = Parameters::new();
        params.insert("to".to_owned(), json!("a@example.com"));

        let edit = ConfirmationResult::edit(params.clone());
        assert_eq!(edit.action, DecisionKind::Edit);
        assert_eq!(edit.modified_parameters, Some(params));

        let bulk = ConfirmationResult::approve().bulk_approval();
        assert!(bulk.bulk_approval);
        assert!(!bulk.remember_choice);

        let response = ConfirmationResult::response("use the draft instead");
        assert_eq!(response.response_text.as_deref(), Some("use the draft instead"));
    }

    #[test]
    fn test_result_deserializes_with_defaults() {
        let result: ConfirmationResult = serde_json::from_value(json!({"action": "reject"})).unwrap();
        assert_eq!(result, ConfirmationResult::reject());
    }

    #[test]
    fn test_decision_kind_to_audit() {
        assert_eq!(AuditDecision::from(DecisionKind::Timeout), AuditDecision::Timeout);
        assert!(DecisionKind::Edit.is_approving());
        assert!(!DecisionKind::Response.is_approving());
    }

    #[test]
    fn test_outcome_accessors() {
        let abort = Outcome::abort(AbortReason::Timeout);
        assert!(!abort.is_execute());
        assert_eq!(abort.reason(), Some(AbortReason::Timeout));
        assert!(abort.parameters().is_none());

        let respond = Outcome::Respond {
            text: "no".to_owned(),
        };
        assert_eq!(respond.response_text(), Some("no"));
        assert_eq!(respond.reason(), None);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = Outcome::Execute {
            parameters: Parameters::new(),
            authorization: Authorization::Edited,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["kind"], "execute");
        assert_eq!(value["authorization"]["by"], "edited");

        let abort = serde_json::to_value(Outcome::abort(AbortReason::Superseded)).unwrap();
        assert_eq!(abort, json!({"kind": "abort", "reason": "superseded"}));
    }
}
