//! Shared helpers for integration tests.

use serde_json::json;
use vigil_approval::{ConfirmationEngine, Settings, Submission, Ticket, ToolCandidate};
use vigil_audit::AuditDecision;
use vigil_core::{ActionId, Category, Sensitivity};

/// Engine with the given timeout and otherwise default settings.
#[allow(dead_code)]
pub fn engine_with_timeout(seconds: u64) -> ConfirmationEngine {
    ConfirmationEngine::new(Settings {
        confirmation_timeout_seconds: seconds,
        ..Settings::default()
    })
}

/// A candidate with one distinguishing parameter.
#[allow(dead_code)]
pub fn candidate(tool: &str, category: Category, sensitivity: Sensitivity) -> ToolCandidate {
    ToolCandidate::new(tool, category, sensitivity).with_parameter("target", json!(tool))
}

/// Submit a candidate that policy must queue.
///
/// # Panics
///
/// Panics if the candidate auto-executes.
#[allow(dead_code)]
pub fn queue(engine: &ConfirmationEngine, candidate: ToolCandidate) -> (ActionId, Ticket) {
    match engine.submit(candidate).expect("submit failed") {
        Submission::Queued { id, ticket } => (id, ticket),
        Submission::Immediate(outcome) => panic!("expected a queued action, got {outcome:?}"),
    }
}

/// Audited decisions for one action, in log order.
#[allow(dead_code)]
pub fn audited(engine: &ConfirmationEngine, id: &ActionId) -> Vec<AuditDecision> {
    engine
        .audit()
        .entries_for_action(id)
        .expect("audit read failed")
        .into_iter()
        .map(|entry| entry.record.decision)
        .collect()
}
