use std::time::Duration;

use serde_json::json;
use vigil_audit::AuditDecision;
use vigil_core::{Category, CategorySetting, ConfirmationMode, Parameters, Sensitivity};

use super::*;
use crate::decision::Authorization;
use crate::error::ResolutionError;
use crate::events::EngineEvent;
use crate::policy::PolicyRule;

fn engine() -> ConfirmationEngine {
    ConfirmationEngine::new(Settings::default())
}

fn high(tool: &str) -> ToolCandidate {
    ToolCandidate::new(tool, Category::Email, Sensitivity::High)
        .with_parameter("to", json!("bob@example.com"))
}

fn queue(engine: &ConfirmationEngine, candidate: ToolCandidate) -> (ActionId, Ticket) {
    match engine.submit(candidate).unwrap() {
        Submission::Queued { id, ticket } => (id, ticket),
        Submission::Immediate(outcome) => panic!("expected queued, got {outcome:?}"),
    }
}

fn audit_decisions(engine: &ConfirmationEngine) -> Vec<AuditDecision> {
    engine
        .audit()
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| e.record.decision)
        .collect()
}

#[tokio::test]
async fn test_low_sensitivity_auto_executes_in_hybrid() {
    let engine = engine();
    let candidate = ToolCandidate::new("list_inbox", Category::Email, Sensitivity::Low)
        .with_parameter("limit", json!(10));

    let outcome = engine.request_confirmation(candidate).await;
    assert_eq!(
        outcome,
        Outcome::Execute {
            parameters: Parameters::from_iter([("limit".to_owned(), json!(10))]),
            authorization: Authorization::AutoExecute {
                rule: PolicyRule::ModeHybrid
            },
        }
    );
    assert_eq!(engine.pending_count(), 0);
    assert_eq!(audit_decisions(&engine), vec![AuditDecision::AutoExecute]);
}

#[tokio::test]
async fn test_approve_delivers_original_parameters() {
    let engine = engine();
    let (id, ticket) = queue(&engine, high("send_email"));

    let pending = engine.list_pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending.first().unwrap().id, id);
    assert_eq!(pending.first().unwrap().preview.title, "Send email");

    let outcome = engine.resolve(&id, ConfirmationResult::approve()).unwrap();
    assert_eq!(ticket.await, outcome);
    assert_eq!(
        outcome.parameters().and_then(|p| p.get("to")),
        Some(&json!("bob@example.com"))
    );
    assert_eq!(engine.pending_count(), 0);
    assert_eq!(engine.armed_timers(), 0);
}

#[tokio::test]
async fn test_second_resolve_is_already_resolved_without_side_effects() {
    let engine = engine();
    let (id, _ticket) = queue(&engine, high("send_email"));

    engine.resolve(&id, ConfirmationResult::reject()).unwrap();
    let count = engine.audit().count().unwrap();

    let again = engine.resolve(&id, ConfirmationResult::approve());
    assert_eq!(again, Err(ResolutionError::AlreadyResolved { id: id.clone() }));
    assert_eq!(engine.audit().count().unwrap(), count);
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let engine = engine();
    let id = ActionId::new();
    assert_eq!(
        engine.resolve(&id, ConfirmationResult::approve()),
        Err(ResolutionError::NotFound { id: id.clone() })
    );
}

#[tokio::test]
async fn test_edit_requires_editable_action() {
    let engine = engine();
    let (id, _ticket) = queue(&engine, high("send_email"));

    let result = engine.resolve(&id, ConfirmationResult::edit(Parameters::new()));
    assert!(matches!(result, Err(ResolutionError::InvalidTransition { .. })));
    assert_eq!(engine.pending_count(), 1);
    assert!(engine.audit().entries_for_action(&id).unwrap().is_empty());
}

#[tokio::test]
async fn test_edit_requires_modified_parameters() {
    let engine = engine();
    let (id, _ticket) = queue(&engine, high("send_email").editable());

    let mut result = ConfirmationResult::approve();
    result.action = crate::DecisionKind::Edit;
    assert!(matches!(
        engine.resolve(&id, result),
        Err(ResolutionError::InvalidTransition { .. })
    ));
    assert_eq!(engine.pending_count(), 1);
}

#[tokio::test]
async fn test_edit_carries_modified_parameters_verbatim() {
    let engine = engine();
    let (id, ticket) = queue(&engine, high("send_email").editable());

    let mut edited = Parameters::new();
    edited.insert("to".to_owned(), json!("carol@example.com"));
    edited.insert("cc".to_owned(), json!(null));

    engine
        .resolve(&id, ConfirmationResult::edit(edited.clone()))
        .unwrap();
    assert_eq!(
        ticket.await,
        Outcome::Execute {
            parameters: edited,
            authorization: Authorization::Edited,
        }
    );
    assert_eq!(audit_decisions(&engine), vec![AuditDecision::Edit]);
}

#[tokio::test]
async fn test_response_requires_text() {
    let engine = engine();
    let (id, ticket) = queue(&engine, high("send_email"));

    assert!(matches!(
        engine.resolve(&id, ConfirmationResult::response("   ")),
        Err(ResolutionError::InvalidTransition { .. })
    ));

    engine
        .resolve(&id, ConfirmationResult::response("send it tomorrow instead"))
        .unwrap();
    assert_eq!(ticket.await.response_text(), Some("send it tomorrow instead"));
}

#[tokio::test]
async fn test_reject_and_ignore_abort() {
    let engine = engine();
    let (rejected, rejected_ticket) = queue(&engine, high("send_email"));
    let (ignored, ignored_ticket) = queue(&engine, high("delete_email"));

    engine.resolve(&rejected, ConfirmationResult::reject()).unwrap();
    engine.resolve(&ignored, ConfirmationResult::ignore()).unwrap();

    assert_eq!(rejected_ticket.await.reason(), Some(AbortReason::Rejected));
    assert_eq!(ignored_ticket.await.reason(), Some(AbortReason::Ignored));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_rejects_after_deadline() {
    let engine = ConfirmationEngine::new(Settings {
        confirmation_timeout_seconds: 30,
        ..Settings::default()
    });
    let (id, ticket) = queue(&engine, high("send_email"));
    let pending = engine.list_pending();
    let action = pending.first().unwrap();
    assert_eq!(action.expires_at, action.created_at.plus_seconds(30));

    assert_eq!(ticket.await, Outcome::abort(AbortReason::Timeout));
    assert_eq!(engine.pending_count(), 0);
    assert_eq!(engine.armed_timers(), 0);

    let entries = engine.audit().entries_for_action(&id).unwrap();
    assert_eq!(entries.len(), 1);
    let record = &entries.first().unwrap().record;
    assert_eq!(record.decision, AuditDecision::Timeout);
    assert!((30_000..30_010).contains(&record.latency_ms));
}

#[tokio::test(start_paused = true)]
async fn test_caller_cannot_submit_a_timeout() {
    let engine = engine();
    let (id, _ticket) = queue(&engine, high("send_email"));

    assert!(matches!(
        engine.resolve(&id, ConfirmationResult::timeout()),
        Err(ResolutionError::InvalidTransition { .. })
    ));
    assert!(matches!(
        engine.resolve_category(&Category::Email, &ConfirmationResult::timeout()),
        Err(ResolutionError::InvalidTransition { .. })
    ));
    assert_eq!(engine.pending_count(), 1);
    assert_eq!(engine.armed_timers(), 1);
    assert!(audit_decisions(&engine).is_empty());

    // The real timer still fires.
    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(audit_decisions(&engine), vec![AuditDecision::Timeout]);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_reason_names_the_armed_deadline() {
    let engine = ConfirmationEngine::new(Settings {
        confirmation_timeout_seconds: 30,
        ..Settings::default()
    });
    let (id, ticket) = queue(&engine, high("send_email"));
    engine
        .update_settings(&SettingsPatch::default().timeout_seconds(3600))
        .unwrap();

    assert_eq!(ticket.await.reason(), Some(AbortReason::Timeout));
    let entries = engine.audit().entries_for_action(&id).unwrap();
    let record = &entries.first().unwrap().record;
    assert_eq!(record.reason.as_deref(), Some("no decision within 30s"));
    assert!((30_000..30_010).contains(&record.latency_ms));
}

#[tokio::test(start_paused = true)]
async fn test_resolution_cancels_timer() {
    let engine = engine();
    let (id, _ticket) = queue(&engine, high("send_email"));
    assert_eq!(engine.armed_timers(), 1);

    engine.resolve(&id, ConfirmationResult::approve()).unwrap();
    assert_eq!(engine.armed_timers(), 0);

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(audit_decisions(&engine), vec![AuditDecision::Approve]);
}

#[test]
fn test_zero_timeout_needs_no_runtime() {
    let engine = ConfirmationEngine::new(Settings {
        confirmation_timeout_seconds: 0,
        ..Settings::default()
    });
    let (id, _ticket) = queue(&engine, high("send_email"));
    assert!(engine.list_pending().first().unwrap().expires_at.is_none());
    assert_eq!(engine.armed_timers(), 0);
    engine.resolve(&id, ConfirmationResult::approve()).unwrap();
}

#[test]
fn test_timeout_outside_runtime_is_refused() {
    let engine = engine();
    assert!(matches!(
        engine.submit(high("send_email")),
        Err(EngineError::NoRuntime)
    ));
    assert_eq!(engine.pending_count(), 0);
}

#[tokio::test]
async fn test_remember_choice_skips_same_tool_only() {
    let engine = engine();
    let (id, _ticket) = queue(&engine, high("send_email"));
    engine
        .resolve(&id, ConfirmationResult::approve().remember_choice())
        .unwrap();

    let again = engine.submit(high("send_email")).unwrap();
    assert!(!again.is_queued());
    assert_eq!(
        again.outcome().await,
        Outcome::Execute {
            parameters: high("send_email").parameters,
            authorization: Authorization::AutoExecute {
                rule: PolicyRule::SessionTool
            },
        }
    );
    assert!(engine.submit(high("delete_email")).unwrap().is_queued());
    assert_eq!(engine.session_preferences().len(), 1);
}

#[tokio::test]
async fn test_remembered_rejection_is_not_stored() {
    let engine = engine();
    let (id, _ticket) = queue(&engine, high("send_email"));
    engine
        .resolve(&id, ConfirmationResult::reject().remember_choice())
        .unwrap();
    assert!(engine.session_preferences().is_empty());
}

#[tokio::test]
async fn test_remember_preferences_off_stores_nothing() {
    let engine = ConfirmationEngine::new(Settings {
        remember_preferences: false,
        ..Settings::default()
    });
    let (id, _ticket) = queue(&engine, high("send_email"));
    engine
        .resolve(&id, ConfirmationResult::approve().bulk_approval())
        .unwrap();
    assert!(engine.session_preferences().is_empty());
    assert!(engine.submit(high("send_email")).unwrap().is_queued());
}

#[tokio::test]
async fn test_bulk_approval_refused_when_disabled() {
    let engine = ConfirmationEngine::new(Settings {
        allow_bulk_actions: false,
        ..Settings::default()
    });
    let (id, _ticket) = queue(&engine, high("send_email"));

    assert!(matches!(
        engine.resolve(&id, ConfirmationResult::approve().bulk_approval()),
        Err(ResolutionError::InvalidTransition { .. })
    ));
    assert!(matches!(
        engine.resolve_category(&Category::Email, &ConfirmationResult::approve()),
        Err(ResolutionError::InvalidTransition { .. })
    ));
    assert_eq!(engine.pending_count(), 1);
}

#[tokio::test]
async fn test_resolve_category() {
    let engine = engine();
    let (a, ticket_a) = queue(&engine, high("send_email"));
    let (_social, _ticket_s) = queue(
        &engine,
        ToolCandidate::new("post", Category::Social, Sensitivity::High),
    );
    let (b, ticket_b) = queue(&engine, high("delete_email"));

    let results = engine
        .resolve_category(&Category::Email, &ConfirmationResult::reject())
        .unwrap();
    let ids: Vec<ActionId> = results.iter().map(|(id, _)| id.clone()).collect();
    assert_eq!(ids, vec![a, b]);
    assert!(results.iter().all(|(_, r)| r.is_ok()));

    assert_eq!(ticket_a.await.reason(), Some(AbortReason::Rejected));
    assert_eq!(ticket_b.await.reason(), Some(AbortReason::Rejected));
    assert_eq!(engine.pending_count(), 1);

    assert!(matches!(
        engine.resolve_category(&Category::Social, &ConfirmationResult::edit(Parameters::new())),
        Err(ResolutionError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_identical_retry_supersedes() {
    let engine = engine();
    let (first, first_ticket) = queue(&engine, high("send_email"));
    let (_other, _other_ticket) = queue(&engine, high("archive_email"));
    let (retry, _retry_ticket) = queue(&engine, high("send_email"));

    assert_eq!(first_ticket.await, Outcome::abort(AbortReason::Superseded));
    let order: Vec<ActionId> = engine.list_pending().into_iter().map(|a| a.id).collect();
    assert_eq!(order.first(), Some(&retry));
    assert_eq!(order.len(), 2);
    assert_eq!(engine.armed_timers(), 2);

    assert_eq!(
        engine.resolve(&first, ConfirmationResult::approve()),
        Err(ResolutionError::AlreadyResolved { id: first.clone() })
    );
    let superseded = engine.audit().entries_for_action(&first).unwrap();
    assert_eq!(superseded.len(), 1);
    assert_eq!(
        superseded.first().unwrap().record.decision,
        AuditDecision::Superseded
    );
}

#[tokio::test]
async fn test_end_session_clears_preferences_but_not_pending() {
    let engine = engine();
    let first_session = engine.session_id();
    let (id, _ticket) = queue(&engine, high("send_email"));
    engine
        .resolve(&id, ConfirmationResult::approve().bulk_approval())
        .unwrap();
    let (_pending, _pending_ticket) = queue(
        &engine,
        ToolCandidate::new("transfer", Category::Email, Sensitivity::Critical),
    );

    assert_eq!(engine.end_session(), 1);
    assert_ne!(engine.session_id(), first_session);
    assert_eq!(engine.pending_count(), 1);
    assert!(engine.submit(high("send_email")).unwrap().is_queued());
    // Tombstones are gone with the session.
    assert!(matches!(
        engine.resolve(&id, ConfirmationResult::approve()),
        Err(ResolutionError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_critical_queues_despite_auto_and_bulk() {
    let engine = ConfirmationEngine::new(Settings {
        default_mode: ConfirmationMode::Auto,
        ..Settings::default()
    });
    engine
        .update_settings(&SettingsPatch::default().category(Category::Finance, CategorySetting::Auto))
        .unwrap();

    let candidate = ToolCandidate::new("wire_transfer", Category::Finance, Sensitivity::Critical);
    let (id, _ticket) = queue(&engine, candidate.clone());
    engine
        .resolve(&id, ConfirmationResult::approve().bulk_approval())
        .unwrap();

    let action_warnings = {
        let (_, _ticket) = queue(&engine, candidate);
        engine.list_pending().first().unwrap().preview.warnings.clone()
    };
    assert!(action_warnings.contains(&crate::preview::CRITICAL_WARNING.to_owned()));
}

#[tokio::test(start_paused = true)]
async fn test_update_settings_does_not_rearm() {
    let engine = ConfirmationEngine::new(Settings {
        confirmation_timeout_seconds: 30,
        ..Settings::default()
    });
    let (_old, old_ticket) = queue(&engine, high("send_email"));
    engine
        .update_settings(&SettingsPatch::default().timeout_seconds(120))
        .unwrap();
    let (new, _new_ticket) = queue(&engine, high("delete_email"));

    assert_eq!(old_ticket.await.reason(), Some(AbortReason::Timeout));
    let pending = engine.list_pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending.first().unwrap().id, new);
}

#[tokio::test]
async fn test_invalid_settings_patch_is_rejected() {
    let engine = engine();
    let result = engine.update_settings(&SettingsPatch::default().timeout_seconds(u64::MAX));
    assert!(matches!(result, Err(EngineError::InvalidSettings(_))));
    assert_eq!(engine.get_settings(), Settings::default());
}

#[tokio::test]
async fn test_events_follow_lifecycle() {
    let engine = engine();
    let mut events = engine.subscribe();

    let (id, _ticket) = queue(&engine, high("send_email"));
    engine.resolve(&id, ConfirmationResult::reject()).unwrap();
    engine.end_session();

    let kinds: Vec<&'static str> = std::iter::from_fn(|| events.try_recv())
        .map(|e| e.event_type())
        .collect();
    assert_eq!(kinds, vec!["action_queued", "action_resolved", "session_ended"]);
}

#[tokio::test]
async fn test_resolved_event_carries_outcome() {
    let engine = engine();
    let mut events = engine.subscribe();
    let (id, _ticket) = queue(&engine, high("send_email"));
    engine.resolve(&id, ConfirmationResult::ignore()).unwrap();

    let _queued = events.recv().await.unwrap();
    let resolved = events.recv().await.unwrap();
    match resolved.as_ref() {
        EngineEvent::ActionResolved {
            id: resolved_id,
            decision,
            outcome,
        } => {
            assert_eq!(resolved_id, &id);
            assert_eq!(*decision, AuditDecision::Ignore);
            assert_eq!(outcome.reason(), Some(AbortReason::Ignored));
        },
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_dropping_engine_abandons_tickets() {
    let engine = engine();
    let (_id, ticket) = queue(&engine, high("send_email"));
    drop(engine);
    assert_eq!(ticket.await, Outcome::abort(AbortReason::Abandoned));
}

#[tokio::test]
async fn test_audit_chain_is_valid() {
    let engine = engine();
    for tool in ["a", "b", "c"] {
        let (id, _ticket) = queue(&engine, high(tool));
        engine.resolve(&id, ConfirmationResult::approve()).unwrap();
    }
    let report = engine.audit().verify_chain().unwrap();
    assert!(report.valid);
    assert_eq!(report.entries_verified, 3);
}

#[test]
fn test_from_config() {
    let mut section = ConfirmationSection::default();
    section.default_mode = "preventive".to_owned();
    let engine = ConfirmationEngine::from_config(&section).unwrap();
    assert_eq!(engine.get_settings().default_mode, ConfirmationMode::Preventive);

    section.default_mode = "never".to_owned();
    assert!(ConfirmationEngine::from_config(&section).is_err());
}
