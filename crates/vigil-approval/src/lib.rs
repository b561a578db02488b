//! Vigil Approval - Human-in-the-loop confirmation engine for agent tool calls.
//!
//! For every tool call an agent proposes, the engine decides whether it runs
//! immediately, waits for a human, or is rejected after a timeout:
//!
//! - **Policy** ([`decide`]): mode, per-category overrides, sensitivity and
//!   session preferences. `critical` calls always wait for a human.
//! - **Registry**: queued [`PendingAction`]s in FIFO order; an identical retry
//!   supersedes the queued call and takes its place.
//! - **Timers**: each queued action is rejected with reason `timeout` if no
//!   decision arrives within `confirmation_timeout_seconds`.
//! - **Resolution**: [`ConfirmationEngine::resolve`] applies approve, reject,
//!   edit, response or ignore exactly once. A concurrent human decision and
//!   timer never both win.
//! - **Audit**: every resolution and auto-execution is appended to a signed,
//!   chain-linked [`vigil_audit::AuditLog`].
//! - **Events**: state changes are broadcast as [`EngineEvent`]s.
//!
//! # Example
//!
//! ```
//! use vigil_approval::{ConfirmationEngine, ConfirmationResult, Settings, Submission, ToolCandidate};
//! use vigil_core::{Category, Sensitivity};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let engine = ConfirmationEngine::new(Settings::default());
//!
//! // Hybrid mode lets low-sensitivity calls through.
//! let read = ToolCandidate::new("list_inbox", Category::Email, Sensitivity::Low);
//! assert!(engine.request_confirmation(read).await.is_execute());
//!
//! // High-sensitivity calls wait for a human.
//! let send = ToolCandidate::new("send_email", Category::Email, Sensitivity::High);
//! let Submission::Queued { id, ticket } = engine.submit(send).unwrap() else {
//!     panic!("expected the call to be queued");
//! };
//! engine.resolve(&id, ConfirmationResult::approve()).unwrap();
//! assert!(ticket.await.is_execute());
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod action;
pub mod decision;
pub mod engine;
/// Error types and results for the confirmation engine.
pub mod error;
pub mod events;
pub mod policy;
pub mod preview;
pub mod session;
pub mod settings;

mod registry;
mod resolver;
mod scheduler;

pub use action::{DetailType, PendingAction, Preview, PreviewDetail, ToolCandidate};
pub use decision::{AbortReason, Authorization, ConfirmationResult, DecisionKind, Outcome};
pub use engine::{ConfirmationEngine, Submission, Ticket};
pub use error::{EngineError, EngineResult, ResolutionError, ResolutionResult};
pub use events::{DEFAULT_EVENT_CAPACITY, EngineEvent, EventBus, EventReceiver};
pub use policy::{PolicyDecision, PolicyRule, decide};
pub use preview::build_preview;
pub use session::{PreferenceScope, SessionPreference, SessionPreferenceStore, SessionPreferences};
pub use settings::{DEFAULT_TIMEOUT_SECONDS, Settings, SettingsPatch, SettingsStore};
