//! Vigil Audit - Chain-linked, signed record of confirmation decisions.
//!
//! Every resolution the engine applies (approve, reject, edit, response,
//! ignore, timeout, supersession, auto-execution) is appended here. Entries
//! are immutable once written:
//!
//! - Each entry carries the BLAKE3 hash of its predecessor
//! - Each entry is signed with the runtime's Ed25519 key
//! - [`AuditLog::verify_chain`] reports broken links and bad signatures
//!
//! # Example
//!
//! ```
//! use vigil_audit::{AuditDecision, AuditLog, AuditRecord, RuntimeKey};
//! use vigil_core::{ActionId, Category, SessionId, Sensitivity};
//!
//! let log = AuditLog::in_memory(RuntimeKey::generate());
//! let record = AuditRecord {
//!     session_id: SessionId::new(),
//!     action_id: ActionId::new(),
//!     tool_name: "send_email".to_owned(),
//!     category: Category::Email,
//!     sensitivity: Sensitivity::High,
//!     decision: AuditDecision::Approve,
//!     reason: None,
//!     latency_ms: 1_250,
//! };
//! log.append(record).unwrap();
//!
//! assert!(log.verify_chain().unwrap().valid);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod entry;
mod error;
mod hash;
mod keys;
mod log;
mod storage;

pub use entry::{AuditDecision, AuditEntry, AuditEntryId, AuditRecord};
pub use error::{AuditError, AuditResult};
pub use hash::ContentHash;
pub use keys::RuntimeKey;
pub use log::{AuditLog, ChainIssue, ChainVerificationResult};
pub use storage::{AuditStorage, InMemoryAuditStorage};
