//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_audit::prelude::*;` to import all essential types.

// Errors
pub use crate::{AuditError, AuditResult};

// Entries
pub use crate::{AuditDecision, AuditEntry, AuditEntryId, AuditRecord};

// Log and verification
pub use crate::{AuditLog, ChainIssue, ChainVerificationResult};

// Storage
pub use crate::{AuditStorage, InMemoryAuditStorage};

// Crypto
pub use crate::{ContentHash, RuntimeKey};
