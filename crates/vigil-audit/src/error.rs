//! Errors raised by the audit log and its storage backends.

use thiserror::Error;

/// Audit log failures.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backing store rejected a read or write.
    #[error("audit storage failed: {0}")]
    Storage(String),

    /// An entry's signature does not match its contents.
    #[error("audit entry {entry_id} (sequence {sequence}) has an invalid signature")]
    InvalidSignature {
        /// The offending entry.
        entry_id: String,
        /// Its position in the chain.
        sequence: u64,
    },

    /// A content hash was not 64 hex characters.
    #[error("malformed content hash: {0}")]
    InvalidHash(String),
}

/// Shorthand for audit results.
pub type AuditResult<T> = Result<T, AuditError>;
