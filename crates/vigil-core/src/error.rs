//! Core error types.

use thiserror::Error;

/// Errors raised while parsing the core vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A string did not name a known sensitivity tier.
    #[error("unknown sensitivity '{0}'; expected one of: low, medium, high, critical")]
    UnknownSensitivity(String),

    /// A string did not name a known confirmation mode.
    #[error("unknown confirmation mode '{0}'; expected one of: preventive, auto, hybrid")]
    UnknownMode(String),

    /// A string did not name a known per-category setting.
    #[error("unknown category setting '{0}'; expected one of: always_confirm, auto, inherit")]
    UnknownCategorySetting(String),

    /// A category name was empty or contained invalid characters.
    #[error("invalid category name '{0}'")]
    InvalidCategory(String),
}

/// Result type for core parsing operations.
pub type CoreResult<T> = Result<T, CoreError>;
