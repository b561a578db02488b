//! Configuration struct definitions.
//!
//! All types use `#[serde(default)]` so partial TOML files deserialize
//! correctly; missing fields take the values from [`Default`], which match
//! the embedded `defaults.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level Vigil configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Confirmation policy defaults.
    pub confirmation: ConfirmationSection,
    /// Logging setup.
    pub logging: LoggingSection,
}

/// Confirmation policy defaults loaded at startup.
///
/// Modes and category settings are stored as the strings found on disk;
/// [`validate`](crate::validate::validate) checks them against the known
/// vocabularies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationSection {
    /// Global mode: `preventive`, `auto` or `hybrid`.
    pub default_mode: String,
    /// Seconds before an unanswered confirmation is auto-rejected (0 = never).
    pub confirmation_timeout_seconds: u64,
    /// Whether a single decision may approve a whole category.
    pub allow_bulk_actions: bool,
    /// Whether remember-choice decisions are stored for the session.
    pub remember_preferences: bool,
    /// Per-category overrides keyed by category name.
    pub categories: BTreeMap<String, String>,
}

impl Default for ConfirmationSection {
    fn default() -> Self {
        Self {
            default_mode: "hybrid".to_owned(),
            confirmation_timeout_seconds: 300,
            allow_bulk_actions: true,
            remember_preferences: true,
            categories: BTreeMap::new(),
        }
    }
}

/// Logging setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Level filter (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Output format: `pretty`, `compact`, `json` or `full`.
    pub format: String,
    /// Extra `target=level` directives.
    pub directives: Vec<String>,
    /// Directory for rolling log files. Logs go to stderr when unset.
    pub directory: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
        }
    }
}
