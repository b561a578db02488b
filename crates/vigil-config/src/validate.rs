//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges and use the known vocabularies.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Upper bound on the confirmation timeout (24 hours).
pub const MAX_CONFIRMATION_TIMEOUT_SECONDS: u64 = 86_400;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_confirmation(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_confirmation(config: &Config) -> ConfigResult<()> {
    let c = &config.confirmation;

    if !matches!(c.default_mode.as_str(), "preventive" | "auto" | "hybrid") {
        return Err(ConfigError::UnknownValue {
            field: "confirmation.default_mode".to_owned(),
            value: c.default_mode.clone(),
            expected: "preventive, auto, hybrid",
        });
    }

    if c.confirmation_timeout_seconds > MAX_CONFIRMATION_TIMEOUT_SECONDS {
        return Err(ConfigError::TimeoutTooLong {
            seconds: c.confirmation_timeout_seconds,
            max: MAX_CONFIRMATION_TIMEOUT_SECONDS,
        });
    }

    for (name, setting) in &c.categories {
        if name.is_empty()
            || !name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
        {
            return Err(ConfigError::ValidationError {
                field: format!("confirmation.categories.{name}"),
                message: "category names may only contain letters, digits, '_', '-' and '.'"
                    .to_owned(),
            });
        }

        if !matches!(setting.as_str(), "always_confirm" | "auto" | "inherit") {
            return Err(ConfigError::UnknownValue {
                field: format!("confirmation.categories.{name}"),
                value: setting.clone(),
                expected: "always_confirm, auto, inherit",
            });
        }
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !matches!(
        l.level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return Err(ConfigError::UnknownValue {
            field: "logging.level".to_owned(),
            value: l.level.clone(),
            expected: "trace, debug, info, warn, error",
        });
    }

    if !matches!(l.format.as_str(), "pretty" | "compact" | "json" | "full") {
        return Err(ConfigError::UnknownValue {
            field: "logging.format".to_owned(),
            value: l.format.clone(),
            expected: "pretty, compact, json, full",
        });
    }

    Ok(())
}
