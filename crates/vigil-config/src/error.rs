//! Configuration errors.

use std::io;

use thiserror::Error;

/// Everything that can go wrong while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    ReadError {
        /// File path.
        path: String,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// A config file is not valid TOML or does not match the schema.
    #[error("cannot parse {path}: {source}")]
    ParseError {
        /// File path, or a placeholder for merged/in-memory input.
        path: String,
        /// TOML failure.
        #[source]
        source: toml::de::Error,
    },

    /// A string field holds a value outside its vocabulary.
    #[error("{field}: unsupported value '{value}'; expected one of: {expected}")]
    UnknownValue {
        /// Dotted field path.
        field: String,
        /// The rejected value.
        value: String,
        /// Comma-separated accepted values.
        expected: &'static str,
    },

    /// The confirmation timeout is above the allowed maximum.
    #[error("confirmation.confirmation_timeout_seconds: {seconds}s exceeds the maximum of {max}s")]
    TimeoutTooLong {
        /// Configured value.
        seconds: u64,
        /// Upper bound.
        max: u64,
    },

    /// Any other invalid field.
    #[error("{field}: {message}")]
    ValidationError {
        /// Dotted field path.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// No home directory to look for `~/.vigil/config.toml` in.
    #[error("could not determine the home directory")]
    NoHomeDir,
}

/// Shorthand for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
