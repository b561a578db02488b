//! Logging setup errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why logging could not be set up.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The format name is not one of pretty, compact, json or full.
    #[error("unknown log format '{0}'")]
    UnknownFormat(String),

    /// A level or `target=level` directive did not parse.
    #[error("invalid log filter '{directive}': {message}")]
    InvalidFilter {
        /// The rejected level or directive.
        directive: String,
        /// Parser message.
        message: String,
    },

    /// The log directory could not be created.
    #[error("cannot create log directory {}: {source}", path.display())]
    LogDirectory {
        /// Directory that was requested.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// The appender or global subscriber could not be installed.
    #[error("logging initialization failed: {0}")]
    InitError(String),
}

/// Shorthand for telemetry results.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
