//! Logging setup shared by the Vigil engine and CLI.
//!
//! Every engine component logs through `tracing` with structured fields
//! (`action_id`, `tool`, `decision`). This crate turns the `[logging]` config
//! section into a global subscriber: a level plus per-crate directives, one of
//! four formats, and stderr or rolling files via `tracing-appender`.
//!
//! # Example
//!
//! ```rust,no_run
//! use vigil_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), vigil_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("vigil_approval=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("engine starting");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_logging};
