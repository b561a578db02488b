//! Common imports: `use vigil_telemetry::prelude::*;`.

pub use crate::{
    FileRotation, LogConfig, LogFormat, LogTarget, TelemetryError, TelemetryResult, setup_logging,
};
