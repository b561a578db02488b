#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Unified configuration system for Vigil.
//!
//! This crate provides a single [`Config`] type holding the confirmation
//! policy defaults and the logging setup.
//!
//! # Usage
//!
//! ```rust,no_run
//! use vigil_config::Config;
//!
//! // Load with full precedence chain (defaults → user → explicit file → env).
//! let resolved = Config::load(None).unwrap();
//! println!("Default mode: {}", resolved.config.confirmation.default_mode);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Explicit file** (`--config PATH`)
//! 2. **User** (`~/.vigil/config.toml`, or `$VIGIL_HOME/config.toml`)
//! 3. **Environment variables** (`VIGIL_*`), used only for fields no file sets
//! 4. **Embedded defaults** (`defaults.toml` compiled into binary)
//!
//! # Design
//!
//! This crate has **no dependencies on other internal vigil crates**. Values
//! such as modes and category settings are kept as validated strings;
//! conversion into the engine's typed settings happens in `vigil-approval`.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging with source tracking.
pub mod merge;
/// Resolved configuration display and serialization.
pub mod show;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use show::{ResolvedConfig, ShowFormat};
pub use types::*;

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// `explicit` is an optional file layered above the user config.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(explicit: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(explicit, None)
    }

    /// Load configuration with an explicit Vigil home directory override.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load_with_home(
        explicit: Option<&std::path::Path>,
        vigil_home: &std::path::Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(explicit, Some(vigil_home))
    }

    /// Load configuration from a single file (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Parse and validate configuration from a TOML string layered over the
    /// embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the string is not valid TOML or the result
    /// fails validation.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        loader::parse_str(content)
    }
}
