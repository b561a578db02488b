//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge the user config (`~/.vigil/config.toml`, or `$VIGIL_HOME/config.toml`)
//! 3. Merge the explicit file, if one was given
//! 4. Apply env var fallbacks for fields no file set
//! 5. Deserialize merged tree → `Config`
//! 6. Validate
//! 7. Return `ResolvedConfig`

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_layer};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load the unified configuration with layered file precedence.
///
/// `vigil_home_override` is used as the Vigil home directory (the directory
/// containing `config.toml`), bypassing home discovery and `VIGIL_HOME`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// final merged configuration fails validation.
pub fn load(
    explicit: Option<&Path>,
    vigil_home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    let env_vars = collect_env_vars();

    // 1. Embedded defaults.
    let mut merged = parse_defaults()?;
    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_layer(&merged, "", &ConfigLayer::Defaults, &mut field_sources);

    // 2. User config.
    let user_path = match vigil_home_override {
        Some(home) => Some(home.join("config.toml")),
        None => match env_vars.get("VIGIL_HOME") {
            Some(home) => Some(PathBuf::from(home).join("config.toml")),
            None => home_directory()
                .ok()
                .map(|h| h.join(".vigil").join("config.toml")),
        },
    };
    if let Some(path) = user_path
        && let Some(overlay) = try_load_file(&path)?
    {
        deep_merge_tracking(
            &mut merged,
            &overlay,
            "",
            &ConfigLayer::User,
            &mut field_sources,
        );
        loaded_files.push(path.display().to_string());
        info!(path = %path.display(), "loaded user config");
    }

    // 3. Explicit file. Unlike the user layer it must exist.
    if let Some(path) = explicit {
        let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        })?;
        deep_merge_tracking(
            &mut merged,
            &overlay,
            "",
            &ConfigLayer::File,
            &mut field_sources,
        );
        loaded_files.push(path.display().to_string());
        info!(path = %path.display(), "loaded config file");
    }

    // 4. Env var fallbacks.
    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, &env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    // 5–6. Deserialize and validate.
    let config = into_config(merged, "<merged config>")?;
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a config from a specific file path (no layering).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let value = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
    })?;
    let config = into_config(value, &path.display().to_string())?;
    validate::validate(&config)?;
    Ok(config)
}

/// Parse a TOML string layered over the embedded defaults.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the string is not valid TOML or the result
/// fails validation.
pub fn parse_str(content: &str) -> ConfigResult<Config> {
    let mut merged = parse_defaults()?;
    let overlay: toml::Value = toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: "<string>".to_owned(),
        source: e,
    })?;
    let mut sources = FieldSources::new();
    deep_merge_tracking(&mut merged, &overlay, "", &ConfigLayer::File, &mut sources);
    let config = into_config(merged, "<string>")?;
    validate::validate(&config)?;
    Ok(config)
}

fn parse_defaults() -> ConfigResult<toml::Value> {
    toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
        path: "<embedded defaults>".to_owned(),
        source: e,
    })
}

fn into_config(value: toml::Value, origin: &str) -> ConfigResult<Config> {
    value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: origin.to_owned(),
            source: e,
        })
}

/// Try to load a file, returning `None` if the file doesn't exist.
///
/// Uses a single read so there is no window between an existence check and
/// the read.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_parse_and_validate() {
        let config = into_config(parse_defaults().unwrap(), "defaults").unwrap();
        assert!(validate::validate(&config).is_ok());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_with_empty_home() {
        let home = tempfile::tempdir().unwrap();
        let resolved = load(None, Some(home.path())).unwrap();
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(resolved.config.confirmation.default_mode, "hybrid");
    }

    #[test]
    fn test_user_then_explicit_precedence() {
        let home = tempfile::tempdir().unwrap();
        write_file(
            home.path(),
            "config.toml",
            "[confirmation]\ndefault_mode = \"preventive\"\nconfirmation_timeout_seconds = 60\n",
        );
        let other = tempfile::tempdir().unwrap();
        let explicit = write_file(
            other.path(),
            "vigil.toml",
            "[confirmation]\nconfirmation_timeout_seconds = 30\n[confirmation.categories]\nemail = \"auto\"\n",
        );

        let resolved = load(Some(&explicit), Some(home.path())).unwrap();
        let c = &resolved.config.confirmation;
        assert_eq!(c.default_mode, "preventive");
        assert_eq!(c.confirmation_timeout_seconds, 30);
        assert_eq!(c.categories["email"], "auto");
        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(
            resolved.field_sources.get("confirmation.default_mode"),
            Some(&ConfigLayer::User)
        );
        assert_eq!(
            resolved
                .field_sources
                .get("confirmation.confirmation_timeout_seconds"),
            Some(&ConfigLayer::File)
        );
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let home = tempfile::tempdir().unwrap();
        let missing = home.path().join("nope.toml");
        assert!(matches!(
            load(Some(&missing), Some(home.path())),
            Err(ConfigError::ReadError { .. })
        ));
    }

    #[test]
    fn test_invalid_user_config_is_error() {
        let home = tempfile::tempdir().unwrap();
        write_file(
            home.path(),
            "config.toml",
            "[confirmation]\ndefault_mode = \"yolo\"\n",
        );
        assert!(matches!(
            load(None, Some(home.path())),
            Err(ConfigError::UnknownValue { .. })
        ));
    }

    #[test]
    fn test_load_file_no_layering() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "c.toml", "[logging]\nformat = \"json\"\n");
        let config = load_file(&path).unwrap();
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.confirmation.default_mode, "hybrid");
    }

    #[test]
    fn test_parse_str_malformed() {
        assert!(matches!(
            parse_str("[confirmation"),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
