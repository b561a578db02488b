//! Bridge from `vigil_config::Config` to telemetry and engine types.

use anyhow::{Context, Result};
use vigil_approval::Settings;
use vigil_config::Config;
use vigil_telemetry::{FileRotation, LogConfig, LogFormat};

/// Convert the `[logging]` section to a [`LogConfig`].
///
/// Unknown format names fall back to compact output; the config loader has
/// already rejected them, so this only matters for hand-built configs.
pub(crate) fn to_log_config(cfg: &Config) -> LogConfig {
    let format = cfg
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or(LogFormat::Compact);

    let mut log_config = LogConfig::new(&cfg.logging.level)
        .with_format(format)
        .with_directives(cfg.logging.directives.iter().cloned());

    if let Some(directory) = &cfg.logging.directory {
        log_config = log_config.with_file_logging(directory, FileRotation::Daily);
    }

    log_config
}

/// Convert the `[confirmation]` section to engine [`Settings`].
pub(crate) fn to_settings(cfg: &Config) -> Result<Settings> {
    Settings::try_from(&cfg.confirmation).context("invalid [confirmation] section")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{Category, CategorySetting, ConfirmationMode};
    use vigil_telemetry::LogTarget;

    #[test]
    fn test_log_config_from_section() {
        let cfg = Config::from_toml_str(
            r#"
            [logging]
            level = "debug"
            format = "json"
            directives = ["vigil_approval=trace"]
            "#,
        )
        .unwrap();

        let log = to_log_config(&cfg);
        assert_eq!(log.level, "debug");
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.directives, vec!["vigil_approval=trace".to_owned()]);
        assert_eq!(log.target, LogTarget::Stderr);
    }

    #[test]
    fn test_log_directory_enables_file_target() {
        let cfg = Config::from_toml_str(
            r#"
            [logging]
            directory = "/var/log/vigil"
            "#,
        )
        .unwrap();
        assert!(matches!(to_log_config(&cfg).target, LogTarget::File(_)));
    }

    #[test]
    fn test_settings_from_section() {
        let cfg = Config::from_toml_str(
            r#"
            [confirmation]
            default_mode = "preventive"
            confirmation_timeout_seconds = 30

            [confirmation.categories]
            socialActions = "auto"
            "#,
        )
        .unwrap();

        let settings = to_settings(&cfg).unwrap();
        assert_eq!(settings.default_mode, ConfirmationMode::Preventive);
        assert_eq!(settings.confirmation_timeout_seconds, 30);
        assert_eq!(
            settings.category_setting(&Category::Social),
            CategorySetting::Auto
        );
    }
}
