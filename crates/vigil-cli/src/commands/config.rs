//! CLI handlers for the `vigil config` subcommand.

use std::path::Path;

use anyhow::{Context, Result};
use vigil_config::{Config, ShowFormat};

use crate::config_bridge;
use crate::theme::Theme;

/// Show the resolved configuration with source annotations.
pub(crate) fn show_config(explicit: Option<&Path>, format: &str) -> Result<()> {
    let resolved = Config::load(explicit)?;

    let show_format = match format {
        "json" => ShowFormat::Json,
        "toml" => ShowFormat::Toml,
        other => anyhow::bail!("unknown format '{other}' (expected toml or json)"),
    };

    let output = resolved
        .show(show_format)
        .map_err(|e| anyhow::anyhow!("failed to format config: {e}"))?;

    println!("{output}");
    Ok(())
}

/// Validate the layered configuration, or a single file with `--file`.
pub(crate) fn validate_config(explicit: Option<&Path>, file: Option<&Path>) -> Result<()> {
    let (config, loaded_files) = match file {
        Some(path) => {
            let config = Config::load_file(path)
                .with_context(|| format!("{} is not a valid configuration", path.display()))?;
            (config, vec![path.display().to_string()])
        },
        None => {
            let resolved = Config::load(explicit)?;
            (resolved.config, resolved.loaded_files)
        },
    };

    // The engine bridge is stricter than the loader about category names.
    if let Err(e) = config_bridge::to_settings(&config) {
        eprintln!("{}", Theme::error(&format!("{e:#}")));
        std::process::exit(1);
    }

    println!("{}", Theme::success("Configuration is valid."));
    if loaded_files.is_empty() {
        println!("{}", Theme::dimmed("Using built-in defaults only."));
    } else {
        println!("\nLoaded files:");
        for path in &loaded_files {
            println!("  - {path}");
        }
    }
    Ok(())
}
