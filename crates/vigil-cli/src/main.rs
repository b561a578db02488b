//! Vigil CLI - inspect configuration and dry-run confirmation policy.
//!
//! The CLI never queues or resolves actions; it loads the layered
//! configuration, builds the engine settings from it, and shows what the
//! policy would decide.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config_bridge;
mod theme;

use commands::{config, decide, policy};

/// Vigil - human-in-the-loop gate for agent tool calls
#[derive(Parser)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Extra configuration file layered above the user config
    #[arg(short, long, global = true, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// View and validate configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show what policy decides for one tool call
    Decide {
        /// Tool name
        #[arg(short, long)]
        tool: String,

        /// Tool category (`email`, `finance`, a legacy `emailActions` key or a custom name)
        #[arg(short, long)]
        category: String,

        /// Sensitivity: low, medium, high or critical
        #[arg(short, long)]
        sensitivity: String,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect the confirmation policy
    Policy {
        #[command(subcommand)]
        command: PolicyCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration with the layer each value came from
    Show {
        /// Output format (toml, json)
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
    /// Validate configuration
    Validate {
        /// Validate only this file, without layering
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PolicyCommands {
    /// Print mode x sensitivity decisions for a category
    Matrix {
        /// Category to evaluate (default: one without an override)
        #[arg(short, long)]
        category: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging from config, with --verbose override.
    let loaded = vigil_config::Config::load(cli.config.as_deref()).ok();
    let mut log_config = match &loaded {
        Some(resolved) => config_bridge::to_log_config(&resolved.config),
        None => vigil_telemetry::LogConfig::new("warn"),
    };
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = vigil_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Show { format } => config::show_config(cli.config.as_deref(), &format),
            ConfigCommands::Validate { file } => {
                config::validate_config(cli.config.as_deref(), file.as_deref())
            },
        },
        Commands::Decide {
            tool,
            category,
            sensitivity,
            json,
        } => decide::run_decide(cli.config.as_deref(), &tool, &category, &sensitivity, json),
        Commands::Policy { command } => match command {
            PolicyCommands::Matrix { category } => {
                policy::show_matrix(cli.config.as_deref(), category.as_deref())
            },
        },
    }
}
