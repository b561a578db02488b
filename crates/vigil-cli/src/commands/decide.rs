//! CLI handler for `vigil decide`.

use std::path::Path;

use anyhow::{Context, Result};
use vigil_approval::{PolicyDecision, SessionPreferences, ToolCandidate, decide};
use vigil_config::Config;
use vigil_core::{Category, Sensitivity};

use crate::config_bridge;
use crate::theme::Theme;

/// Parse the command-line arguments into a candidate.
fn candidate(tool: &str, category: &str, sensitivity: &str) -> Result<ToolCandidate> {
    let category: Category = category
        .parse()
        .with_context(|| format!("invalid category '{category}'"))?;
    let sensitivity: Sensitivity = sensitivity
        .parse()
        .with_context(|| format!("invalid sensitivity '{sensitivity}'"))?;
    Ok(ToolCandidate::new(tool, category, sensitivity))
}

/// Dry-run policy for one tool call against the resolved settings.
///
/// Session preferences are empty: the CLI has no session.
pub(crate) fn run_decide(
    explicit: Option<&Path>,
    tool: &str,
    category: &str,
    sensitivity: &str,
    json: bool,
) -> Result<()> {
    let resolved = Config::load(explicit)?;
    let settings = config_bridge::to_settings(&resolved.config)?;
    let candidate = candidate(tool, category, sensitivity)?;
    let decision = decide(&candidate, &settings, &SessionPreferences::default());
    tracing::debug!(tool, decision = ?decision, "dry-run policy decision");

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    println!("{}", Theme::header("Policy decision"));
    println!("{}", Theme::separator());
    println!("  tool:        {}", candidate.tool_name);
    println!("  category:    {}", candidate.category);
    println!(
        "  sensitivity: {}",
        Theme::sensitivity(candidate.sensitivity)
    );
    println!("  mode:        {}", settings.default_mode);
    println!(
        "  override:    {}",
        settings.category_setting(&candidate.category)
    );
    println!("{}", Theme::separator());
    let verdict = match decision {
        PolicyDecision::AutoExecute(_) => "runs immediately",
        PolicyDecision::RequireConfirmation(_) => "waits for confirmation",
    };
    println!(
        "  {} {verdict} {}",
        Theme::decision(decision, 7),
        Theme::dimmed(&format!("(rule: {})", decision.rule()))
    );
    Ok(())
}
