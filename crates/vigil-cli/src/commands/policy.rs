//! CLI handler for `vigil policy matrix`.

use std::path::Path;

use anyhow::{Context, Result};
use vigil_approval::{PolicyDecision, SessionPreferences, Settings, ToolCandidate, decide};
use vigil_config::Config;
use vigil_core::{Category, ConfirmationMode, Sensitivity};

use crate::config_bridge;
use crate::theme::Theme;

const CELL_WIDTH: usize = 10;

/// One row of the matrix: a mode and its decision per sensitivity.
type MatrixRow = (ConfirmationMode, Vec<(Sensitivity, PolicyDecision)>);

/// Evaluate every mode against every sensitivity for `category`, keeping the
/// category override from `settings`.
fn matrix(settings: &Settings, category: &Category) -> Vec<MatrixRow> {
    let prefs = SessionPreferences::default();
    ConfirmationMode::ALL
        .into_iter()
        .map(|mode| {
            let settings = Settings {
                default_mode: mode,
                ..settings.clone()
            };
            let row = Sensitivity::ALL
                .into_iter()
                .map(|sensitivity| {
                    let candidate = ToolCandidate::new("tool", category.clone(), sensitivity);
                    (sensitivity, decide(&candidate, &settings, &prefs))
                })
                .collect();
            (mode, row)
        })
        .collect()
}

/// Print the mode x sensitivity matrix.
pub(crate) fn show_matrix(explicit: Option<&Path>, category: Option<&str>) -> Result<()> {
    let resolved = Config::load(explicit)?;
    let mut settings = config_bridge::to_settings(&resolved.config)?;

    let (category, label) = match category {
        Some(name) => {
            let category: Category = name
                .parse()
                .with_context(|| format!("invalid category '{name}'"))?;
            let label = format!(
                "category {category} (override: {})",
                settings.category_setting(&category)
            );
            (category, label)
        },
        None => {
            settings.per_category.clear();
            (Category::Data, "categories without an override".to_owned())
        },
    };

    println!("{}", Theme::header(&format!("Policy matrix: {label}")));
    println!("{}", Theme::separator());

    let mut header = format!("{:CELL_WIDTH$}", "mode");
    for sensitivity in Sensitivity::ALL {
        header.push_str(&format!("{:CELL_WIDTH$}", sensitivity.as_str()));
    }
    println!("{}", Theme::dimmed(&header));

    for (mode, row) in matrix(&settings, &category) {
        let marker = if mode == settings.default_mode { "*" } else { " " };
        let mut line = format!("{:width$}{marker}", mode.as_str(), width = CELL_WIDTH.saturating_sub(1));
        for (_, decision) in row {
            line.push_str(&Theme::decision(decision, CELL_WIDTH));
        }
        println!("{line}");
    }

    println!("{}", Theme::separator());
    println!(
        "{}",
        Theme::dimmed("* configured default mode. critical always confirms.")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::CategorySetting;

    fn confirms(row: &[(Sensitivity, PolicyDecision)]) -> Vec<bool> {
        row.iter().map(|(_, d)| d.requires_confirmation()).collect()
    }

    #[test]
    fn test_matrix_without_override() {
        let rows = matrix(&Settings::default(), &Category::Data);
        assert_eq!(rows.len(), 3);
        for (mode, row) in &rows {
            let expected = match mode {
                ConfirmationMode::Preventive => vec![true, true, true, true],
                ConfirmationMode::Auto => vec![false, false, false, true],
                ConfirmationMode::Hybrid => vec![false, false, true, true],
            };
            assert_eq!(confirms(row), expected, "mode={mode}");
        }
    }

    #[test]
    fn test_matrix_with_auto_override() {
        let mut settings = Settings::default();
        settings
            .per_category
            .insert(Category::Calendar, CategorySetting::Auto);
        for (_, row) in matrix(&settings, &Category::Calendar) {
            assert_eq!(confirms(&row), vec![false, false, false, true]);
        }
    }
}
