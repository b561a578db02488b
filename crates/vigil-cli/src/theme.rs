//! CLI theme and styling.

use colored::Colorize;
use vigil_approval::PolicyDecision;
use vigil_core::Sensitivity;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "━".repeat(50).dimmed().to_string()
    }

    /// Color a sensitivity by risk.
    pub(crate) fn sensitivity(sensitivity: Sensitivity) -> String {
        let name = sensitivity.as_str();
        match sensitivity {
            Sensitivity::Low => name.green().to_string(),
            Sensitivity::Medium => name.yellow().to_string(),
            Sensitivity::High => name.red().to_string(),
            Sensitivity::Critical => name.red().bold().to_string(),
        }
    }

    /// Short colored label for a decision, padded to `width`.
    pub(crate) fn decision(decision: PolicyDecision, width: usize) -> String {
        match decision {
            PolicyDecision::AutoExecute(_) => format!("{:width$}", "auto").green().to_string(),
            PolicyDecision::RequireConfirmation(_) => {
                format!("{:width$}", "confirm").yellow().to_string()
            },
        }
    }
}
