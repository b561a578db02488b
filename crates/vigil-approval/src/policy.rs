//! Policy resolution: does a tool call run now or wait for a human?
//!
//! [`decide`] is a pure function over a settings snapshot and a session
//! preference snapshot. It evaluates, in order:
//!
//! 1. **Critical sensitivity** always requires confirmation. Nothing overrides
//!    this: not the mode, not a category override, not a session preference.
//! 2. A **session preference** covering the category (bulk approval) or the
//!    exact `(category, tool)` pair (remember choice) auto-executes.
//! 3. The **category setting** (`always_confirm` / `auto`), unless it is
//!    `inherit`.
//! 4. The **default mode**: `preventive` confirms, `auto` runs, `hybrid`
//!    confirms `high` and runs `low`/`medium`.
//!
//! The returned [`PolicyDecision`] names the [`PolicyRule`] that fired.

use std::fmt;

use serde::{Deserialize, Serialize};
use vigil_core::{CategorySetting, ConfirmationMode};

use crate::action::ToolCandidate;
use crate::session::{PreferenceScope, SessionPreferences};
use crate::settings::Settings;

/// The rule that produced a policy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyRule {
    /// Sensitivity is `critical`.
    CriticalSensitivity,
    /// The category was bulk-approved this session.
    SessionCategory,
    /// This tool was remembered as approved this session.
    SessionTool,
    /// The category is set to `always_confirm`.
    CategoryAlwaysConfirm,
    /// The category is set to `auto`.
    CategoryAuto,
    /// The default mode is `preventive`.
    ModePreventive,
    /// The default mode is `auto`.
    ModeAuto,
    /// The default mode is `hybrid`; the sensitivity decided.
    ModeHybrid,
}

impl PolicyRule {
    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CriticalSensitivity => "critical_sensitivity",
            Self::SessionCategory => "session_category",
            Self::SessionTool => "session_tool",
            Self::CategoryAlwaysConfirm => "category_always_confirm",
            Self::CategoryAuto => "category_auto",
            Self::ModePreventive => "mode_preventive",
            Self::ModeAuto => "mode_auto",
            Self::ModeHybrid => "mode_hybrid",
        }
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of policy resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "rule", rename_all = "snake_case")]
pub enum PolicyDecision {
    /// Run immediately, no pending action is created.
    AutoExecute(PolicyRule),
    /// Queue for a human decision.
    RequireConfirmation(PolicyRule),
}

impl PolicyDecision {
    /// The rule that fired.
    #[must_use]
    pub fn rule(self) -> PolicyRule {
        match self {
            Self::AutoExecute(rule) | Self::RequireConfirmation(rule) => rule,
        }
    }

    /// Whether the call must wait for a human.
    #[must_use]
    pub fn requires_confirmation(self) -> bool {
        matches!(self, Self::RequireConfirmation(_))
    }
}

/// Decide whether `candidate` runs now or waits for confirmation.
#[must_use]
pub fn decide(
    candidate: &ToolCandidate,
    settings: &Settings,
    session: &SessionPreferences,
) -> PolicyDecision {
    if candidate.sensitivity.is_critical() {
        return PolicyDecision::RequireConfirmation(PolicyRule::CriticalSensitivity);
    }

    match session.covers(&candidate.category, &candidate.tool_name) {
        Some(PreferenceScope::Category) => {
            return PolicyDecision::AutoExecute(PolicyRule::SessionCategory);
        },
        Some(PreferenceScope::Tool) => {
            return PolicyDecision::AutoExecute(PolicyRule::SessionTool);
        },
        None => {},
    }

    match settings.category_setting(&candidate.category) {
        CategorySetting::AlwaysConfirm => {
            PolicyDecision::RequireConfirmation(PolicyRule::CategoryAlwaysConfirm)
        },
        CategorySetting::Auto => PolicyDecision::AutoExecute(PolicyRule::CategoryAuto),
        CategorySetting::Inherit => match settings.default_mode {
            ConfirmationMode::Preventive => {
                PolicyDecision::RequireConfirmation(PolicyRule::ModePreventive)
            },
            ConfirmationMode::Auto => PolicyDecision::AutoExecute(PolicyRule::ModeAuto),
            ConfirmationMode::Hybrid if candidate.sensitivity.confirms_in_hybrid() => {
                PolicyDecision::RequireConfirmation(PolicyRule::ModeHybrid)
            },
            ConfirmationMode::Hybrid => PolicyDecision::AutoExecute(PolicyRule::ModeHybrid),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{Category, Sensitivity};

    fn candidate(category: Category, sensitivity: Sensitivity) -> ToolCandidate {
        ToolCandidate::new("send_email", category, sensitivity)
    }

    fn settings(mode: ConfirmationMode) -> Settings {
        Settings {
            default_mode: mode,
            ..Settings::default()
        }
    }

    #[test]
    fn test_hybrid_inherit() {
        let s = settings(ConfirmationMode::Hybrid);
        let prefs = SessionPreferences::default();

        let high = decide(&candidate(Category::Email, Sensitivity::High), &s, &prefs);
        assert_eq!(high, PolicyDecision::RequireConfirmation(PolicyRule::ModeHybrid));

        for sensitivity in [Sensitivity::Low, Sensitivity::Medium] {
            let d = decide(&candidate(Category::Email, sensitivity), &s, &prefs);
            assert_eq!(d, PolicyDecision::AutoExecute(PolicyRule::ModeHybrid));
        }
    }

    #[test]
    fn test_preventive_confirms_low() {
        let d = decide(
            &candidate(Category::Data, Sensitivity::Low),
            &settings(ConfirmationMode::Preventive),
            &SessionPreferences::default(),
        );
        assert_eq!(d, PolicyDecision::RequireConfirmation(PolicyRule::ModePreventive));
    }

    #[test]
    fn test_auto_mode_runs_high() {
        let d = decide(
            &candidate(Category::Data, Sensitivity::High),
            &settings(ConfirmationMode::Auto),
            &SessionPreferences::default(),
        );
        assert_eq!(d, PolicyDecision::AutoExecute(PolicyRule::ModeAuto));
    }

    #[test]
    fn test_category_override_beats_mode() {
        let mut s = settings(ConfirmationMode::Auto);
        s.per_category
            .insert(Category::Finance, CategorySetting::AlwaysConfirm);
        s.per_category.insert(Category::Calendar, CategorySetting::Auto);
        let prefs = SessionPreferences::default();

        let finance = decide(&candidate(Category::Finance, Sensitivity::Low), &s, &prefs);
        assert_eq!(
            finance,
            PolicyDecision::RequireConfirmation(PolicyRule::CategoryAlwaysConfirm)
        );

        s.default_mode = ConfirmationMode::Preventive;
        let calendar = decide(&candidate(Category::Calendar, Sensitivity::High), &s, &prefs);
        assert_eq!(calendar, PolicyDecision::AutoExecute(PolicyRule::CategoryAuto));
    }

    #[test]
    fn test_session_preferences() {
        let s = settings(ConfirmationMode::Preventive);
        let mut prefs = SessionPreferences::default();
        prefs.insert_tool(Category::Email, "send_email");
        prefs.insert_category(Category::Social);

        let tool = decide(&candidate(Category::Email, Sensitivity::High), &s, &prefs);
        assert_eq!(tool, PolicyDecision::AutoExecute(PolicyRule::SessionTool));

        let other_tool = decide(
            &ToolCandidate::new("delete_email", Category::Email, Sensitivity::High),
            &s,
            &prefs,
        );
        assert!(other_tool.requires_confirmation());

        let social = decide(&candidate(Category::Social, Sensitivity::Medium), &s, &prefs);
        assert_eq!(social, PolicyDecision::AutoExecute(PolicyRule::SessionCategory));
    }

    #[test]
    fn test_critical_never_auto_executes() {
        let mut prefs = SessionPreferences::default();
        prefs.insert_category(Category::Finance);
        prefs.insert_tool(Category::Finance, "send_email");

        for mode in ConfirmationMode::ALL {
            for setting in CategorySetting::ALL {
                let mut s = settings(mode);
                s.per_category.insert(Category::Finance, setting);
                let d = decide(&candidate(Category::Finance, Sensitivity::Critical), &s, &prefs);
                assert_eq!(
                    d,
                    PolicyDecision::RequireConfirmation(PolicyRule::CriticalSensitivity),
                    "mode={mode} setting={setting}"
                );
            }
        }
    }

    #[test]
    fn test_decision_serialization() {
        let json =
            serde_json::to_value(PolicyDecision::AutoExecute(PolicyRule::CategoryAuto)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"decision": "auto_execute", "rule": "category_auto"})
        );
    }
}
