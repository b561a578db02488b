//! Default previews for candidates that do not bring their own.

use serde_json::Value;
use vigil_core::{Parameters, Sensitivity};

use crate::action::{DetailType, Preview, ToolCandidate};

/// Longest rendered detail value, in characters.
const MAX_DETAIL_CHARS: usize = 200;

/// Warning added to every critical action.
pub const CRITICAL_WARNING: &str = "This is a critical action and always requires confirmation.";

/// Warning added to high-sensitivity actions that cannot be undone.
pub const IRREVERSIBLE_WARNING: &str = "This action cannot be undone.";

/// The preview shown for `candidate`.
///
/// A caller-supplied preview is kept as is apart from the sensitivity
/// warnings, which are always present.
#[must_use]
pub fn build_preview(candidate: &ToolCandidate) -> Preview {
    let preview = candidate
        .preview
        .clone()
        .unwrap_or_else(|| default_preview(&candidate.tool_name, &candidate.parameters));
    with_warnings(preview, candidate.sensitivity, candidate.undoable)
}

fn default_preview(tool_name: &str, parameters: &Parameters) -> Preview {
    let title = humanize(tool_name);
    let summary = match parameters.len() {
        0 => format!("Run {tool_name}"),
        1 => format!("Run {tool_name} with 1 parameter"),
        n => format!("Run {tool_name} with {n} parameters"),
    };

    parameters
        .iter()
        .fold(Preview::new(title, summary), |preview, (key, value)| {
            let (rendered, detail_type) = render(value);
            preview.with_detail(humanize(key), truncate(&rendered), detail_type)
        })
}

fn with_warnings(mut preview: Preview, sensitivity: Sensitivity, undoable: bool) -> Preview {
    if sensitivity.is_critical() {
        preview = preview.with_warning(CRITICAL_WARNING);
    }
    if sensitivity >= Sensitivity::High && !undoable {
        preview = preview.with_warning(IRREVERSIBLE_WARNING);
    }
    preview
}

/// `send_email` / `sendEmail` -> `Send email`.
fn humanize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '_' || c == '-' || c == '.' {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        out.extend(c.to_lowercase());
    }

    let trimmed = out.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name.to_owned(),
    }
}

fn render(value: &Value) -> (String, DetailType) {
    match value {
        Value::Bool(b) => (b.to_string(), DetailType::Boolean),
        Value::Number(n) => (n.to_string(), DetailType::Number),
        Value::String(s) => (s.clone(), guess_string_type(s)),
        Value::Null => ("null".to_owned(), DetailType::Text),
        Value::Array(_) | Value::Object(_) => (value.to_string(), DetailType::Json),
    }
}

fn guess_string_type(s: &str) -> DetailType {
    if s.starts_with("http://") || s.starts_with("https://") {
        return DetailType::Url;
    }
    let looks_like_email = !s.contains(char::is_whitespace)
        && s.split_once('@')
            .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
    if looks_like_email {
        DetailType::Email
    } else {
        DetailType::Text
    }
}

fn truncate(s: &str) -> String {
    match s.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((idx, _)) => {
            let mut cut = s.get(..idx).unwrap_or(s).to_owned();
            cut.push('…');
            cut
        },
        None => s.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vigil_core::Category;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("send_email"), "Send email");
        assert_eq!(humanize("createCalendarEvent"), "Create calendar event");
        assert_eq!(humanize("file.write"), "File write");
        assert_eq!(humanize("___"), "___");
    }

    #[test]
    fn test_default_preview_details() {
        let candidate = ToolCandidate::new("send_email", Category::Email, Sensitivity::Medium)
            .with_parameter("to", json!("alice@example.com"))
            .with_parameter("retries", json!(3))
            .with_parameter("link", json!("https://example.com/x"))
            .with_parameter("headers", json!({"x": 1}));

        let preview = build_preview(&candidate);
        assert_eq!(preview.title, "Send email");
        assert_eq!(preview.summary, "Run send_email with 4 parameters");
        assert!(preview.warnings.is_empty());

        let kind = |label: &str| {
            preview
                .details
                .iter()
                .find(|d| d.label == label)
                .map(|d| d.detail_type)
        };
        assert_eq!(kind("To"), Some(DetailType::Email));
        assert_eq!(kind("Retries"), Some(DetailType::Number));
        assert_eq!(kind("Link"), Some(DetailType::Url));
        assert_eq!(kind("Headers"), Some(DetailType::Json));
    }

    #[test]
    fn test_long_values_are_truncated_on_char_boundary() {
        let long = "é".repeat(500);
        let candidate = ToolCandidate::new("note", Category::Data, Sensitivity::Low)
            .with_parameter("body", json!(long));
        let preview = build_preview(&candidate);
        let value = &preview.details.first().unwrap().value;
        assert_eq!(value.chars().count(), MAX_DETAIL_CHARS.saturating_add(1));
        assert!(value.ends_with('…'));
    }

    #[test]
    fn test_critical_warning_added_to_supplied_preview() {
        let candidate = ToolCandidate::new("transfer", Category::Finance, Sensitivity::Critical)
            .with_preview(Preview::new("Transfer", "Move money").with_warning(CRITICAL_WARNING));
        let preview = build_preview(&candidate);
        assert_eq!(preview.title, "Transfer");
        assert_eq!(
            preview.warnings,
            vec![CRITICAL_WARNING.to_owned(), IRREVERSIBLE_WARNING.to_owned()]
        );
    }

    #[test]
    fn test_undoable_high_has_no_irreversible_warning() {
        let candidate =
            ToolCandidate::new("archive", Category::Email, Sensitivity::High).undoable();
        assert!(build_preview(&candidate).warnings.is_empty());
    }
}
