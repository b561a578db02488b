//! Tool-call candidates and the pending actions created from them.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use vigil_core::{ActionId, Category, Parameters, Sensitivity, Timestamp};

/// How a preview detail value should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailType {
    /// Plain text.
    Text,
    /// A number.
    Number,
    /// `true` / `false`.
    Boolean,
    /// An email address.
    Email,
    /// A link.
    Url,
    /// A nested JSON value, pre-rendered.
    Json,
}

/// One labelled row of a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewDetail {
    /// Row label.
    pub label: String,
    /// Rendered value.
    pub value: String,
    /// Rendering hint.
    #[serde(rename = "type")]
    pub detail_type: DetailType,
}

/// What a human sees when asked to confirm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    /// Short headline.
    pub title: String,
    /// One-sentence description.
    pub summary: String,
    /// Labelled rows.
    #[serde(default)]
    pub details: Vec<PreviewDetail>,
    /// Warnings shown prominently.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Preview {
    /// Create a preview with a title and summary.
    #[must_use]
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            details: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add a detail row.
    #[must_use]
    pub fn with_detail(
        mut self,
        label: impl Into<String>,
        value: impl Into<String>,
        detail_type: DetailType,
    ) -> Self {
        self.details.push(PreviewDetail {
            label: label.into(),
            value: value.into(),
            detail_type,
        });
        self
    }

    /// Add a warning unless an identical one is present.
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        let warning = warning.into();
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
        self
    }
}

/// A tool call an agent wants to make.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCandidate {
    /// Tool name.
    pub tool_name: String,
    /// Functional group of the tool.
    pub category: Category,
    /// Risk tier.
    pub sensitivity: Sensitivity,
    /// Call arguments.
    #[serde(default)]
    pub parameters: Parameters,
    /// Caller-built preview; a default one is derived when absent.
    #[serde(default)]
    pub preview: Option<Preview>,
    /// Whether the effect can be undone afterwards.
    #[serde(default)]
    pub undoable: bool,
    /// Whether a human may edit the parameters before approving.
    #[serde(default)]
    pub editable: bool,
    /// How long the tool is expected to run.
    #[serde(default)]
    pub estimated_duration: Option<Duration>,
}

impl ToolCandidate {
    /// Create a candidate with no parameters.
    #[must_use]
    pub fn new(tool_name: impl Into<String>, category: Category, sensitivity: Sensitivity) -> Self {
        Self {
            tool_name: tool_name.into(),
            category,
            sensitivity,
            parameters: Parameters::new(),
            preview: None,
            undoable: false,
            editable: false,
            estimated_duration: None,
        }
    }

    /// Set the call arguments.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Add one call argument.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Supply a preview.
    #[must_use]
    pub fn with_preview(mut self, preview: Preview) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Mark as undoable.
    #[must_use]
    pub fn undoable(mut self) -> Self {
        self.undoable = true;
        self
    }

    /// Mark as editable.
    #[must_use]
    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    /// Set the expected run time.
    #[must_use]
    pub fn with_estimated_duration(mut self, duration: Duration) -> Self {
        self.estimated_duration = Some(duration);
        self
    }
}

/// A queued tool call awaiting a human decision.
///
/// Created only when policy requires confirmation. Never mutated; removed
/// exactly once by resolution, timeout or supersession.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    /// Unique id.
    pub id: ActionId,
    /// Tool name.
    pub tool_name: String,
    /// Functional group of the tool.
    pub category: Category,
    /// Risk tier.
    pub sensitivity: Sensitivity,
    /// Original call arguments.
    pub parameters: Parameters,
    /// What the human is shown.
    pub preview: Preview,
    /// Whether the effect can be undone afterwards.
    pub undoable: bool,
    /// Whether `edit` is allowed.
    pub editable: bool,
    /// How long the tool is expected to run.
    pub estimated_duration: Option<Duration>,
    /// When it was queued.
    pub created_at: Timestamp,
    /// When it times out; `None` when timeouts are disabled.
    pub expires_at: Option<Timestamp>,
}

impl PendingAction {
    pub(crate) fn from_candidate(
        id: ActionId,
        candidate: ToolCandidate,
        preview: Preview,
        created_at: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Self {
        Self {
            id,
            tool_name: candidate.tool_name,
            category: candidate.category,
            sensitivity: candidate.sensitivity,
            parameters: candidate.parameters,
            preview,
            undoable: candidate.undoable,
            editable: candidate.editable,
            estimated_duration: candidate.estimated_duration,
            created_at,
            expires_at,
        }
    }
}
