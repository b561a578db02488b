//! Common types used throughout Vigil.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// Unique identifier for a pending action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub Uuid);

impl ActionId {
    /// Create a new random action ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an action ID from a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action:{}", self.0)
    }
}

/// Unique identifier for a confirmation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

/// Timestamp wrapper for consistent handling throughout Vigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// Get the current timestamp.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Return this timestamp shifted forward by `secs` seconds.
    ///
    /// Returns `None` if the result is not representable.
    #[must_use]
    pub fn plus_seconds(&self, secs: u64) -> Option<Self> {
        let secs = i64::try_from(secs).ok()?;
        let delta = chrono::TimeDelta::try_seconds(secs)?;
        self.0.checked_add_signed(delta).map(Self)
    }

    /// Check if this timestamp is in the past.
    #[must_use]
    pub fn is_past(&self) -> bool {
        self.0 < Utc::now()
    }

    /// Check if this timestamp is in the future.
    #[must_use]
    pub fn is_future(&self) -> bool {
        self.0 > Utc::now()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

/// Risk tier of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    /// Read-only or trivially reversible.
    Low,
    /// Visible side effects that are easy to undo.
    Medium,
    /// Side effects that are hard to undo or visible to others.
    High,
    /// Irreversible or high-stakes. Always confirmed.
    Critical,
}

impl Sensitivity {
    /// All tiers, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Whether `hybrid` mode asks a human before running a call of this tier.
    #[must_use]
    pub fn confirms_in_hybrid(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    /// Whether this tier overrides every mode and preference.
    #[must_use]
    pub fn is_critical(self) -> bool {
        matches!(self, Self::Critical)
    }

    /// Stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sensitivity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(CoreError::UnknownSensitivity(s.to_owned())),
        }
    }
}

/// Global confirmation policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMode {
    /// Every sensitive call waits for a human.
    Preventive,
    /// Calls run without asking (critical calls still confirm).
    Auto,
    /// Confirm only high and critical calls.
    #[default]
    Hybrid,
}

impl ConfirmationMode {
    /// All modes.
    pub const ALL: [Self; 3] = [Self::Preventive, Self::Auto, Self::Hybrid];

    /// Stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preventive => "preventive",
            Self::Auto => "auto",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for ConfirmationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfirmationMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preventive" => Ok(Self::Preventive),
            "auto" => Ok(Self::Auto),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(CoreError::UnknownMode(s.to_owned())),
        }
    }
}

/// Per-category override of the global mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySetting {
    /// Always ask, whatever the global mode says.
    AlwaysConfirm,
    /// Never ask (critical calls still confirm).
    Auto,
    /// Use the global mode.
    #[default]
    Inherit,
}

impl CategorySetting {
    /// All settings.
    pub const ALL: [Self; 3] = [Self::AlwaysConfirm, Self::Auto, Self::Inherit];

    /// Stable snake-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlwaysConfirm => "always_confirm",
            Self::Auto => "auto",
            Self::Inherit => "inherit",
        }
    }
}

impl fmt::Display for CategorySetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategorySetting {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always_confirm" | "always-confirm" | "alwaysconfirm" => Ok(Self::AlwaysConfirm),
            "auto" => Ok(Self::Auto),
            "inherit" => Ok(Self::Inherit),
            _ => Err(CoreError::UnknownCategorySetting(s.to_owned())),
        }
    }
}

/// Functional grouping of tools.
///
/// The built-in variants cover the product's tool families. Any other name
/// parses to [`Category::Custom`], so new tool families need no policy changes.
/// Serialized as a plain string (`"email"`, `"my_crm"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    /// Sending, drafting and deleting mail.
    Email,
    /// Creating or changing calendar events.
    Calendar,
    /// File system and document operations.
    File,
    /// Posting to social networks.
    Social,
    /// Payments and other money movement.
    Finance,
    /// Database and dataset operations.
    Data,
    /// A category registered by an integration. Built only through
    /// [`Category::custom`] or parsing, so it never shadows a built-in name.
    Custom(CustomCategory),
}

/// Validated name of a non-built-in category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomCategory(String);

impl CustomCategory {
    fn new(name: &str) -> Result<Self, CoreError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(CoreError::InvalidCategory(name.to_owned()));
        }
        Ok(Self(name.to_owned()))
    }

    /// The registered name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Category {
    /// Built-in categories.
    pub const BUILTIN: [Self; 6] = [
        Self::Email,
        Self::Calendar,
        Self::File,
        Self::Social,
        Self::Finance,
        Self::Data,
    ];

    /// Register a custom category. A built-in name (`"email"`,
    /// `"financialActions"`) yields the built-in variant.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCategory`] if the name is empty or contains
    /// characters outside `[A-Za-z0-9_.-]`.
    pub fn custom(name: impl AsRef<str>) -> Result<Self, CoreError> {
        name.as_ref().parse()
    }

    /// Stable name used in settings and audit entries.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Email => "email",
            Self::Calendar => "calendar",
            Self::File => "file",
            Self::Social => "social",
            Self::Finance => "finance",
            Self::Data => "data",
            Self::Custom(name) => name.as_str(),
        }
    }

    /// Whether this is one of the built-in categories.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Accept both the short names and the legacy `<name>Actions` keys.
        let base = trimmed.strip_suffix("Actions").unwrap_or(trimmed);
        match base.to_ascii_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "calendar" => Ok(Self::Calendar),
            "file" => Ok(Self::File),
            "social" => Ok(Self::Social),
            "finance" | "financial" => Ok(Self::Finance),
            "data" => Ok(Self::Data),
            _ => CustomCategory::new(trimmed).map(Self::Custom),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.name().to_owned()
    }
}
