//! Engine settings and the store that owns them.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vigil_config::ConfirmationSection;
use vigil_config::validate::MAX_CONFIRMATION_TIMEOUT_SECONDS;
use vigil_core::{Category, CategorySetting, ConfirmationMode};

use crate::error::{EngineError, EngineResult};

/// Default confirmation timeout (5 minutes).
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// Global confirmation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Mode used by categories set to `inherit`.
    pub default_mode: ConfirmationMode,
    /// Per-category overrides. Missing categories inherit.
    #[serde(default)]
    pub per_category: BTreeMap<Category, CategorySetting>,
    /// Seconds before an undecided action times out; 0 disables timeouts.
    pub confirmation_timeout_seconds: u64,
    /// Whether `bulk_approval` and bulk resolution are accepted.
    pub allow_bulk_actions: bool,
    /// Whether `remember_choice`/`bulk_approval` write session preferences.
    pub remember_preferences: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_mode: ConfirmationMode::Hybrid,
            per_category: BTreeMap::new(),
            confirmation_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            allow_bulk_actions: true,
            remember_preferences: true,
        }
    }
}

impl Settings {
    /// The effective setting for a category (`inherit` when not overridden).
    #[must_use]
    pub fn category_setting(&self, category: &Category) -> CategorySetting {
        self.per_category
            .get(category)
            .copied()
            .unwrap_or_default()
    }

    /// The timeout as a duration, or `None` when disabled.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.confirmation_timeout_seconds > 0)
            .then(|| Duration::from_secs(self.confirmation_timeout_seconds))
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSettings`] if the timeout exceeds 24 hours.
    pub fn validate(&self) -> EngineResult<()> {
        if self.confirmation_timeout_seconds > MAX_CONFIRMATION_TIMEOUT_SECONDS {
            return Err(EngineError::InvalidSettings(format!(
                "confirmation_timeout_seconds {} exceeds the maximum of {MAX_CONFIRMATION_TIMEOUT_SECONDS}",
                self.confirmation_timeout_seconds
            )));
        }
        Ok(())
    }

    /// Apply a patch, returning the patched copy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSettings`] if the result is out of range.
    pub fn patched(&self, patch: &SettingsPatch) -> EngineResult<Self> {
        let mut next = self.clone();
        if let Some(mode) = patch.default_mode {
            next.default_mode = mode;
        }
        if let Some(timeout) = patch.confirmation_timeout_seconds {
            next.confirmation_timeout_seconds = timeout;
        }
        if let Some(bulk) = patch.allow_bulk_actions {
            next.allow_bulk_actions = bulk;
        }
        if let Some(remember) = patch.remember_preferences {
            next.remember_preferences = remember;
        }
        for (category, setting) in &patch.per_category {
            if *setting == CategorySetting::Inherit {
                next.per_category.remove(category);
            } else {
                next.per_category.insert(category.clone(), *setting);
            }
        }
        next.validate()?;
        Ok(next)
    }
}

impl TryFrom<&ConfirmationSection> for Settings {
    type Error = EngineError;

    fn try_from(section: &ConfirmationSection) -> Result<Self, Self::Error> {
        let mut per_category = BTreeMap::new();
        for (name, value) in &section.categories {
            let setting: CategorySetting = value.parse()?;
            if setting != CategorySetting::Inherit {
                per_category.insert(name.parse::<Category>()?, setting);
            }
        }

        let settings = Self {
            default_mode: section.default_mode.parse()?,
            per_category,
            confirmation_timeout_seconds: section.confirmation_timeout_seconds,
            allow_bulk_actions: section.allow_bulk_actions,
            remember_preferences: section.remember_preferences,
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// A partial settings update. `None` fields are left unchanged.
///
/// `per_category` entries are merged; an `inherit` entry removes the override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    /// New default mode.
    #[serde(default)]
    pub default_mode: Option<ConfirmationMode>,
    /// Category overrides to set or (with `inherit`) clear.
    #[serde(default)]
    pub per_category: BTreeMap<Category, CategorySetting>,
    /// New timeout. Does not re-arm timers of already-queued actions.
    #[serde(default)]
    pub confirmation_timeout_seconds: Option<u64>,
    /// New bulk-actions switch.
    #[serde(default)]
    pub allow_bulk_actions: Option<bool>,
    /// New remember-preferences switch.
    #[serde(default)]
    pub remember_preferences: Option<bool>,
}

impl SettingsPatch {
    /// Set the default mode.
    #[must_use]
    pub fn default_mode(mut self, mode: ConfirmationMode) -> Self {
        self.default_mode = Some(mode);
        self
    }

    /// Set or clear one category override.
    #[must_use]
    pub fn category(mut self, category: Category, setting: CategorySetting) -> Self {
        self.per_category.insert(category, setting);
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.confirmation_timeout_seconds = Some(seconds);
        self
    }

    /// Set the bulk-actions switch.
    #[must_use]
    pub fn allow_bulk_actions(mut self, allow: bool) -> Self {
        self.allow_bulk_actions = Some(allow);
        self
    }

    /// Set the remember-preferences switch.
    #[must_use]
    pub fn remember_preferences(mut self, remember: bool) -> Self {
        self.remember_preferences = Some(remember);
        self
    }
}

/// Owner of the live settings. Only [`SettingsStore::update`] mutates them.
#[derive(Debug)]
pub struct SettingsStore {
    inner: RwLock<Settings>,
}

impl SettingsStore {
    /// Create a store holding `settings`.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    /// Copy of the current settings.
    #[must_use]
    pub fn snapshot(&self) -> Settings {
        self.inner
            .read()
            .unwrap_or_else(|e| {
                tracing::warn!("SettingsStore read lock poisoned, recovering");
                e.into_inner()
            })
            .clone()
    }

    /// Apply a patch atomically and return the new settings.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSettings`] if the patched settings are
    /// out of range; the stored settings are then unchanged.
    pub fn update(&self, patch: &SettingsPatch) -> EngineResult<Settings> {
        let mut guard = self.inner.write().unwrap_or_else(|e| {
            tracing::warn!("SettingsStore lock poisoned, recovering");
            e.into_inner()
        });
        let next = guard.patched(patch)?;
        guard.clone_from(&next);
        Ok(next)
    }
}
