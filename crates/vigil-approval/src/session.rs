//! Session-scoped remembered approvals.
//!
//! Preferences are written only by approving resolutions that carry
//! `remember_choice` or `bulk_approval`, read only by policy resolution, and
//! dropped by `end_session`. They are never persisted.

use std::collections::{BTreeSet, HashSet};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use vigil_core::{Category, Timestamp};

/// How much a preference covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceScope {
    /// Every tool in the category (bulk approval).
    Category,
    /// One tool in the category (remember choice).
    Tool,
}

/// A remembered approval, as listed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPreference {
    /// Category the preference applies to.
    pub category: Category,
    /// Tool the preference applies to; `None` for the whole category.
    pub tool_name: Option<String>,
    /// When it was recorded.
    pub created_at: Timestamp,
}

impl SessionPreference {
    /// The scope implied by `tool_name`.
    #[must_use]
    pub fn scope(&self) -> PreferenceScope {
        if self.tool_name.is_some() {
            PreferenceScope::Tool
        } else {
            PreferenceScope::Category
        }
    }
}

/// Point-in-time copy of the session's preferences, used by policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPreferences {
    categories: HashSet<Category>,
    tools: HashSet<(Category, String)>,
}

impl SessionPreferences {
    /// Which preference (if any) covers a call. Category-wide wins.
    #[must_use]
    pub fn covers(&self, category: &Category, tool_name: &str) -> Option<PreferenceScope> {
        if self.categories.contains(category) {
            return Some(PreferenceScope::Category);
        }
        self.tools
            .iter()
            .any(|(c, t)| c == category && t == tool_name)
            .then_some(PreferenceScope::Tool)
    }

    /// Record a category-wide approval. Returns `false` if already present.
    pub fn insert_category(&mut self, category: Category) -> bool {
        self.categories.insert(category)
    }

    /// Record a single-tool approval. Returns `false` if already present.
    pub fn insert_tool(&mut self, category: Category, tool_name: impl Into<String>) -> bool {
        self.tools.insert((category, tool_name.into()))
    }

    /// Number of preferences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len().saturating_add(self.tools.len())
    }

    /// Whether there are none.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.tools.is_empty()
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    snapshot: SessionPreferences,
    listed: Vec<SessionPreference>,
}

/// Thread-safe holder of the current session's preferences.
#[derive(Debug, Default)]
pub struct SessionPreferenceStore {
    inner: RwLock<StoreInner>,
}

impl SessionPreferenceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(|e| {
            tracing::warn!("SessionPreferenceStore lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(|e| {
            tracing::warn!("SessionPreferenceStore read lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Remember a category-wide approval.
    pub fn remember_category(&self, category: Category) {
        let mut inner = self.write();
        if inner.snapshot.insert_category(category.clone()) {
            tracing::debug!(category = %category, "remembered category approval");
            inner.listed.push(SessionPreference {
                category,
                tool_name: None,
                created_at: Timestamp::now(),
            });
        }
    }

    /// Remember a single-tool approval.
    pub fn remember_tool(&self, category: Category, tool_name: &str) {
        let mut inner = self.write();
        if inner.snapshot.insert_tool(category.clone(), tool_name) {
            tracing::debug!(category = %category, tool = tool_name, "remembered tool approval");
            inner.listed.push(SessionPreference {
                category,
                tool_name: Some(tool_name.to_owned()),
                created_at: Timestamp::now(),
            });
        }
    }

    /// Copy of the current preferences.
    #[must_use]
    pub fn snapshot(&self) -> SessionPreferences {
        self.read().snapshot.clone()
    }

    /// Preferences in the order they were recorded.
    #[must_use]
    pub fn list(&self) -> Vec<SessionPreference> {
        self.read().listed.clone()
    }

    /// Categories with a category-wide approval, sorted.
    #[must_use]
    pub fn approved_categories(&self) -> BTreeSet<Category> {
        self.read().snapshot.categories.iter().cloned().collect()
    }

    /// Drop everything. Returns how many preferences were removed.
    pub fn clear(&self) -> usize {
        let mut inner = self.write();
        let count = inner.snapshot.len();
        *inner = StoreInner::default();
        count
    }
}
