//! Store Configuration
//!
//! `DraftStoreConfig` carries the settings a `DraftStore` is built from. Values come
//! from `Default`, a JSON document, and environment overrides, in that order:
//!
//! - `DRAFTTREE_BRANCH` - default branch mode (`draft` or `published`)
//! - `DRAFTTREE_DIRECT_ONLY` - comma-separated direct-only categories

use crate::models::{
    BranchMode, CategoryRegistry, ValidationError, DEFAULT_DIRECT_ONLY_CATEGORIES,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable overriding the default branch mode
pub const BRANCH_ENV_VAR: &str = "DRAFTTREE_BRANCH";

/// Environment variable overriding the direct-only category list
pub const DIRECT_ONLY_ENV_VAR: &str = "DRAFTTREE_DIRECT_ONLY";

/// Broadcast channel capacity for domain events.
///
/// 128 leaves headroom for subtree operations that emit one event per document.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Fields whose values flow from ancestors to descendants
pub const DEFAULT_INHERITABLE_FIELDS: &[&str] = &[
    "start",
    "due",
    "graceperiod",
    "format",
    "graded",
    "visible_to_staff_only",
];

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(#[from] ValidationError),
}

/// Settings for a draft store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftStoreConfig {
    /// Branch mode of sessions created without an explicit mode
    pub default_branch: BranchMode,
    /// Categories that never have a draft revision
    pub direct_only_categories: Vec<String>,
    /// Fields propagated by the metadata inheritance cache
    pub inheritable_fields: Vec<String>,
    /// Capacity of the domain event broadcast channel
    pub event_channel_capacity: usize,
}

impl Default for DraftStoreConfig {
    fn default() -> Self {
        Self {
            default_branch: BranchMode::Published,
            direct_only_categories: DEFAULT_DIRECT_ONLY_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            inheritable_fields: DEFAULT_INHERITABLE_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl DraftStoreConfig {
    /// Parse a JSON document; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Apply `DRAFTTREE_BRANCH` / `DRAFTTREE_DIRECT_ONLY` overrides
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(
            std::env::var(BRANCH_ENV_VAR).ok(),
            std::env::var(DIRECT_ONLY_ENV_VAR).ok(),
        )
    }

    fn with_overrides(
        mut self,
        branch: Option<String>,
        direct_only: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(branch) = branch {
            self.default_branch = branch.parse()?;
        }
        if let Some(list) = direct_only {
            self.direct_only_categories = list
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(self)
    }

    pub fn with_default_branch(mut self, branch: BranchMode) -> Self {
        self.default_branch = branch;
        self
    }

    pub fn category_registry(&self) -> CategoryRegistry {
        CategoryRegistry::new(self.direct_only_categories.iter().cloned())
    }
}
