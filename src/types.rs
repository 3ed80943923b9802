//! Type-safe core types for the merge wizard
//!
//! This module replaces stringly-typed resource identifiers and categories
//! with proper Rust enums that provide compile-time validation and
//! exhaustive matching.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter, EnumString};

/// Reference to an application on the hosted platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRef {
    /// Platform-assigned application id
    pub id: u64,
    /// Display name shown in the wizard
    pub name: String,
}

impl AppRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for AppRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

/// Resource categories the wizard can merge
///
/// Each category owns one selection set. The wire names match the remote
/// service's tab identifiers (`screens`, `data-sources`, `files`, `settings`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ResourceCategory {
    Screens,
    DataSources,
    Files,
    Settings,
}

impl ResourceCategory {
    /// Returns all categories in tab order
    pub const fn all() -> &'static [Self] {
        &[Self::Screens, Self::DataSources, Self::Files, Self::Settings]
    }
}

/// Identifier of a mergeable resource.
///
/// Screens, data sources and files carry numeric platform ids; app-level
/// settings are addressed by string key. JSON payloads carry them untagged,
/// so `10` and `"date_format"` both deserialize to the right variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Num(u64),
    Key(String),
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        Self::Num(id)
    }
}

impl From<&str> for ResourceId {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(id) => write!(f, "{}", id),
            Self::Key(key) => write!(f, "{}", key),
        }
    }
}

/// Aggregate of the four selection sets, submitted for preview/execution.
///
/// This is the snapshot handed to the review and progress views. Field names
/// serialize camelCase to mirror the remote service contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeConfiguration {
    pub screens: Vec<ResourceId>,
    pub data_sources: Vec<ResourceId>,
    pub files: Vec<ResourceId>,
    pub configurations: Vec<ResourceId>,
}

impl MergeConfiguration {
    /// Returns the id list for one category
    pub fn category(&self, category: ResourceCategory) -> &[ResourceId] {
        match category {
            ResourceCategory::Screens => &self.screens,
            ResourceCategory::DataSources => &self.data_sources,
            ResourceCategory::Files => &self.files,
            ResourceCategory::Settings => &self.configurations,
        }
    }

    /// Total number of selected items across all categories
    pub fn total(&self) -> usize {
        self.screens.len() + self.data_sources.len() + self.files.len() + self.configurations.len()
    }

    /// Returns true if no category has any selection
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Per-item outcome reported by a merge preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MergeItemStatus {
    /// Item does not exist in the destination and will be created
    Copy,
    /// Item exists in the destination and will be replaced
    Overwrite,
    /// Item collides with destination content and needs attention
    Conflict,
}

/// Remote execution state of a started merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MergeRunState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl MergeRunState {
    /// Returns true if the merge has reached a terminal state
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}
