//! Merge plan file handling for saving and loading scripted merge sessions.
//!
//! A plan names the source and destination apps and the selections to merge.
//! The `validate` and `simulate` subcommands consume these files; hosts can
//! also use them to seed a wizard session.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::{AppRef, MergeConfiguration, ResourceCategory};

/// A complete, loadable description of a merge to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePlan {
    pub source_app: AppRef,
    pub destination_app: AppRef,
    #[serde(default)]
    pub selections: MergeConfiguration,
}

impl MergePlan {
    /// Save the plan to a JSON file
    #[allow(dead_code)] // API: Used by hosts exporting a configured session
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize merge plan")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write merge plan to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load a plan from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read merge plan from {:?}", path.as_ref()))?;

        let plan: Self = serde_json::from_str(&content).context("Failed to parse merge plan JSON")?;

        Ok(plan)
    }

    /// Validate the plan
    pub fn validate(&self) -> Result<()> {
        if self.source_app.name.trim().is_empty() {
            anyhow::bail!("Source app name must be specified");
        }
        if self.destination_app.name.trim().is_empty() {
            anyhow::bail!("Destination app name must be specified");
        }
        if self.source_app.id == self.destination_app.id {
            anyhow::bail!("Source and destination must be different apps");
        }
        if self.selections.is_empty() {
            anyhow::bail!("At least one resource must be selected for merging");
        }

        // Duplicate ids within a category would double-submit content
        for category in ResourceCategory::all() {
            let ids = self.selections.category(*category);
            for (i, id) in ids.iter().enumerate() {
                if ids[..i].contains(id) {
                    anyhow::bail!("Duplicate {} selection: {}", category, id);
                }
            }
        }

        Ok(())
    }
}
