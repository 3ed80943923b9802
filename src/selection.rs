//! Selection set store
//!
//! Holds the four per-category selection sets and the diff primitive that
//! underlies bulk selection-change handling from nested tables.
//!
//! # Design
//!
//! - **Pure logic**: No I/O, no side effects — only set bookkeeping
//! - **Set semantics, stable order**: Each set is a duplicate-free `Vec` that
//!   keeps insertion order so change events stay deterministic
//! - **Testable**: All operations are unit-tested with input → diff assertions

use crate::types::{MergeConfiguration, ResourceCategory, ResourceId};

/// Result of comparing a new id list against a previous one.
///
/// `added` and `removed` are disjoint; `added` follows the order of the new
/// list, `removed` the order of the previous list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionDiff {
    pub added: Vec<ResourceId>,
    pub removed: Vec<ResourceId>,
}

impl SelectionDiff {
    /// Returns true if nothing was added or removed
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compute the diff between a new id list and the previous one.
///
/// Duplicates in either input are collapsed; the first occurrence wins.
pub fn diff(new_ids: &[ResourceId], previous: &[ResourceId]) -> SelectionDiff {
    let added = new_ids
        .iter()
        .enumerate()
        .filter(|&(i, id)| !previous.contains(id) && !new_ids[..i].contains(id))
        .map(|(_, id)| id.clone())
        .collect();
    let removed = previous
        .iter()
        .enumerate()
        .filter(|&(i, id)| !new_ids.contains(id) && !previous[..i].contains(id))
        .map(|(_, id)| id.clone())
        .collect();
    SelectionDiff { added, removed }
}

/// The four per-category selection sets.
///
/// Lifecycle: created empty when configuration is entered fresh, preserved
/// across configuration↔review backtracking, discarded on cancel or merge
/// completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSets {
    screens: Vec<ResourceId>,
    data_sources: Vec<ResourceId>,
    files: Vec<ResourceId>,
    settings: Vec<ResourceId>,
}

impl SelectionSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current ids for one category
    pub fn get(&self, category: ResourceCategory) -> &[ResourceId] {
        match category {
            ResourceCategory::Screens => &self.screens,
            ResourceCategory::DataSources => &self.data_sources,
            ResourceCategory::Files => &self.files,
            ResourceCategory::Settings => &self.settings,
        }
    }

    fn get_mut(&mut self, category: ResourceCategory) -> &mut Vec<ResourceId> {
        match category {
            ResourceCategory::Screens => &mut self.screens,
            ResourceCategory::DataSources => &mut self.data_sources,
            ResourceCategory::Files => &mut self.files,
            ResourceCategory::Settings => &mut self.settings,
        }
    }

    /// Replace a category's set wholesale, collapsing duplicates.
    ///
    /// Returns the diff against the previous contents.
    pub fn replace(&mut self, category: ResourceCategory, ids: Vec<ResourceId>) -> SelectionDiff {
        let mut deduped: Vec<ResourceId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !deduped.contains(&id) {
                deduped.push(id);
            }
        }

        let set = self.get_mut(category);
        let change = diff(&deduped, set);
        *set = deduped;
        change
    }

    /// Add one id to a category's set.
    ///
    /// Returns false if it was already present (no mutation).
    pub fn insert(&mut self, category: ResourceCategory, id: ResourceId) -> bool {
        let set = self.get_mut(category);
        if set.contains(&id) {
            return false;
        }
        set.push(id);
        true
    }

    /// Remove one id from a category's set.
    ///
    /// Returns false if it was not present.
    pub fn remove(&mut self, category: ResourceCategory, id: &ResourceId) -> bool {
        let set = self.get_mut(category);
        match set.iter().position(|existing| existing == id) {
            Some(index) => {
                set.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns true if the id is selected in the category
    pub fn contains(&self, category: ResourceCategory, id: &ResourceId) -> bool {
        self.get(category).contains(id)
    }

    /// Number of selected items in one category
    pub fn len(&self, category: ResourceCategory) -> usize {
        self.get(category).len()
    }

    /// Sum of the sizes of all four sets
    pub fn total(&self) -> usize {
        self.screens.len() + self.data_sources.len() + self.files.len() + self.settings.len()
    }

    /// Returns true if every set is empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Reset all four sets to empty
    pub fn clear_all(&mut self) {
        self.screens.clear();
        self.data_sources.clear();
        self.files.clear();
        self.settings.clear();
    }

    /// Project the sets into an aggregate merge configuration
    pub fn snapshot(&self) -> MergeConfiguration {
        MergeConfiguration {
            screens: self.screens.clone(),
            data_sources: self.data_sources.clone(),
            files: self.files.clone(),
            configurations: self.settings.clone(),
        }
    }
}
