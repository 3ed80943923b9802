//! Cross-resource selection synchronization engine
//!
//! Translates selection intents from the configuration tabs and their nested
//! association views into authoritative updates of the per-category selection
//! sets, without the two update paths conflicting.
//!
//! All mutation flows through a closed set of tagged messages consumed by a
//! single dispatch point (`AssociationSyncEngine::apply`). A no-op message —
//! re-toggling an id that is already in the requested state, or replacing a
//! set with identical contents — produces no change event, which is what
//! prevents duplicate counting and toggle feedback loops between a tab and
//! the nested views of other tabs.

use crate::selection::{SelectionDiff, SelectionSets};
use crate::types::{MergeConfiguration, ResourceCategory, ResourceId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Selection intents accepted by the engine.
///
/// `SelectionReplaced` carries a tab's own selection state wholesale;
/// `AssociationToggled` carries a single-id toggle originating from a nested
/// association view of *another* category's tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SelectionMessage {
    #[serde(rename_all = "camelCase")]
    SelectionReplaced {
        category: ResourceCategory,
        ids: Vec<ResourceId>,
    },
    #[serde(rename_all = "camelCase")]
    AssociationToggled {
        category: ResourceCategory,
        id: ResourceId,
        selected: bool,
    },
}

/// Normalized selection-changed event, one per category per applied message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    pub category: ResourceCategory,
    pub added: Vec<ResourceId>,
    pub removed: Vec<ResourceId>,
}

impl SelectionChange {
    fn from_diff(category: ResourceCategory, diff: SelectionDiff) -> Self {
        Self {
            category,
            added: diff.added,
            removed: diff.removed,
        }
    }
}

/// Owns the four selection sets and serializes all updates to them
#[derive(Debug, Clone, Default)]
pub struct AssociationSyncEngine {
    sets: SelectionSets,
}

impl AssociationSyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one selection message.
    ///
    /// Returns the normalized change event, or `None` when the message was a
    /// no-op (the sets already matched the requested state). Callers must not
    /// emit anything for a `None` result.
    pub fn apply(&mut self, message: SelectionMessage) -> Option<SelectionChange> {
        match message {
            SelectionMessage::SelectionReplaced { category, ids } => {
                let diff = self.sets.replace(category, ids);
                if diff.is_empty() {
                    debug!("Selection for {} replaced with identical contents", category);
                    return None;
                }
                debug!(
                    "Selection for {} replaced (+{} -{})",
                    category,
                    diff.added.len(),
                    diff.removed.len()
                );
                Some(SelectionChange::from_diff(category, diff))
            }
            SelectionMessage::AssociationToggled {
                category,
                id,
                selected,
            } => {
                if selected {
                    if !self.sets.insert(category, id.clone()) {
                        debug!("Association toggle on {} {} already selected", category, id);
                        return None;
                    }
                    debug!("Association selected {} {}", category, id);
                    Some(SelectionChange {
                        category,
                        added: vec![id],
                        removed: Vec::new(),
                    })
                } else {
                    if !self.sets.remove(category, &id) {
                        debug!("Association toggle off {} {} not selected", category, id);
                        return None;
                    }
                    debug!("Association deselected {} {}", category, id);
                    Some(SelectionChange {
                        category,
                        added: Vec::new(),
                        removed: vec![id],
                    })
                }
            }
        }
    }

    /// Read access to the underlying sets
    pub fn sets(&self) -> &SelectionSets {
        &self.sets
    }

    /// Sum of the sizes of all four selection sets.
    ///
    /// Used by the wizard to gate progression to review.
    pub fn total_selected(&self) -> usize {
        self.sets.total()
    }

    /// Snapshot of the sets as an aggregate merge configuration
    pub fn snapshot(&self) -> MergeConfiguration {
        self.sets.snapshot()
    }

    /// Discard all selections (configuration abandoned or consumed)
    pub fn reset(&mut self) {
        self.sets.clear_all();
    }
}
