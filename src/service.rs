//! Merge service contract
//!
//! The remote content-merge service is an external collaborator; this module
//! defines the transport-agnostic trait the wizard consumes plus the payload
//! types of its endpoints. Payloads serialize camelCase to mirror the remote
//! JSON contract.
//!
//! `InMemoryMergeService` implements the trait for tests and the `simulate`
//! subcommand: a per-pair lock table, a merge registry, and scripted failure
//! injection for exercising the wizard's error paths.

// Library API - service helpers are exported for host applications
#![allow(dead_code)]

use crate::error::{MergeWizardError, Result};
use crate::lock::Clock;
use crate::types::{MergeConfiguration, MergeItemStatus, MergeRunState, ResourceCategory, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Identifier of a started merge, assigned by the service
pub type MergeId = String;

/// Successful lock acquisition or extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockGrant {
    /// Absolute expiry timestamp, epoch milliseconds
    pub locked_until: u64,
}

/// One resource in a merge preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePreviewItem {
    pub id: ResourceId,
    pub name: String,
    pub status: MergeItemStatus,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Preview of what a merge would do, per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergePreview {
    pub screens: Vec<MergePreviewItem>,
    pub data_sources: Vec<MergePreviewItem>,
    pub files: Vec<MergePreviewItem>,
    pub configurations: Vec<MergePreviewItem>,
}

impl MergePreview {
    /// Returns the preview items for one category
    pub fn category(&self, category: ResourceCategory) -> &[MergePreviewItem] {
        match category {
            ResourceCategory::Screens => &self.screens,
            ResourceCategory::DataSources => &self.data_sources,
            ResourceCategory::Files => &self.files,
            ResourceCategory::Settings => &self.configurations,
        }
    }

    /// Total items across all categories
    pub fn total_items(&self) -> usize {
        ResourceCategory::all()
            .iter()
            .map(|c| self.category(*c).len())
            .sum()
    }

    /// Number of items flagged as conflicts
    pub fn conflicts(&self) -> usize {
        ResourceCategory::all()
            .iter()
            .flat_map(|c| self.category(*c))
            .filter(|item| item.status == MergeItemStatus::Conflict)
            .count()
    }
}

/// Per-category counts reported for a finished merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeResults {
    pub screens: u32,
    pub data_sources: u32,
    pub files: u32,
    pub configurations: u32,
    pub warnings: Vec<String>,
}

/// Remote state of a started merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStatus {
    pub state: MergeRunState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<MergeResults>,
}

/// One entry from the merge execution log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeLogEntry {
    /// Epoch milliseconds
    pub timestamp: u64,
    pub message: String,
}

/// Remote content-merge service endpoints consumed by the wizard.
///
/// Implementations own all persistence; the wizard only mirrors lock expiry
/// locally. Errors carry the service's error code as their payload.
pub trait MergeService: Send + Sync {
    /// Acquire a time-boxed exclusive lock on the app pair
    fn lock_apps(&self, source_id: u64, dest_id: u64) -> Result<LockGrant>;

    /// Release the lock on the app pair
    fn unlock_apps(&self, source_id: u64, dest_id: u64) -> Result<()>;

    /// Extend a currently held lock to a new, later expiry
    fn extend_lock(&self, source_id: u64, dest_id: u64) -> Result<LockGrant>;

    /// Compute what a merge with this configuration would do
    fn preview_merge(&self, config: &MergeConfiguration) -> Result<MergePreview>;

    /// Start executing a merge; returns the merge id to poll
    fn start_merge(&self, config: &MergeConfiguration) -> Result<MergeId>;

    /// Current state of a started merge
    fn merge_status(&self, merge_id: &str) -> Result<MergeStatus>;

    /// Execution log of a started merge
    fn merge_logs(&self, merge_id: &str) -> Result<Vec<MergeLogEntry>>;
}

#[derive(Default)]
struct InMemoryState {
    /// (source, dest) -> locked_until epoch ms
    locks: HashMap<(u64, u64), u64>,
    merges: HashMap<MergeId, MergeStatus>,
    logs: HashMap<MergeId, Vec<MergeLogEntry>>,
    next_merge: u64,
    preview_override: Option<MergePreview>,
    fail_next_lock: Option<String>,
    fail_next_extend: Option<String>,
    fail_next_unlock: Option<String>,
    unlock_calls: u64,
}

/// In-memory merge service for tests and scripted simulation.
///
/// Lock grants are computed from the injected clock, so a `ManualClock`
/// drives expiry deterministically.
pub struct InMemoryMergeService {
    clock: Arc<dyn Clock>,
    lock_duration_ms: u64,
    state: Mutex<InMemoryState>,
}

impl InMemoryMergeService {
    pub fn new(clock: Arc<dyn Clock>, lock_duration_ms: u64) -> Self {
        Self {
            clock,
            lock_duration_ms,
            state: Mutex::new(InMemoryState::default()),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        self.state.lock().expect("InMemoryMergeService mutex poisoned")
    }

    /// Make the next `lock_apps` call fail with the given error code
    pub fn fail_next_lock(&self, code: &str) {
        self.lock_state().fail_next_lock = Some(code.to_string());
    }

    /// Make the next `extend_lock` call fail with the given error code
    pub fn fail_next_extend(&self, code: &str) {
        self.lock_state().fail_next_extend = Some(code.to_string());
    }

    /// Make the next `unlock_apps` call fail with the given error code
    pub fn fail_next_unlock(&self, code: &str) {
        self.lock_state().fail_next_unlock = Some(code.to_string());
    }

    /// Script the preview returned by the next `preview_merge` call
    pub fn set_preview(&self, preview: MergePreview) {
        self.lock_state().preview_override = Some(preview);
    }

    /// Mark a running merge as completed with the given results
    pub fn complete_merge(&self, merge_id: &str, results: MergeResults) {
        let now = self.clock.now_ms();
        let mut state = self.lock_state();
        if let Some(status) = state.merges.get_mut(merge_id) {
            status.state = MergeRunState::Completed;
            status.results = Some(results);
        }
        state.logs.entry(merge_id.to_string()).or_default().push(MergeLogEntry {
            timestamp: now,
            message: "Merge completed".to_string(),
        });
    }

    /// Mark a running merge as failed
    pub fn fail_merge(&self, merge_id: &str) {
        let now = self.clock.now_ms();
        let mut state = self.lock_state();
        if let Some(status) = state.merges.get_mut(merge_id) {
            status.state = MergeRunState::Failed;
        }
        state.logs.entry(merge_id.to_string()).or_default().push(MergeLogEntry {
            timestamp: now,
            message: "Merge failed".to_string(),
        });
    }

    /// Returns true if the pair currently holds an unexpired lock
    pub fn is_pair_locked(&self, source_id: u64, dest_id: u64) -> bool {
        let now = self.clock.now_ms();
        self.lock_state()
            .locks
            .get(&(source_id, dest_id))
            .is_some_and(|until| *until > now)
    }

    /// Number of unlock calls observed (successful or injected failures)
    pub fn unlock_count(&self) -> u64 {
        self.lock_state().unlock_calls
    }

    fn synthesize_items(ids: &[ResourceId], category: ResourceCategory) -> Vec<MergePreviewItem> {
        ids.iter()
            .map(|id| MergePreviewItem {
                id: id.clone(),
                name: format!("{} {}", category, id),
                status: MergeItemStatus::Copy,
                warnings: Vec::new(),
            })
            .collect()
    }
}

impl MergeService for InMemoryMergeService {
    fn lock_apps(&self, source_id: u64, dest_id: u64) -> Result<LockGrant> {
        let now = self.clock.now_ms();
        let mut state = self.lock_state();
        if let Some(code) = state.fail_next_lock.take() {
            return Err(MergeWizardError::lock(code));
        }
        if state
            .locks
            .get(&(source_id, dest_id))
            .is_some_and(|until| *until > now)
        {
            return Err(MergeWizardError::lock("already-locked"));
        }
        let locked_until = now + self.lock_duration_ms;
        state.locks.insert((source_id, dest_id), locked_until);
        info!("Locked apps {} -> {} until {}", source_id, dest_id, locked_until);
        Ok(LockGrant { locked_until })
    }

    fn unlock_apps(&self, source_id: u64, dest_id: u64) -> Result<()> {
        let mut state = self.lock_state();
        state.unlock_calls += 1;
        if let Some(code) = state.fail_next_unlock.take() {
            return Err(MergeWizardError::lock(code));
        }
        state.locks.remove(&(source_id, dest_id));
        info!("Unlocked apps {} -> {}", source_id, dest_id);
        Ok(())
    }

    fn extend_lock(&self, source_id: u64, dest_id: u64) -> Result<LockGrant> {
        let now = self.clock.now_ms();
        let mut state = self.lock_state();
        if let Some(code) = state.fail_next_extend.take() {
            return Err(MergeWizardError::lock(code));
        }
        let entry = state.locks.get_mut(&(source_id, dest_id));
        match entry {
            Some(until) if *until > now => {
                *until = now + self.lock_duration_ms;
                let locked_until = *until;
                debug!("Extended lock on {} -> {} until {}", source_id, dest_id, locked_until);
                Ok(LockGrant { locked_until })
            }
            _ => Err(MergeWizardError::lock("lock-not-held")),
        }
    }

    fn preview_merge(&self, config: &MergeConfiguration) -> Result<MergePreview> {
        let mut state = self.lock_state();
        if let Some(preview) = state.preview_override.take() {
            return Ok(preview);
        }
        Ok(MergePreview {
            screens: Self::synthesize_items(&config.screens, ResourceCategory::Screens),
            data_sources: Self::synthesize_items(&config.data_sources, ResourceCategory::DataSources),
            files: Self::synthesize_items(&config.files, ResourceCategory::Files),
            configurations: Self::synthesize_items(&config.configurations, ResourceCategory::Settings),
        })
    }

    fn start_merge(&self, config: &MergeConfiguration) -> Result<MergeId> {
        if config.is_empty() {
            return Err(MergeWizardError::validation("empty merge configuration"));
        }
        let now = self.clock.now_ms();
        let mut state = self.lock_state();
        state.next_merge += 1;
        let merge_id = format!("merge-{}", state.next_merge);
        state.merges.insert(
            merge_id.clone(),
            MergeStatus {
                state: MergeRunState::Running,
                results: None,
            },
        );
        state.logs.insert(
            merge_id.clone(),
            vec![MergeLogEntry {
                timestamp: now,
                message: format!("Merge started with {} item(s)", config.total()),
            }],
        );
        info!("Started {}", merge_id);
        Ok(merge_id)
    }

    fn merge_status(&self, merge_id: &str) -> Result<MergeStatus> {
        self.lock_state()
            .merges
            .get(merge_id)
            .cloned()
            .ok_or_else(|| MergeWizardError::server("merge-not-found"))
    }

    fn merge_logs(&self, merge_id: &str) -> Result<Vec<MergeLogEntry>> {
        Ok(self
            .lock_state()
            .logs
            .get(merge_id)
            .cloned()
            .unwrap_or_default())
    }
}
