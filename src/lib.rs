//! appmerge Core Library
//!
//! This library provides the core functionality for the app content merge
//! wizard: the guarded view state machine, the cross-resource selection
//! synchronization engine, and the app-pair lock lifecycle.

pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod selection;
pub mod service;
pub mod sync;
pub mod ticker;
pub mod types;
pub mod wizard;

// Re-export the wizard surface for convenience
pub use wizard::{WizardController, WizardTransitionError, WizardView};

// Re-export main types for convenience
pub use config::MergePlan;
pub use error::{MergeWizardError, Result};
pub use lock::{
    format_remaining, Clock, LockAlert, LockController, LockTick, ManualClock, SystemClock,
    CRITICAL_THRESHOLD_MS, WARNING_THRESHOLD_MS,
};
pub use selection::{diff, SelectionDiff, SelectionSets};
pub use service::{
    InMemoryMergeService, LockGrant, MergeId, MergeLogEntry, MergePreview, MergePreviewItem,
    MergeResults, MergeService, MergeStatus,
};
pub use sync::{AssociationSyncEngine, SelectionChange, SelectionMessage};
pub use ticker::{TickMessage, Ticker};
pub use types::{
    AppRef, MergeConfiguration, MergeItemStatus, MergeRunState, ResourceCategory, ResourceId,
};
