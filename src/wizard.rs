//! Wizard state machine
//!
//! Authoritative source of truth for the merge wizard session. It enforces
//! valid view transitions, owns the destination app reference and the merge
//! configuration snapshot, and drives the lock controller and the selection
//! sync engine.
//!
//! # Design Principles
//!
//! - **Single Source of Truth**: one `WizardController` per active session
//!   owns all wizard state; no global/static state
//! - **Validated Transitions**: each intent is guarded by the view it is
//!   valid from; invalid intents return errors immediately
//! - **Lock Safety**: every path back to the dashboard — completion, error,
//!   cancel, teardown — releases the app lock before the view changes, and
//!   `Drop` is the terminal safety net
//!
//! # View Flow
//!
//! ```text
//! Dashboard
//!     ↓ configure_merge              ↑ back_to_dashboard
//! DestinationSelector
//!     ↓ select_destination (locks apps)
//! Configuration
//!     ↓ request_review               ↑ back_to_configuration
//! Review
//!     ↓ start_merge
//! Progress
//!     ↓ complete_merge (unlocks apps)
//! Complete
//!
//! (merge_errored and cancel return to Dashboard from any view,
//!  unlocking first)
//! ```

use crate::error::{MergeWizardError, Result};
use crate::lock::{Clock, LockController, LockTick, SystemClock};
use crate::service::{MergeId, MergeLogEntry, MergePreview, MergeService, MergeStatus};
use crate::sync::{AssociationSyncEngine, SelectionChange, SelectionMessage};
use crate::types::{AppRef, MergeConfiguration};
use std::sync::Arc;
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;
use tracing::{debug, info, warn};

/// The six wizard views.
///
/// Each view maps to exactly one step index and one page title; the mapping
/// is fixed and exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum WizardView {
    /// Entry point; no merge in progress
    Dashboard,
    /// Pick the destination app for the merge
    DestinationSelector,
    /// Choose content across the four category tabs
    Configuration,
    /// Review the selections and the merge preview
    Review,
    /// Merge executing on the server
    Progress,
    /// Merge finished successfully
    Complete,
}

impl WizardView {
    /// Returns the step index of this view (0-5)
    #[inline]
    pub const fn step(self) -> u8 {
        match self {
            Self::Dashboard => 0,
            Self::DestinationSelector => 1,
            Self::Configuration => 2,
            Self::Review => 3,
            Self::Progress => 4,
            Self::Complete => 5,
        }
    }

    /// Returns the page title shown for this view
    pub const fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Merge Apps",
            Self::DestinationSelector => "Select Destination App",
            Self::Configuration => "Choose Content to Merge",
            Self::Review => "Review & Confirm Merge",
            Self::Progress => "Merging Apps",
            Self::Complete => "Merge Complete",
        }
    }

    /// Whether the step progress indicator is shown on this view
    #[inline]
    pub const fn shows_progress(self) -> bool {
        !matches!(self, Self::Dashboard | Self::Complete)
    }

    /// Returns all views in step order
    pub const fn all_views() -> &'static [Self] {
        &[
            Self::Dashboard,
            Self::DestinationSelector,
            Self::Configuration,
            Self::Review,
            Self::Progress,
            Self::Complete,
        ]
    }
}

/// Errors raised by invalid wizard intents
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardTransitionError {
    /// The intent is not valid from the current view
    #[error("Intent `{intent}` is not valid from the {from} view")]
    InvalidFromView {
        intent: &'static str,
        from: WizardView,
    },

    /// An operation that needs a started merge found none
    #[error("No merge has been started")]
    NoMergeStarted,
}

impl From<WizardTransitionError> for MergeWizardError {
    fn from(err: WizardTransitionError) -> Self {
        MergeWizardError::Transition(err.to_string())
    }
}

/// Top-level controller for one merge wizard session.
///
/// # Example
///
/// ```
/// use appmerge::lock::ManualClock;
/// use appmerge::service::InMemoryMergeService;
/// use appmerge::types::AppRef;
/// use appmerge::wizard::{WizardController, WizardView};
/// use std::sync::Arc;
///
/// let clock = Arc::new(ManualClock::new(0));
/// let service = Arc::new(InMemoryMergeService::new(clock.clone(), 600_000));
/// let mut wizard = WizardController::with_clock(
///     AppRef::new(123, "Source App"),
///     service,
///     clock,
/// );
///
/// wizard.configure_merge().unwrap();
/// wizard.select_destination(AppRef::new(456, "Destination App")).unwrap();
/// assert_eq!(wizard.view(), WizardView::Configuration);
/// assert!(wizard.is_apps_locked());
/// ```
pub struct WizardController {
    view: WizardView,
    source_app: AppRef,
    selected_destination: Option<AppRef>,
    merge_configuration: MergeConfiguration,
    apps_locked: bool,
    merge_id: Option<MergeId>,
    last_error: Option<String>,
    selections: AssociationSyncEngine,
    lock: LockController,
    service: Arc<dyn MergeService>,
}

impl WizardController {
    /// Create a controller with the wall clock.
    #[allow(dead_code)] // API: Constructor for production hosts
    pub fn new(source_app: AppRef, service: Arc<dyn MergeService>) -> Self {
        Self::with_clock(source_app, service, Arc::new(SystemClock))
    }

    /// Create a controller with an injected time source.
    pub fn with_clock(
        source_app: AppRef,
        service: Arc<dyn MergeService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!("Starting merge wizard session for source app {}", source_app);
        Self {
            view: WizardView::Dashboard,
            source_app,
            selected_destination: None,
            merge_configuration: MergeConfiguration::default(),
            apps_locked: false,
            merge_id: None,
            last_error: None,
            selections: AssociationSyncEngine::new(),
            lock: LockController::new(service.clone(), clock),
            service,
        }
    }

    // =========================================================================
    // State Accessors
    // =========================================================================

    /// Current wizard view
    #[inline]
    pub fn view(&self) -> WizardView {
        self.view
    }

    /// Step index of the current view (0-5)
    #[inline]
    pub fn step(&self) -> u8 {
        self.view.step()
    }

    /// Page title of the current view
    #[inline]
    pub fn page_title(&self) -> &'static str {
        self.view.title()
    }

    /// Whether the step indicator is shown on the current view
    #[inline]
    pub fn shows_progress(&self) -> bool {
        self.view.shows_progress()
    }

    /// The source application of this session
    #[inline]
    pub fn source_app(&self) -> &AppRef {
        &self.source_app
    }

    /// The confirmed destination app, if any
    #[inline]
    pub fn selected_destination(&self) -> Option<&AppRef> {
        self.selected_destination.as_ref()
    }

    /// The merge configuration snapshot handed to review/progress
    #[inline]
    pub fn merge_configuration(&self) -> &MergeConfiguration {
        &self.merge_configuration
    }

    /// True only while a lock is actively held on the app pair
    #[inline]
    pub fn is_apps_locked(&self) -> bool {
        self.apps_locked
    }

    /// Id of the started merge, while on the progress view
    #[inline]
    pub fn merge_id(&self) -> Option<&MergeId> {
        self.merge_id.as_ref()
    }

    /// User-facing message of the last error routed through `merge_errored`
    #[inline]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Read access to the selection sync engine
    #[inline]
    pub fn selections(&self) -> &AssociationSyncEngine {
        &self.selections
    }

    /// Sum of selected items across all four categories
    #[inline]
    pub fn total_selected(&self) -> usize {
        self.selections.total_selected()
    }

    // =========================================================================
    // Forward Transitions
    // =========================================================================

    /// Dashboard → DestinationSelector on the "configure merge" intent
    pub fn configure_merge(&mut self) -> Result<()> {
        self.guard("configureMerge", WizardView::Dashboard)?;
        self.last_error = None;
        self.set_view(WizardView::DestinationSelector);
        Ok(())
    }

    /// DestinationSelector → Configuration on destination confirmation.
    ///
    /// Locks the app pair. The lock flag is set optimistically while the
    /// remote call runs; on failure it ends false, the view does not advance
    /// and the error is returned for surfacing.
    pub fn select_destination(&mut self, app: AppRef) -> Result<()> {
        self.guard("destinationSelected", WizardView::DestinationSelector)?;
        info!("Destination app confirmed: {}", app);
        let dest_id = app.id;
        self.selected_destination = Some(app);
        self.apps_locked = true;
        if let Err(e) = self.lock.acquire(self.source_app.id, dest_id) {
            self.apps_locked = false;
            warn!("Could not lock apps for merge: {}", e);
            return Err(e);
        }
        // Fresh configuration entry starts with empty selection sets
        self.selections.reset();
        self.merge_configuration = MergeConfiguration::default();
        self.set_view(WizardView::Configuration);
        Ok(())
    }

    /// Configuration → Review, storing the passed selections verbatim.
    ///
    /// Allowed unconditionally; gating on empty selections is the UI's
    /// button-disable concern, not a state-machine guard.
    pub fn request_review(&mut self, selections: MergeConfiguration) -> Result<()> {
        self.guard("reviewRequested", WizardView::Configuration)?;
        self.merge_configuration = selections;
        self.set_view(WizardView::Review);
        Ok(())
    }

    /// Review → Progress on the "start merge" intent.
    ///
    /// A service failure aborts the transition: the view stays on review.
    pub fn start_merge(&mut self) -> Result<MergeId> {
        self.guard("mergeStarted", WizardView::Review)?;
        let merge_id = self.service.start_merge(&self.merge_configuration)?;
        self.merge_id = Some(merge_id.clone());
        self.set_view(WizardView::Progress);
        Ok(merge_id)
    }

    /// Progress → Complete on merge completion.
    ///
    /// Unlocks the apps (best-effort) and clears the destination and all
    /// selection state.
    pub fn complete_merge(&mut self) -> Result<()> {
        self.guard("mergeCompleted", WizardView::Progress)?;
        self.unlock_best_effort("merge-completed");
        self.selected_destination = None;
        self.selections.reset();
        self.merge_configuration = MergeConfiguration::default();
        self.merge_id = None;
        self.set_view(WizardView::Complete);
        Ok(())
    }

    // =========================================================================
    // Backtrack Transitions
    // =========================================================================

    /// DestinationSelector → Dashboard (pure navigation)
    pub fn back_to_dashboard(&mut self) -> Result<()> {
        self.guard("backToDashboard", WizardView::DestinationSelector)?;
        self.set_view(WizardView::Dashboard);
        Ok(())
    }

    /// Review → Configuration; the stored configuration survives unchanged
    pub fn back_to_configuration(&mut self) -> Result<()> {
        self.guard("backToConfiguration", WizardView::Review)?;
        self.set_view(WizardView::Configuration);
        Ok(())
    }

    // =========================================================================
    // Exit Paths
    // =========================================================================

    /// Route a mid-merge error back to the dashboard, from any view.
    ///
    /// The unlock is issued before the view fields change, so no observer
    /// can see a dashboard view with a lock still requested. The error's
    /// user-facing message is retained for the dashboard banner.
    pub fn merge_errored(&mut self, error: MergeWizardError) {
        warn!("Merge errored on view {}: {}", self.view, error);
        self.unlock_best_effort("merge-errored");
        self.last_error = Some(error.user_message().to_string());
        self.merge_id = None;
        self.set_view(WizardView::Dashboard);
    }

    /// Abandon the session from any view: unlock, discard all selection
    /// state and return to the dashboard.
    pub fn cancel(&mut self) {
        info!("Merge wizard cancelled on view {}", self.view);
        self.unlock_best_effort("cancelled");
        self.selected_destination = None;
        self.selections.reset();
        self.merge_configuration = MergeConfiguration::default();
        self.merge_id = None;
        self.set_view(WizardView::Dashboard);
    }

    /// Session teardown: release the lock if one is still held.
    ///
    /// Idempotent; also invoked from `Drop` as the terminal safety net.
    pub fn teardown(&mut self) {
        if self.apps_locked {
            warn!("Wizard torn down with apps still locked, releasing");
            self.unlock_best_effort("session-teardown");
        }
    }

    // =========================================================================
    // Selection Handling
    // =========================================================================

    /// Feed a selection message into the sync engine.
    ///
    /// Valid only on the configuration view, where the selection tabs and
    /// their nested association views live. Returns the normalized change
    /// event, or `Ok(None)` for a no-op message.
    pub fn apply_selection(&mut self, message: SelectionMessage) -> Result<Option<SelectionChange>> {
        self.guard("selectionChanged", WizardView::Configuration)?;
        Ok(self.selections.apply(message))
    }

    // =========================================================================
    // Merge Service Passthroughs
    // =========================================================================

    /// Preview what the configured merge would do (review view)
    pub fn preview(&self) -> Result<MergePreview> {
        self.guard("previewMerge", WizardView::Review)?;
        self.service.preview_merge(&self.merge_configuration)
    }

    /// Poll the state of the started merge (progress view)
    pub fn merge_status(&self) -> Result<MergeStatus> {
        self.guard("mergeStatus", WizardView::Progress)?;
        let merge_id = self
            .merge_id
            .as_ref()
            .ok_or(WizardTransitionError::NoMergeStarted)?;
        self.service.merge_status(merge_id)
    }

    /// Fetch the execution log of the started merge (progress view)
    pub fn merge_logs(&self) -> Result<Vec<MergeLogEntry>> {
        self.guard("mergeLogs", WizardView::Progress)?;
        let merge_id = self
            .merge_id
            .as_ref()
            .ok_or(WizardTransitionError::NoMergeStarted)?;
        self.service.merge_logs(merge_id)
    }

    // =========================================================================
    // Lock Passthroughs
    // =========================================================================

    /// Advance the lock countdown by one evaluation.
    ///
    /// The host calls this once per second while a countdown is displayed.
    /// A `LockAlert::Expired` result is the host's cue to route the session
    /// through `merge_errored` — the remote service has reclaimed the lock.
    pub fn lock_tick(&mut self) -> Option<LockTick> {
        self.lock.tick()
    }

    /// Request additional lock time; returns the new expiry
    pub fn extend_lock(&mut self) -> Result<u64> {
        self.lock.extend()
    }

    /// Dismiss the warning-band affordance until the next extension
    pub fn dismiss_lock_warning(&mut self) {
        self.lock.dismiss_warning();
    }

    /// Remaining lock time in milliseconds; zero when unlocked
    pub fn lock_remaining_ms(&self) -> u64 {
        self.lock.time_remaining_ms()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn guard(&self, intent: &'static str, expected: WizardView) -> Result<()> {
        if self.view == expected {
            Ok(())
        } else {
            Err(WizardTransitionError::InvalidFromView {
                intent,
                from: self.view,
            }
            .into())
        }
    }

    fn unlock_best_effort(&mut self, reason: &str) {
        if let Err(e) = self.lock.release(reason) {
            // The remote service is the final authority; it reclaims
            // expired locks on its own.
            warn!("Unlock failed ({}): {}", reason, e);
        }
        self.apps_locked = false;
    }

    fn set_view(&mut self, view: WizardView) {
        debug!("View transition {} -> {} (step {})", self.view, view, view.step());
        self.view = view;
    }
}

impl Drop for WizardController {
    fn drop(&mut self) {
        self.teardown();
    }
}
