//! Lock lifecycle controller
//!
//! Owns acquisition, extension and release of the time-boxed mutual-exclusion
//! lock on the (source, destination) app pair, and the countdown that drives
//! the warn/critical/expired affordances.
//!
//! # Design
//!
//! - **Injectable time**: all remaining-time math goes through the `Clock`
//!   trait, so expiry and threshold behavior are unit-testable without
//!   wall-clock delays (`ManualClock`)
//! - **Pull-based tick**: the host calls `tick()` once per second (see
//!   `ticker`); the controller never owns a timer itself
//! - **Expiry fires once**: after the expired tick is reported, ticking stops
//!   for that lock instance until a new lock is acquired
//!
//! The remote service is the final authority on the lock; this controller
//! only mirrors `locked_until` locally.

use crate::error::{MergeWizardError, Result};
use crate::service::MergeService;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Remaining time below which the dismissible warning is shown (5 minutes)
pub const WARNING_THRESHOLD_MS: u64 = 5 * 60 * 1000;

/// Remaining time below which the blocking urgency affordance is shown (2 minutes)
pub const CRITICAL_THRESHOLD_MS: u64 = 2 * 60 * 1000;

/// Source of the current time, epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall-clock time source for production use
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0) // Fallback to 0 if system time is before epoch (shouldn't happen)
    }
}

/// Manually advanced time source for tests and scripted simulation
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump the clock to an absolute time
    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Urgency classification of the remaining lock time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAlert {
    /// Five minutes or more remain
    None,
    /// Under five minutes: dismissible warning offering "extend"
    Warning,
    /// Under two minutes: blocking affordance, dismissible only by extending
    Critical,
    /// Remaining time reached zero; reported exactly once per lock
    Expired,
}

/// One countdown evaluation, produced per tick while a lock is displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTick {
    pub remaining_ms: u64,
    pub alert: LockAlert,
    /// Human-readable remaining time, e.g. "2 minutes 30 seconds"
    pub display: String,
}

#[derive(Debug, Clone, Copy)]
struct HeldLock {
    source_id: u64,
    dest_id: u64,
    locked_until_ms: u64,
}

/// Owns the lock lifecycle against the remote service
pub struct LockController {
    service: Arc<dyn MergeService>,
    clock: Arc<dyn Clock>,
    held: Option<HeldLock>,
    expiry_fired: bool,
    warning_dismissed: bool,
}

impl LockController {
    pub fn new(service: Arc<dyn MergeService>, clock: Arc<dyn Clock>) -> Self {
        Self {
            service,
            clock,
            held: None,
            expiry_fired: false,
            warning_dismissed: false,
        }
    }

    /// Returns true while a lock is mirrored as held
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.held.is_some()
    }

    /// Absolute expiry of the held lock, if any
    #[inline]
    pub fn locked_until_ms(&self) -> Option<u64> {
        self.held.map(|h| h.locked_until_ms)
    }

    /// Remaining lock time; zero when no lock is held
    pub fn time_remaining_ms(&self) -> u64 {
        match self.held {
            Some(held) => held.locked_until_ms.saturating_sub(self.clock.now_ms()),
            None => 0,
        }
    }

    /// Request a lock on the app pair from the remote service.
    ///
    /// On failure the caller must treat the apps as unlocked.
    pub fn acquire(&mut self, source_id: u64, dest_id: u64) -> Result<()> {
        if self.held.is_some() {
            return Err(MergeWizardError::lock("lock-already-held"));
        }
        let grant = self.service.lock_apps(source_id, dest_id)?;
        info!(
            "Lock acquired on apps {} -> {} until {}",
            source_id, dest_id, grant.locked_until
        );
        self.held = Some(HeldLock {
            source_id,
            dest_id,
            locked_until_ms: grant.locked_until,
        });
        self.expiry_fired = false;
        self.warning_dismissed = false;
        Ok(())
    }

    /// Request additional lock duration.
    ///
    /// Callable repeatedly while the lock is still valid. A service failure
    /// leaves the mirrored `locked_until` untouched.
    pub fn extend(&mut self) -> Result<u64> {
        let Some(held) = self.held else {
            return Err(MergeWizardError::lock("lock-not-held"));
        };
        if self.expiry_fired || self.time_remaining_ms() == 0 {
            return Err(MergeWizardError::lock("lock-expired"));
        }
        let grant = self.service.extend_lock(held.source_id, held.dest_id)?;
        info!(
            "Lock on apps {} -> {} extended until {}",
            held.source_id, held.dest_id, grant.locked_until
        );
        self.held = Some(HeldLock {
            locked_until_ms: grant.locked_until,
            ..held
        });
        self.warning_dismissed = false;
        Ok(grant.locked_until)
    }

    /// Release the lock.
    ///
    /// Idempotent: releasing when already unlocked is a no-op. The local
    /// mirror is cleared even when the remote call fails — the service is
    /// the final authority and reclaims expired locks itself; the error is
    /// still returned for surfacing.
    pub fn release(&mut self, reason: &str) -> Result<()> {
        let Some(held) = self.held.take() else {
            debug!("Release ({}) with no lock held, nothing to do", reason);
            return Ok(());
        };
        self.expiry_fired = false;
        self.warning_dismissed = false;
        info!(
            "Releasing lock on apps {} -> {} ({})",
            held.source_id, held.dest_id, reason
        );
        self.service.unlock_apps(held.source_id, held.dest_id)
    }

    /// Recompute remaining time and classify it.
    ///
    /// Returns `None` when no lock is held or when expiry has already been
    /// reported for this lock instance.
    pub fn tick(&mut self) -> Option<LockTick> {
        let held = self.held?;
        if self.expiry_fired {
            return None;
        }
        let remaining = held.locked_until_ms.saturating_sub(self.clock.now_ms());
        let alert = if remaining == 0 {
            self.expiry_fired = true;
            warn!(
                "Lock on apps {} -> {} expired",
                held.source_id, held.dest_id
            );
            LockAlert::Expired
        } else if remaining < CRITICAL_THRESHOLD_MS {
            LockAlert::Critical
        } else if remaining < WARNING_THRESHOLD_MS && !self.warning_dismissed {
            LockAlert::Warning
        } else {
            LockAlert::None
        };
        Some(LockTick {
            remaining_ms: remaining,
            alert,
            display: format_remaining(remaining),
        })
    }

    /// Suppress the dismissible warning band.
    ///
    /// The critical band cannot be dismissed; a successful extension re-arms
    /// the warning.
    pub fn dismiss_warning(&mut self) {
        self.warning_dismissed = true;
    }
}

impl Drop for LockController {
    fn drop(&mut self) {
        // Terminal safety net: never leave an orphaned lock behind.
        if let Some(held) = self.held.take() {
            warn!(
                "LockController dropped while holding lock on apps {} -> {}, releasing",
                held.source_id, held.dest_id
            );
            if let Err(e) = self.service.unlock_apps(held.source_id, held.dest_id) {
                warn!("Best-effort unlock on drop failed: {}", e);
            }
        }
    }
}

fn unit(value: u64, word: &str) -> String {
    if value == 1 {
        format!("1 {}", word)
    } else {
        format!("{} {}s", value, word)
    }
}

/// Render remaining milliseconds as human-readable text.
///
/// Minutes ≥ 1 render as `"<M> minute(s) <S> second(s)"`, with the seconds
/// clause omitted when the second count is exactly zero; below one minute
/// only seconds are rendered. Singular/plural is keyed on the literal value
/// being 1 for each unit independently.
pub fn format_remaining(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    if minutes >= 1 {
        if seconds == 0 {
            unit(minutes, "minute")
        } else {
            format!("{} {}", unit(minutes, "minute"), unit(seconds, "second"))
        }
    } else {
        unit(seconds, "second")
    }
}
