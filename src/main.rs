//! appmerge - main entry point
//!
//! Headless driver for the merge wizard core: validates merge plan files and
//! runs scripted sessions against the in-memory service.

use anyhow::Context;
use std::sync::Arc;
use tracing::{debug, info};

use appmerge::cli::{Cli, Commands};
use appmerge::config::MergePlan;
use appmerge::lock::{format_remaining, LockAlert, ManualClock};
use appmerge::service::{InMemoryMergeService, MergeResults};
use appmerge::sync::SelectionMessage;
use appmerge::types::{MergeRunState, ResourceCategory};
use appmerge::wizard::WizardController;

/// Initialize the tracing subscriber with appropriate settings
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main application entry point
fn main() -> anyhow::Result<()> {
    init_logging();
    info!("appmerge starting up");

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match cli.command {
        Commands::Validate { plan } => {
            info!("Validating merge plan: {:?}", plan);
            match MergePlan::load_from_file(&plan).and_then(|p| p.validate().map(|_| p)) {
                Ok(loaded) => {
                    println!(
                        "✓ Merge plan is valid: {} -> {} ({} item(s))",
                        loaded.source_app,
                        loaded.destination_app,
                        loaded.selections.total()
                    );
                }
                Err(e) => {
                    eprintln!("✗ Merge plan validation failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Simulate {
            plan,
            lock_secs,
            fail_lock,
        } => {
            if let Err(e) = run_simulation(&plan, lock_secs, fail_lock) {
                eprintln!("✗ Simulation failed: {:#}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Drive a full wizard session from a plan file.
///
/// Uses a manually advanced clock so the countdown bands are exercised
/// without wall-clock delays.
fn run_simulation(plan_path: &std::path::Path, lock_secs: u64, fail_lock: bool) -> anyhow::Result<()> {
    let plan = MergePlan::load_from_file(plan_path)?;
    plan.validate().context("Merge plan is invalid")?;

    let clock = Arc::new(ManualClock::new(0));
    let service = Arc::new(InMemoryMergeService::new(clock.clone(), lock_secs * 1000));
    if fail_lock {
        service.fail_next_lock("already-locked");
    }

    let mut wizard =
        WizardController::with_clock(plan.source_app.clone(), service.clone(), clock.clone());

    wizard
        .configure_merge()
        .context("Could not open the destination selector")?;

    if let Err(e) = wizard.select_destination(plan.destination_app.clone()) {
        println!("✗ {}", e.user_message());
        wizard.cancel();
        anyhow::bail!("Locking apps failed: {}", e);
    }
    println!(
        "✓ Apps locked: {} -> {} ({} remaining)",
        plan.source_app,
        plan.destination_app,
        format_remaining(wizard.lock_remaining_ms())
    );

    // Replay the plan's selections the way the configuration tabs would
    for category in ResourceCategory::all() {
        let ids = plan.selections.category(*category).to_vec();
        if !ids.is_empty() {
            wizard.apply_selection(SelectionMessage::SelectionReplaced {
                category: *category,
                ids,
            })?;
        }
    }
    println!("✓ {} item(s) selected for merging", wizard.total_selected());

    let snapshot = wizard.selections().snapshot();
    wizard.request_review(snapshot)?;

    let preview = wizard.preview()?;
    println!(
        "✓ Preview: {} item(s), {} conflict(s)",
        preview.total_items(),
        preview.conflicts()
    );

    let merge_id = wizard.start_merge()?;
    println!("✓ Merge started: {}", merge_id);

    // Let most of the lock window elapse, show the countdown, then extend
    let warn_point_ms = (lock_secs * 1000).saturating_sub(290_000);
    clock.advance(warn_point_ms);
    if let Some(tick) = wizard.lock_tick() {
        println!("  Lock countdown: {} ({:?})", tick.display, tick.alert);
        if tick.alert == LockAlert::Warning || tick.alert == LockAlert::Critical {
            wizard.extend_lock().context("Lock extension failed")?;
            println!(
                "✓ Lock extended ({} remaining)",
                format_remaining(wizard.lock_remaining_ms())
            );
        }
    }

    // The in-memory service needs an explicit nudge to finish the merge
    service.complete_merge(
        &merge_id,
        MergeResults {
            screens: plan.selections.screens.len() as u32,
            data_sources: plan.selections.data_sources.len() as u32,
            files: plan.selections.files.len() as u32,
            configurations: plan.selections.configurations.len() as u32,
            warnings: Vec::new(),
        },
    );

    let status = wizard.merge_status()?;
    anyhow::ensure!(
        status.state == MergeRunState::Completed,
        "Merge did not complete: {}",
        status.state
    );
    for entry in wizard.merge_logs()? {
        debug!("merge log [{}] {}", entry.timestamp, entry.message);
    }

    wizard.complete_merge()?;
    println!(
        "✓ Merge complete, apps unlocked (locked: {})",
        wizard.is_apps_locked()
    );

    Ok(())
}
