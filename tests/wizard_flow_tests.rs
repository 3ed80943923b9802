// Integration tests for the merge wizard session
//
// These tests drive complete wizard sessions through the public API against
// the in-memory merge service with a manually advanced clock:
// - The happy path from dashboard to completion
// - Error and cancel paths, which must always unlock
// - Lock countdown, extension and expiry behavior
// - Step/view consistency across every reachable state

use std::sync::Arc;

use appmerge::lock::{LockAlert, ManualClock};
use appmerge::service::{InMemoryMergeService, MergeResults};
use appmerge::sync::SelectionMessage;
use appmerge::types::{AppRef, MergeRunState, ResourceCategory, ResourceId};
use appmerge::wizard::{WizardController, WizardView};
use appmerge::service::MergeService;
use appmerge::MergeWizardError;

const LOCK_DURATION_MS: u64 = 600_000;

fn session() -> (Arc<ManualClock>, Arc<InMemoryMergeService>, WizardController) {
    let clock = Arc::new(ManualClock::new(0));
    let service = Arc::new(InMemoryMergeService::new(clock.clone(), LOCK_DURATION_MS));
    let wizard = WizardController::with_clock(
        AppRef::new(123, "Sales CRM"),
        service.clone(),
        clock.clone(),
    );
    (clock, service, wizard)
}

fn assert_dashboard_invariant(wizard: &WizardController) {
    if wizard.view() == WizardView::Dashboard {
        assert!(
            !wizard.is_apps_locked(),
            "Apps must never be locked while on the dashboard"
        );
    }
}

#[test]
fn test_end_to_end_merge_session() {
    let (_clock, service, mut wizard) = session();

    // Dashboard -> destination selector
    wizard.configure_merge().expect("configure merge");
    assert_eq!(wizard.view(), WizardView::DestinationSelector);
    assert_eq!(wizard.step(), 1);

    // Confirm destination; lock succeeds
    wizard
        .select_destination(AppRef::new(456, "Support Desk"))
        .expect("select destination");
    assert_eq!(wizard.view(), WizardView::Configuration);
    assert!(wizard.is_apps_locked());
    assert!(service.is_pair_locked(123, 456));

    // Three items: two screens directly, one data source via association
    wizard
        .apply_selection(SelectionMessage::SelectionReplaced {
            category: ResourceCategory::Screens,
            ids: vec![1.into(), 2.into()],
        })
        .expect("screen selection");
    wizard
        .apply_selection(SelectionMessage::AssociationToggled {
            category: ResourceCategory::DataSources,
            id: 10.into(),
            selected: true,
        })
        .expect("association toggle");
    assert_eq!(wizard.total_selected(), 3);

    // Review and start
    let snapshot = wizard.selections().snapshot();
    wizard.request_review(snapshot).expect("review");
    assert_eq!(wizard.step(), 3);
    let merge_id = wizard.start_merge().expect("start merge");
    assert_eq!(wizard.view(), WizardView::Progress);

    // Remote finishes; wizard completes
    service.complete_merge(
        &merge_id,
        MergeResults {
            screens: 2,
            data_sources: 1,
            ..Default::default()
        },
    );
    let status = wizard.merge_status().expect("status");
    assert_eq!(status.state, MergeRunState::Completed);
    wizard.complete_merge().expect("complete");

    assert_eq!(wizard.view(), WizardView::Complete);
    assert_eq!(wizard.step(), 5);
    assert!(!wizard.is_apps_locked());
    assert!(!service.is_pair_locked(123, 456));
    assert!(wizard.selected_destination().is_none());
    assert_eq!(wizard.total_selected(), 0);
    assert!(wizard.merge_configuration().is_empty());
}

#[test]
fn test_step_matches_view_through_whole_flow() {
    let (_clock, service, mut wizard) = session();

    let check = |wizard: &WizardController| {
        assert_eq!(wizard.step(), wizard.view().step());
        assert_eq!(wizard.page_title(), wizard.view().title());
        assert_dashboard_invariant(wizard);
    };

    check(&wizard);
    wizard.configure_merge().expect("configure");
    check(&wizard);
    wizard
        .select_destination(AppRef::new(456, "Support Desk"))
        .expect("select");
    check(&wizard);
    wizard
        .apply_selection(SelectionMessage::SelectionReplaced {
            category: ResourceCategory::Files,
            ids: vec![7.into()],
        })
        .expect("selection");
    let snapshot = wizard.selections().snapshot();
    wizard.request_review(snapshot).expect("review");
    check(&wizard);
    wizard.back_to_configuration().expect("back");
    check(&wizard);
    let snapshot = wizard.selections().snapshot();
    wizard.request_review(snapshot).expect("review again");
    let merge_id = wizard.start_merge().expect("start");
    check(&wizard);
    service.complete_merge(&merge_id, MergeResults::default());
    wizard.complete_merge().expect("complete");
    check(&wizard);
}

#[test]
fn test_review_roundtrip_is_lossless() {
    let (_clock, _service, mut wizard) = session();
    wizard.configure_merge().expect("configure");
    wizard
        .select_destination(AppRef::new(456, "Support Desk"))
        .expect("select");

    wizard
        .apply_selection(SelectionMessage::SelectionReplaced {
            category: ResourceCategory::Screens,
            ids: vec![1.into(), 2.into()],
        })
        .expect("screens");
    wizard
        .apply_selection(SelectionMessage::SelectionReplaced {
            category: ResourceCategory::DataSources,
            ids: vec![10.into()],
        })
        .expect("data sources");

    let submitted = wizard.selections().snapshot();
    wizard.request_review(submitted.clone()).expect("review");
    wizard.back_to_configuration().expect("back");

    // The stored configuration must be deeply equal after the round trip
    assert_eq!(wizard.merge_configuration(), &submitted);
    assert_eq!(
        wizard.merge_configuration().screens,
        vec![ResourceId::from(1), ResourceId::from(2)]
    );
    assert_eq!(
        wizard.merge_configuration().data_sources,
        vec![ResourceId::from(10)]
    );

    // And the live selection sets were not disturbed either
    assert_eq!(wizard.selections().snapshot(), submitted);
}

#[test]
fn test_merge_error_from_progress_unlocks_and_resets() {
    let (_clock, service, mut wizard) = session();
    wizard.configure_merge().expect("configure");
    wizard
        .select_destination(AppRef::new(456, "Support Desk"))
        .expect("select");
    wizard
        .apply_selection(SelectionMessage::SelectionReplaced {
            category: ResourceCategory::Screens,
            ids: vec![1.into()],
        })
        .expect("selection");
    let snapshot = wizard.selections().snapshot();
    wizard.request_review(snapshot).expect("review");
    wizard.start_merge().expect("start");
    assert!(wizard.is_apps_locked());

    wizard.merge_errored(MergeWizardError::server("merge-failed"));

    assert_eq!(wizard.view(), WizardView::Dashboard);
    assert_eq!(wizard.step(), 0);
    assert!(!wizard.is_apps_locked());
    assert!(!service.is_pair_locked(123, 456));
    assert_eq!(
        wizard.last_error(),
        Some("The server reported that the merge failed.")
    );
    assert_dashboard_invariant(&wizard);
}

#[test]
fn test_failed_lock_acquisition_surfaces_and_stays_put() {
    let (_clock, service, mut wizard) = session();
    wizard.configure_merge().expect("configure");

    // Another holder owns the pair
    service.lock_apps(99, 456).expect("other holder lock");
    service.fail_next_lock("already-locked");

    let err = wizard
        .select_destination(AppRef::new(456, "Support Desk"))
        .unwrap_err();
    assert!(matches!(err, MergeWizardError::Lock(_)));
    assert!(err.user_message().contains("Another user"));
    assert_eq!(wizard.view(), WizardView::DestinationSelector);
    assert!(!wizard.is_apps_locked());
}

#[test]
fn test_cancel_from_deep_in_the_wizard() {
    let (_clock, service, mut wizard) = session();
    wizard.configure_merge().expect("configure");
    wizard
        .select_destination(AppRef::new(456, "Support Desk"))
        .expect("select");
    wizard
        .apply_selection(SelectionMessage::SelectionReplaced {
            category: ResourceCategory::Settings,
            ids: vec!["date_format".into(), "currency".into()],
        })
        .expect("selection");
    let snapshot = wizard.selections().snapshot();
    wizard.request_review(snapshot).expect("review");

    wizard.cancel();

    assert_eq!(wizard.view(), WizardView::Dashboard);
    assert!(!wizard.is_apps_locked());
    assert!(!service.is_pair_locked(123, 456));
    assert!(wizard.selected_destination().is_none());
    assert_eq!(wizard.total_selected(), 0);
    assert!(wizard.merge_configuration().is_empty());
    assert_dashboard_invariant(&wizard);
}

#[test]
fn test_lock_expiry_event_fires_exactly_once() {
    let clock = Arc::new(ManualClock::new(0));
    let service = Arc::new(InMemoryMergeService::new(clock.clone(), 2_000));
    let mut wizard = WizardController::with_clock(
        AppRef::new(123, "Sales CRM"),
        service,
        clock.clone(),
    );
    wizard.configure_merge().expect("configure");
    wizard
        .select_destination(AppRef::new(456, "Support Desk"))
        .expect("select");

    clock.advance(3_000);

    let mut expired = 0;
    for _ in 0..4 {
        if let Some(tick) = wizard.lock_tick() {
            assert_eq!(tick.alert, LockAlert::Expired);
            assert_eq!(tick.remaining_ms, 0);
            expired += 1;
        }
    }
    assert_eq!(expired, 1, "Expiry must be reported exactly once");

    // Host routes the expiry through the error path
    wizard.merge_errored(MergeWizardError::lock("lock-expired"));
    assert_eq!(wizard.view(), WizardView::Dashboard);
    assert!(!wizard.is_apps_locked());
}

#[test]
fn test_countdown_warning_extend_cycle() {
    let (clock, _service, mut wizard) = session();
    wizard.configure_merge().expect("configure");
    wizard
        .select_destination(AppRef::new(456, "Support Desk"))
        .expect("select");

    // Run down into the warning band
    clock.advance(LOCK_DURATION_MS - 290_000);
    let tick = wizard.lock_tick().expect("tick");
    assert_eq!(tick.alert, LockAlert::Warning);
    assert_eq!(tick.display, "4 minutes 50 seconds");

    // Extending pushes the countdown back out of the band
    wizard.extend_lock().expect("extend");
    let tick = wizard.lock_tick().expect("tick");
    assert_eq!(tick.alert, LockAlert::None);
    assert_eq!(wizard.lock_remaining_ms(), LOCK_DURATION_MS);
}

#[test]
fn test_teardown_mid_session_releases_lock() {
    let (_clock, service, mut wizard) = session();
    wizard.configure_merge().expect("configure");
    wizard
        .select_destination(AppRef::new(456, "Support Desk"))
        .expect("select");
    assert!(service.is_pair_locked(123, 456));

    // Session object goes away with the lock still held
    drop(wizard);
    assert!(!service.is_pair_locked(123, 456));
    assert_eq!(service.unlock_count(), 1);
}

#[test]
fn test_unlock_failure_does_not_block_cancel() {
    let (_clock, service, mut wizard) = session();
    wizard.configure_merge().expect("configure");
    wizard
        .select_destination(AppRef::new(456, "Support Desk"))
        .expect("select");
    service.fail_next_unlock("network-down");

    wizard.cancel();

    // The view transition completed despite the failed release
    assert_eq!(wizard.view(), WizardView::Dashboard);
    assert!(!wizard.is_apps_locked());
    assert_dashboard_invariant(&wizard);
}

#[test]
fn test_preview_reflects_submitted_configuration() {
    let (_clock, _service, mut wizard) = session();
    wizard.configure_merge().expect("configure");
    wizard
        .select_destination(AppRef::new(456, "Support Desk"))
        .expect("select");
    wizard
        .apply_selection(SelectionMessage::SelectionReplaced {
            category: ResourceCategory::Screens,
            ids: vec![1.into(), 2.into()],
        })
        .expect("selection");
    let snapshot = wizard.selections().snapshot();
    wizard.request_review(snapshot).expect("review");

    let preview = wizard.preview().expect("preview");
    assert_eq!(preview.total_items(), 2);
    assert_eq!(preview.category(ResourceCategory::Screens).len(), 2);
}

#[test]
fn test_second_session_can_lock_after_first_completes() {
    let (_clock, service, mut wizard) = session();
    wizard.configure_merge().expect("configure");
    wizard
        .select_destination(AppRef::new(456, "Support Desk"))
        .expect("select");
    wizard
        .apply_selection(SelectionMessage::SelectionReplaced {
            category: ResourceCategory::Screens,
            ids: vec![1.into()],
        })
        .expect("selection");
    let snapshot = wizard.selections().snapshot();
    wizard.request_review(snapshot).expect("review");
    let merge_id = wizard.start_merge().expect("start");
    service.complete_merge(&merge_id, MergeResults::default());
    wizard.complete_merge().expect("complete");

    // A fresh session for the same pair locks without contention
    let clock2 = Arc::new(ManualClock::new(0));
    let mut second = WizardController::with_clock(
        AppRef::new(123, "Sales CRM"),
        service.clone(),
        clock2,
    );
    second.configure_merge().expect("configure");
    second
        .select_destination(AppRef::new(456, "Support Desk"))
        .expect("select");
    assert!(second.is_apps_locked());
}
