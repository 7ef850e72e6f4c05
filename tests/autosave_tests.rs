mod common;

use std::time::Duration;

use common::{editor, run_past_debounce, sample_document, MockBackend};
use memoriasync::{
    FamilyMember, FamilySync, SaveErrorKind, SaveStatus, SyncError, TimelineEvent, TimelineSync,
};

#[tokio::test(start_paused = true)]
async fn a_burst_of_edits_coalesces_into_one_write() {
    let backend = MockBackend::new(sample_document());
    let timeline = editor::<TimelineSync>(&backend);
    timeline.initialize().await.unwrap();

    for (title, year) in [
        ("Born", Some(1941)),
        ("Married", Some(1969)),
        ("Retired", Some(2001)),
    ] {
        timeline
            .add_event(TimelineEvent::new(title, year, ""))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    // Each edit re-armed the window, so nothing fired during the burst.
    assert_eq!(backend.replace_count("timeline").await, 0);

    run_past_debounce().await;
    let payloads = backend.replace_payloads("timeline").await;
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].as_array().unwrap().len(), 3);
    assert!(!timeline.has_unsaved_changes().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn transient_failure_keeps_the_baseline_and_retries() {
    let backend = MockBackend::new(sample_document());
    backend
        .fail_next_replace(SyncError::Transport("connection reset".into()))
        .await;
    let timeline = editor::<TimelineSync>(&backend);
    timeline.initialize().await.unwrap();

    timeline
        .add_event(TimelineEvent::new("Born", Some(1941), ""))
        .await
        .unwrap();

    run_past_debounce().await;
    assert_eq!(backend.replace_count("timeline").await, 1);
    // The write failed: still dirty, error visible.
    assert!(timeline.has_unsaved_changes().await.unwrap());
    assert_eq!(
        timeline.status().await,
        SaveStatus::Error(SaveErrorKind::Transient)
    );

    // The re-armed window fires again and succeeds this time.
    run_past_debounce().await;
    assert_eq!(backend.replace_count("timeline").await, 2);
    assert!(!timeline.has_unsaved_changes().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn missing_credential_failure_schedules_no_retry() {
    let backend = MockBackend::new(sample_document());
    backend
        .fail_next_replace(SyncError::MissingCredential("timeline".into()))
        .await;
    let timeline = editor::<TimelineSync>(&backend);
    timeline.initialize().await.unwrap();

    timeline
        .add_event(TimelineEvent::new("Born", Some(1941), ""))
        .await
        .unwrap();

    run_past_debounce().await;
    assert_eq!(backend.replace_count("timeline").await, 1);
    assert_eq!(
        timeline.status().await,
        SaveStatus::Error(SaveErrorKind::Precondition)
    );

    // No retry, ever, until the host intervenes.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.replace_count("timeline").await, 1);
    assert!(timeline.has_unsaved_changes().await.unwrap());
    // The error indicator itself has reverted by now.
    assert_eq!(timeline.status().await, SaveStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn edits_during_a_flight_trigger_one_trailing_save() {
    let backend = MockBackend::new(sample_document());
    let timeline = editor::<TimelineSync>(&backend);
    timeline.initialize().await.unwrap();

    timeline
        .add_event(TimelineEvent::new("Born", Some(1941), ""))
        .await
        .unwrap();

    // First write departs at ~1.5s and stays in flight for 2s.
    backend.set_replace_delay(Duration::from_secs(2)).await;
    tokio::time::sleep(Duration::from_millis(1600)).await;
    assert_eq!(timeline.status().await, SaveStatus::Saving);

    timeline
        .add_event(TimelineEvent::new("Married", Some(1969), ""))
        .await
        .unwrap();

    // Still in flight: the second edit must not start a parallel write.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.replace_count("timeline").await, 0);

    backend.clear_replace_delay().await;
    tokio::time::sleep(Duration::from_secs(4)).await;
    let payloads = backend.replace_payloads("timeline").await;
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[0].as_array().unwrap().len(), 1);
    assert_eq!(payloads[1].as_array().unwrap().len(), 2);
    assert!(!timeline.has_unsaved_changes().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn pending_records_promote_only_after_a_confirmed_write() {
    let backend = MockBackend::new(sample_document());
    backend
        .fail_next_replace(SyncError::Backend(502))
        .await;
    let timeline = editor::<TimelineSync>(&backend);
    timeline.initialize().await.unwrap();

    let id = timeline
        .add_event(TimelineEvent::new("Born", Some(1941), ""))
        .await
        .unwrap();
    assert!(id.is_pending());

    run_past_debounce().await;
    // The payload always carries the bare token the backend will store.
    let payloads = backend.replace_payloads("timeline").await;
    assert_eq!(payloads[0][0]["id"], id.token());
    // But the failed write must not promote the local record.
    assert!(timeline.state().await.unwrap()[0].id.is_pending());

    run_past_debounce().await;
    let state = timeline.state().await.unwrap();
    assert!(!state[0].id.is_pending());
    assert_eq!(state[0].id.token(), id.token());
}

#[tokio::test(start_paused = true)]
async fn status_walks_saving_success_idle_over_the_watch_channel() {
    let backend = MockBackend::new(sample_document());
    backend.set_replace_delay(Duration::from_millis(500)).await;
    let timeline = editor::<TimelineSync>(&backend);
    timeline.initialize().await.unwrap();

    let mut rx = timeline.subscribe_status();
    timeline
        .add_event(TimelineEvent::new("Born", Some(1941), ""))
        .await
        .unwrap();

    let mut seen = Vec::new();
    while rx.changed().await.is_ok() {
        let status = *rx.borrow();
        seen.push(status);
        if status == SaveStatus::Idle {
            break;
        }
    }
    assert_eq!(
        seen,
        vec![SaveStatus::Saving, SaveStatus::Success, SaveStatus::Idle]
    );
}

#[tokio::test(start_paused = true)]
async fn editors_of_different_collections_save_independently() {
    let backend = MockBackend::new(sample_document());
    let timeline = editor::<TimelineSync>(&backend);
    let family = editor::<FamilySync>(&backend);
    timeline.initialize().await.unwrap();
    family.initialize().await.unwrap();

    timeline
        .add_event(TimelineEvent::new("Born", Some(1941), ""))
        .await
        .unwrap();
    family
        .add_member(FamilyMember::new("Marta", "sister"))
        .await
        .unwrap();

    run_past_debounce().await;
    assert_eq!(backend.replace_count("timeline").await, 1);
    assert_eq!(backend.replace_count("family").await, 1);
}
