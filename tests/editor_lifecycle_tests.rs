mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{editor, run_past_debounce, sample_document, MockBackend};
use memoriasync::{
    EditorPhase, FavoritesSync, InitializeOutcome, RecordId, SyncError, TimelineEvent,
    TimelineSync,
};

#[tokio::test(start_paused = true)]
async fn initialize_loads_the_snapshot_and_enables_editing() {
    let mut document = sample_document();
    document
        .timeline
        .push(TimelineEvent::new("Born in Seville", Some(1941), ""));
    let backend = MockBackend::new(document);
    let timeline = editor::<TimelineSync>(&backend);

    assert_eq!(timeline.phase().await, EditorPhase::Uninitialized);
    assert_eq!(
        timeline.initialize().await.unwrap(),
        InitializeOutcome::Loaded
    );
    assert_eq!(timeline.phase().await, EditorPhase::Ready);
    assert_eq!(backend.fetch_count().await, 1);

    let state = timeline.state().await.unwrap();
    assert_eq!(state.len(), 1);
    assert_eq!(state[0].title, "Born in Seville");

    timeline
        .add_event(TimelineEvent::new("Moved to Madrid", Some(1963), ""))
        .await
        .unwrap();
    assert!(timeline.has_unsaved_changes().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn mutations_before_ready_are_rejected() {
    let backend = MockBackend::new(sample_document());
    let timeline = editor::<TimelineSync>(&backend);

    let err = timeline
        .add_event(TimelineEvent::new("Too early", None, ""))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotReady(_)));
}

#[tokio::test(start_paused = true)]
async fn a_late_initialize_never_clobbers_local_edits() {
    let backend = MockBackend::new(sample_document());
    let timeline = editor::<TimelineSync>(&backend);
    timeline.initialize().await.unwrap();

    timeline
        .add_event(TimelineEvent::new("Graduated", Some(1959), ""))
        .await
        .unwrap();

    // e.g. a remount re-running the setup path.
    assert_eq!(
        timeline.initialize().await.unwrap(),
        InitializeOutcome::AlreadyReady
    );
    assert_eq!(backend.fetch_count().await, 1);

    let state = timeline.state().await.unwrap();
    assert_eq!(state.len(), 1);
    assert_eq!(state[0].title, "Graduated");
}

#[tokio::test(start_paused = true)]
async fn initialize_racing_an_in_flight_fetch_is_rejected() {
    let backend = MockBackend::new(sample_document());
    backend.set_fetch_delay(Duration::from_secs(5)).await;
    let timeline = Arc::new(editor::<TimelineSync>(&backend));

    let first = tokio::spawn({
        let timeline = timeline.clone();
        async move { timeline.initialize().await }
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    let err = timeline.initialize().await.unwrap_err();
    assert!(matches!(err, SyncError::InitializeInFlight(_)));

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(first.await.unwrap().unwrap(), InitializeOutcome::Loaded);
    assert_eq!(timeline.phase().await, EditorPhase::Ready);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_leaves_the_editor_retryable() {
    let backend = MockBackend::new(sample_document());
    backend
        .fail_next_fetch(SyncError::Transport("dns failure".into()))
        .await;
    let timeline = editor::<TimelineSync>(&backend);

    assert!(timeline.initialize().await.is_err());
    assert_eq!(timeline.phase().await, EditorPhase::Uninitialized);

    assert_eq!(
        timeline.initialize().await.unwrap(),
        InitializeOutcome::Loaded
    );
    assert_eq!(timeline.phase().await, EditorPhase::Ready);
}

#[tokio::test(start_paused = true)]
async fn untouched_snapshot_never_saves() {
    let backend = MockBackend::new(sample_document());
    let timeline = editor::<TimelineSync>(&backend);
    timeline.initialize().await.unwrap();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.replace_count("timeline").await, 0);
}

#[tokio::test(start_paused = true)]
async fn close_cancels_a_pending_autosave() {
    let backend = MockBackend::new(sample_document());
    let timeline = editor::<TimelineSync>(&backend);
    timeline.initialize().await.unwrap();

    timeline
        .add_event(TimelineEvent::new("Born", Some(1941), ""))
        .await
        .unwrap();
    timeline.close().await.unwrap();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.replace_count("timeline").await, 0);
}

#[tokio::test(start_paused = true)]
async fn legacy_snapshot_is_healed_and_persisted() {
    let mut document = sample_document();
    document.favorites.push(memoriasync::Favorite {
        id: RecordId::persisted("f1"),
        category: "🎵".into(),
        question: "Favorite song?".into(),
        answer: "Gracias a la Vida".into(),
    });
    let backend = MockBackend::new(document);
    let favorites = editor::<FavoritesSync>(&backend);
    favorites.initialize().await.unwrap();

    // The heal is due immediately; one worker heartbeat picks it up.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let payloads = backend.replace_payloads("favorites").await;
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0][0]["category"], "music");
    assert!(!favorites.has_unsaved_changes().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn failed_heal_write_stays_dirty_and_retries() {
    let mut document = sample_document();
    document.favorites.push(memoriasync::Favorite {
        id: RecordId::persisted("f1"),
        category: "📚".into(),
        question: "Favorite book?".into(),
        answer: "Cien años de soledad".into(),
    });
    let backend = MockBackend::new(document);
    backend
        .fail_next_replace(SyncError::Backend(503))
        .await;
    let favorites = editor::<FavoritesSync>(&backend);
    favorites.initialize().await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.replace_count("favorites").await, 1);
    assert!(favorites.has_unsaved_changes().await.unwrap());

    // The re-armed window retries and the heal lands.
    run_past_debounce().await;
    assert_eq!(backend.replace_count("favorites").await, 2);
    assert!(!favorites.has_unsaved_changes().await.unwrap());
}
