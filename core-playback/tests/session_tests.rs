//! Session controller tests
//!
//! Drives a [`SessionController`] with a recording engine fake and an
//! in-memory SQLite position store, covering:
//! - Debounced saves and delete-on-end
//! - Resume threshold on reload
//! - Session replacement and cancellation
//! - Speed-boost gesture
//! - Store failures and shutdown

mod common;

use async_trait::async_trait;
use bridge_traits::{EngineEvent, ManualClock};
use common::{settle, Call, FakeEngine};
use core_library::{
    create_test_pool, LibraryError, PlaybackPosition, PositionRepository,
    Result as LibraryResult, SqlitePositionRepository,
};
use core_playback::{
    EngineOptions, PlaybackError, PlaybackPolicy, PlayerEngine, SessionController, SessionPhase,
};
use core_runtime::events::{CoreEvent, EventBus, Receiver, SessionEvent, StoreEvent};
use std::sync::Arc;

const NOW_MS: i64 = 1_700_000_000_000;

struct Harness {
    fake: Arc<FakeEngine>,
    store: Arc<dyn PositionRepository>,
    controller: SessionController,
    events: Receiver<CoreEvent>,
}

async fn harness_with_store(store: Arc<dyn PositionRepository>) -> Harness {
    let fake = FakeEngine::new();
    let engine = PlayerEngine::new(fake.clone(), EngineOptions::default());
    let bus = EventBus::default();
    let events = bus.subscribe();
    let controller = SessionController::new(
        engine,
        Arc::clone(&store),
        Arc::new(ManualClock::new(NOW_MS)),
        PlaybackPolicy::default(),
        bus,
    )
    .unwrap();

    Harness {
        fake,
        store,
        controller,
        events,
    }
}

async fn harness() -> Harness {
    let pool = create_test_pool().await.unwrap();
    harness_with_store(Arc::new(SqlitePositionRepository::from_pool(pool))).await
}

impl Harness {
    async fn advance(&self, time_ms: i64) {
        self.fake.emit(EngineEvent::TimeChanged { time_ms });
        settle().await;
    }

    async fn start(&self, uri: &str, length_ms: i64) {
        self.controller.load_and_play(uri).unwrap();
        self.controller.resume_settled().await;
        self.fake.emit(EngineEvent::Playing);
        self.fake.emit(EngineEvent::LengthChanged { length_ms });
        settle().await;
    }

    fn drain(&mut self) -> Vec<CoreEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            seen.push(event);
        }
        seen
    }

    fn saved_positions(&mut self) -> Vec<i64> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                CoreEvent::Store(StoreEvent::PositionSaved { position_ms, .. }) => {
                    Some(position_ms)
                }
                _ => None,
            })
            .collect()
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_debounced_save_then_clear_on_end() {
    let mut h = harness().await;
    h.start("A", 10_000).await;

    h.advance(1_000).await;
    h.advance(6_000).await;
    h.controller.flush().await;

    assert_eq!(h.saved_positions(), vec![6_000]);
    let saved = h.store.get("A").await.unwrap().unwrap();
    assert_eq!(saved.position_ms, 6_000);
    assert_eq!(saved.duration_ms, 10_000);
    assert_eq!(saved.last_played_at_ms, NOW_MS);

    h.fake.emit(EngineEvent::EndReached);
    settle().await;
    h.advance(7_000).await;
    h.controller.flush().await;

    let events = h.drain();
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, CoreEvent::Store(StoreEvent::PositionCleared { .. })))
            .count(),
        1
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, CoreEvent::Session(SessionEvent::Ended { .. }))));
    assert!(!events
        .iter()
        .any(|e| matches!(e, CoreEvent::Store(StoreEvent::PositionSaved { .. }))));
    assert!(h.store.get("A").await.unwrap().is_none());
    assert_eq!(h.controller.phase(), SessionPhase::Ended);
}

#[tokio::test]
async fn test_backward_jump_saves_immediately() {
    let mut h = harness().await;
    h.start("A", 60_000).await;

    h.advance(20_000).await;
    h.advance(21_000).await;
    h.advance(19_500).await;
    h.controller.flush().await;

    assert_eq!(h.saved_positions(), vec![20_000, 19_500]);
    assert_eq!(h.store.get("A").await.unwrap().unwrap().position_ms, 19_500);
}

#[tokio::test]
async fn test_no_save_without_duration() {
    let mut h = harness().await;
    h.controller.load_and_play("live").unwrap();
    h.fake.emit(EngineEvent::Playing);
    h.advance(30_000).await;
    h.controller.flush().await;

    assert!(h.saved_positions().is_empty());
    assert_eq!(h.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_save_position_now_without_session_is_noop() {
    let mut h = harness().await;
    h.controller.save_position_now();
    h.controller.flush().await;

    assert!(h.saved_positions().is_empty());
    assert_eq!(h.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_save_position_now_bypasses_debounce() {
    let h = harness().await;
    h.start("A", 10_000).await;
    h.advance(2_000).await;

    h.controller.save_position_now();
    h.controller.flush().await;

    assert_eq!(h.store.get("A").await.unwrap().unwrap().position_ms, 2_000);
}

#[tokio::test]
async fn test_save_position_now_after_end_is_noop() {
    let h = harness().await;
    h.start("A", 10_000).await;
    h.advance(9_900).await;
    h.fake.emit(EngineEvent::EndReached);
    settle().await;

    h.controller.save_position_now();
    h.controller.flush().await;

    assert!(h.store.get("A").await.unwrap().is_none());
}

// ============================================================================
// Resume
// ============================================================================

#[tokio::test]
async fn test_resume_skipped_near_end() {
    let mut h = harness().await;
    h.store
        .upsert(&PlaybackPosition::new("B", 9_500, 10_000, 1))
        .await
        .unwrap();

    h.controller.load_and_play("B").unwrap();
    h.controller.resume_settled().await;

    assert!(h.fake.seeks().is_empty());
    assert!(!h.controller.resume_applied());
    assert!(!h
        .drain()
        .iter()
        .any(|e| matches!(e, CoreEvent::Session(SessionEvent::ResumeApplied { .. }))));
}

#[tokio::test]
async fn test_resume_applied_once() {
    let mut h = harness().await;
    h.store
        .upsert(&PlaybackPosition::new("B", 9_400, 10_000, 1))
        .await
        .unwrap();

    h.controller.load_and_play("B").unwrap();
    h.controller.resume_settled().await;
    h.fake.emit(EngineEvent::Playing);
    h.fake.emit(EngineEvent::LengthChanged { length_ms: 10_000 });
    settle().await;

    assert_eq!(h.fake.seeks(), vec![9_400]);
    assert!(h.controller.resume_applied());
    assert!(h.drain().iter().any(|e| matches!(
        e,
        CoreEvent::Session(SessionEvent::ResumeApplied { position_ms: 9_400, .. })
    )));
}

#[tokio::test]
async fn test_reload_same_media_resumes_from_last_save() {
    let h = harness().await;
    h.start("A", 60_000).await;
    h.advance(12_000).await;

    h.controller.load_and_play("A").unwrap();
    h.controller.resume_settled().await;

    assert_eq!(h.fake.seeks(), vec![12_000]);
}

// ============================================================================
// Session replacement
// ============================================================================

#[tokio::test]
async fn test_reload_cancels_previous_tracking() {
    let h = harness().await;
    h.start("A", 60_000).await;
    h.advance(6_000).await;

    h.start("B", 60_000).await;
    h.advance(20_000).await;
    h.controller.flush().await;

    assert_eq!(h.store.get("A").await.unwrap().unwrap().position_ms, 6_000);
    assert_eq!(h.store.get("B").await.unwrap().unwrap().position_ms, 20_000);
    assert_eq!(h.controller.current_media_key().as_deref(), Some("B"));
}

#[tokio::test]
async fn test_snapshot_reset_on_load_keeps_rate() {
    let h = harness().await;
    h.start("A", 60_000).await;
    h.advance(6_000).await;
    h.controller.set_rate(1.5).unwrap();

    h.controller.load_and_play("B").unwrap();
    let snapshot = h.controller.snapshot();

    assert_eq!(snapshot.current_time_ms, 0);
    assert_eq!(snapshot.duration_ms, 0);
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.playback_rate, 1.5);
}

#[tokio::test]
async fn test_load_failure_leaves_no_session() {
    let mut h = harness().await;
    h.fake.fail_next_open();

    let err = h.controller.load_and_play("bogus://x").unwrap_err();

    assert!(err.is_engine_error());
    assert_eq!(h.controller.current_media_key(), None);
    assert_eq!(h.controller.phase(), SessionPhase::Idle);
    assert!(h
        .drain()
        .iter()
        .any(|e| matches!(e, CoreEvent::Session(SessionEvent::LoadFailed { .. }))));
}

#[tokio::test]
async fn test_media_options_forwarded_on_open() {
    let h = harness().await;
    h.controller.load_and_play("https://cdn/x.mkv").unwrap();

    let opened = h.fake.calls().into_iter().find_map(|call| match call {
        Call::Open(source) => Some(source),
        _ => None,
    });
    let source = opened.unwrap();
    assert_eq!(source.uri, "https://cdn/x.mkv");
    assert!(source.options.contains(&":network-caching=1500".to_string()));
    assert!(source.hardware_decoding);
}

// ============================================================================
// Controls
// ============================================================================

#[tokio::test]
async fn test_phase_transitions() {
    let h = harness().await;
    assert_eq!(h.controller.phase(), SessionPhase::Idle);

    h.controller.load_and_play("A").unwrap();
    assert_eq!(h.controller.phase(), SessionPhase::Loading);

    h.fake.emit(EngineEvent::Playing);
    assert_eq!(h.controller.phase(), SessionPhase::Playing);

    h.fake.emit(EngineEvent::TimeChanged { time_ms: 3_000 });
    h.fake.emit(EngineEvent::Paused);
    assert_eq!(h.controller.phase(), SessionPhase::Paused);

    h.controller.stop().unwrap();
    assert_eq!(h.controller.phase(), SessionPhase::Stopped);
}

#[tokio::test]
async fn test_skip_uses_policy_interval() {
    let h = harness().await;
    h.start("A", 60_000).await;
    h.advance(5_000).await;

    h.controller.skip_forward().unwrap();
    h.controller.skip_backward().unwrap();

    assert_eq!(h.fake.seeks(), vec![15_000, 0]);
}

#[tokio::test]
async fn test_speed_hold_end_always_wins() {
    let h = harness().await;
    h.start("A", 60_000).await;
    let indicator = h.controller.speed_indicator();

    h.controller.on_speed_hold_start().unwrap();
    assert!(*indicator.borrow());
    assert_eq!(h.controller.snapshot().playback_rate, 2.0);

    h.controller.on_speed_hold_start().unwrap();
    h.controller.on_speed_hold_end().unwrap();

    assert!(!*indicator.borrow());
    assert!(!h.controller.is_speed_boosted());
    assert_eq!(h.controller.snapshot().playback_rate, 1.0);
    assert_eq!(h.fake.calls().last(), Some(&Call::SetRate(1.0)));
}

#[tokio::test]
async fn test_invalid_rate_rejected() {
    let h = harness().await;
    assert!(matches!(
        h.controller.set_rate(0.0),
        Err(PlaybackError::InvalidRate(_))
    ));
    assert!(matches!(
        h.controller.set_rate(f32::NAN),
        Err(PlaybackError::InvalidRate(_))
    ));
    assert_eq!(h.fake.count(&Call::SetRate(0.0)), 0);
}

#[tokio::test]
async fn test_remote_toggle_routes_to_engine() {
    let h = harness().await;
    h.controller.load_and_play("A").unwrap();
    let remote = h.controller.remote_actions();
    assert!(remote.is_connected());

    h.fake.emit(EngineEvent::Playing);
    assert!(remote.toggle_play());
    assert_eq!(h.fake.count(&Call::Pause), 1);

    h.fake.emit(EngineEvent::Paused);
    assert!(remote.toggle_play());
    assert_eq!(h.fake.count(&Call::Play), 2);
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_shutdown_is_terminal_and_idempotent() {
    let mut h = harness().await;
    h.start("A", 60_000).await;
    let remote = h.controller.remote_actions();

    h.controller.shutdown().await;
    h.controller.shutdown().await;

    assert_eq!(h.fake.count(&Call::Release), 1);
    assert!(!h.fake.has_listener());
    assert!(!remote.is_connected());
    assert!(!remote.toggle_play());
    assert!(matches!(h.controller.play(), Err(PlaybackError::Released)));
    assert!(matches!(
        h.controller.load_and_play("B"),
        Err(PlaybackError::Released)
    ));
    assert_eq!(h.controller.phase(), SessionPhase::Stopped);

    let released = h
        .drain()
        .into_iter()
        .filter(|e| matches!(e, CoreEvent::Session(SessionEvent::Released)))
        .count();
    assert_eq!(released, 1);
}

#[tokio::test]
async fn test_remote_handle_outlived_by_nothing() {
    let h = harness().await;
    let remote = h.controller.remote_actions();
    drop(h);

    assert!(!remote.is_connected());
    assert!(!remote.toggle_play());
}

// ============================================================================
// Store failures
// ============================================================================

struct FailingStore;

#[async_trait]
impl PositionRepository for FailingStore {
    async fn get(&self, _media_key: &str) -> LibraryResult<Option<PlaybackPosition>> {
        Err(LibraryError::Migration("database is locked".to_string()))
    }

    async fn upsert(&self, _record: &PlaybackPosition) -> LibraryResult<()> {
        Err(LibraryError::Migration("disk full".to_string()))
    }

    async fn delete(&self, _media_key: &str) -> LibraryResult<bool> {
        Err(LibraryError::Migration("disk full".to_string()))
    }

    async fn prune_older_than(&self, _threshold_ms: i64) -> LibraryResult<u64> {
        Ok(0)
    }

    async fn count(&self) -> LibraryResult<i64> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_store_failures_do_not_interrupt_playback() {
    let mut h = harness_with_store(Arc::new(FailingStore)).await;
    h.start("A", 60_000).await;
    h.advance(10_000).await;
    h.controller.flush().await;

    assert!(h.fake.seeks().is_empty());
    h.controller.pause().unwrap();
    h.controller.seek_to(30_000).unwrap();
    assert_eq!(h.fake.seeks(), vec![30_000]);

    let failures: Vec<_> = h
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            CoreEvent::Store(StoreEvent::WriteFailed { operation, .. }) => Some(operation),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec!["upsert".to_string()]);
}

#[tokio::test]
async fn test_saved_position_lookup_surfaces_store_errors() {
    let h = harness_with_store(Arc::new(FailingStore)).await;

    let err = h.controller.saved_position("A").await.unwrap_err();
    assert!(err.is_store_error());
}

#[tokio::test]
async fn test_saved_position_sees_pending_writes() {
    let h = harness().await;
    h.start("A", 60_000).await;
    h.advance(2_000).await;
    h.controller.save_position_now();

    let saved = h.controller.saved_position("A").await.unwrap().unwrap();
    assert_eq!(saved.position_ms, 2_000);
}

#[tokio::test]
async fn test_invalid_policy_rejected() {
    let fake = FakeEngine::new();
    let engine = PlayerEngine::new(fake, EngineOptions::default());
    let pool = create_test_pool().await.unwrap();
    let policy = PlaybackPolicy {
        resume_threshold: 1.5,
        ..Default::default()
    };

    let result = SessionController::new(
        engine,
        Arc::new(SqlitePositionRepository::from_pool(pool)),
        Arc::new(ManualClock::new(NOW_MS)),
        policy,
        EventBus::default(),
    );

    assert!(matches!(result, Err(PlaybackError::InvalidConfig(_))));
}
