//! # Playback Session Controller
//!
//! Owns "what is playing and what should be remembered".
//!
//! ## Session lifecycle
//!
//! ```text
//! load_and_play(uri)
//!   ├─ cancel previous session's tracking
//!   ├─ engine: load_media + play
//!   ├─ spawn tracking task ── snapshot stream ──> PositionTracker ──> PositionWriter
//!   └─ spawn resume task ──── store.get(uri) ──> should_resume? ──> seek once
//! ```
//!
//! A session is replaced, never merged, when another URI (or the same one)
//! is loaded. Ending playback deletes the saved position and stops tracking
//! for that session.
//!
//! Controls are synchronous and may be called from any thread; background
//! work is spawned on the Tokio runtime captured at construction.

use crate::config::PlaybackPolicy;
use crate::engine::PlayerEngine;
use crate::error::{PlaybackError, Result};
use crate::policy::{resume_target, PositionTracker, TrackingAction};
use crate::remote::RemoteActionHandle;
use crate::snapshot::PlaybackSnapshot;
use crate::writer::PositionWriter;
use bridge_traits::{Clock, VideoSurfaces};
use core_library::{PlaybackPosition, PositionRepository};
use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
use core_runtime::logging::redact_media_uri;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Coarse state of the current session, derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Nothing loaded.
    Idle,
    /// Media opened, playback not confirmed yet.
    Loading,
    Playing,
    Paused,
    /// Natural end reached; terminal for this media key's tracking.
    Ended,
    /// Explicitly stopped or shut down.
    Stopped,
}

impl SessionPhase {
    fn from_snapshot(snapshot: &PlaybackSnapshot) -> Self {
        if snapshot.is_ended {
            SessionPhase::Ended
        } else if snapshot.is_playing {
            SessionPhase::Playing
        } else if snapshot.current_time_ms > 0 {
            SessionPhase::Paused
        } else {
            SessionPhase::Loading
        }
    }
}

struct ActiveSession {
    id: Uuid,
    media_key: String,
    cancel: CancellationToken,
    resume_applied: Arc<AtomicBool>,
    /// Cancelled once the resume lookup has finished, applied or not.
    resume_done: CancellationToken,
}

/// Playback session controller.
///
/// Must be created inside a Tokio runtime; the runtime handle is kept for
/// spawning the tracking, resume and writer tasks.
pub struct SessionController {
    engine: Arc<PlayerEngine>,
    store: Arc<dyn PositionRepository>,
    writer: PositionWriter,
    clock: Arc<dyn Clock>,
    policy: PlaybackPolicy,
    events: EventBus,
    runtime: Handle,
    session: Mutex<Option<ActiveSession>>,
    speed_hold: watch::Sender<bool>,
    stopped: AtomicBool,
    shut_down: AtomicBool,
}

impl SessionController {
    /// # Errors
    ///
    /// [`PlaybackError::InvalidConfig`] if `policy` is invalid or no Tokio
    /// runtime is available.
    pub fn new(
        engine: Arc<PlayerEngine>,
        store: Arc<dyn PositionRepository>,
        clock: Arc<dyn Clock>,
        policy: PlaybackPolicy,
        events: EventBus,
    ) -> Result<Self> {
        policy.validate().map_err(PlaybackError::InvalidConfig)?;

        let runtime = Handle::try_current().map_err(|e| {
            PlaybackError::InvalidConfig(format!(
                "SessionController must be created inside a Tokio runtime: {}",
                e
            ))
        })?;

        let (writer, _) = PositionWriter::spawn(&runtime, Arc::clone(&store), events.clone());
        let (speed_hold, _) = watch::channel(false);

        Ok(Self {
            engine,
            store,
            writer,
            clock,
            policy,
            events,
            runtime,
            session: Mutex::new(None),
            speed_hold,
            stopped: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
        })
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Start a new session for `uri`, replacing any current one.
    ///
    /// The previous session's tracking is cancelled before the engine loads
    /// the new media. Its progress is not flushed here; it was persisted
    /// incrementally (call [`save_position_now`](Self::save_position_now)
    /// first to capture the last few seconds).
    ///
    /// # Errors
    ///
    /// [`PlaybackError::Engine`] if the engine rejects the media. No session
    /// is active afterwards.
    pub fn load_and_play(&self, uri: &str) -> Result<()> {
        self.ensure_running()?;

        let mut slot = self.session.lock();
        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
            debug!(session_id = %previous.id, "Cancelled previous session");
        }
        self.stopped.store(false, Ordering::SeqCst);

        let started = self.engine.load_media(uri).and_then(|()| {
            // Subscribe between reset and play so no playback update is missed.
            let rx = self.engine.subscribe();
            self.engine.play().map(|()| rx)
        });
        let rx = match started {
            Ok(rx) => rx,
            Err(e) => {
                error!(media_key = %redact_media_uri(uri), error = %e, "Failed to start playback");
                self.emit(SessionEvent::LoadFailed {
                    media_key: uri.to_string(),
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        let session = ActiveSession {
            id: Uuid::new_v4(),
            media_key: uri.to_string(),
            cancel: CancellationToken::new(),
            resume_applied: Arc::new(AtomicBool::new(false)),
            resume_done: CancellationToken::new(),
        };
        let span = info_span!(
            "session",
            session_id = %session.id,
            media_key = %redact_media_uri(uri)
        );

        self.runtime.spawn(
            track_positions(TrackingContext {
                rx,
                cancel: session.cancel.clone(),
                media_key: session.media_key.clone(),
                tracker: PositionTracker::new(self.policy.save_interval_ms),
                writer: self.writer.clone(),
                clock: Arc::clone(&self.clock),
                events: self.events.clone(),
            })
            .instrument(span.clone()),
        );

        self.runtime.spawn(
            apply_resume(ResumeContext {
                engine: Arc::clone(&self.engine),
                store: Arc::clone(&self.store),
                writer: self.writer.clone(),
                cancel: session.cancel.clone(),
                media_key: session.media_key.clone(),
                threshold: self.policy.resume_threshold,
                resume_applied: Arc::clone(&session.resume_applied),
                done: session.resume_done.clone(),
                events: self.events.clone(),
            })
            .instrument(span),
        );

        info!(
            session_id = %session.id,
            media_key = %redact_media_uri(uri),
            "Playback session started"
        );
        self.emit(SessionEvent::Loaded {
            media_key: session.media_key.clone(),
        });
        *slot = Some(session);
        Ok(())
    }

    /// Persist the latest position for the current media, bypassing the
    /// save interval.
    ///
    /// Fire-and-forget; no-op without an active session or without known
    /// progress. Also skipped once playback has ended: the record was
    /// deleted at end of media and a late save (e.g. on backgrounding)
    /// must not bring it back.
    pub fn save_position_now(&self) {
        let slot = self.session.lock();
        let Some(session) = slot.as_ref() else {
            return;
        };

        let snapshot = self.engine.snapshot();
        if snapshot.is_ended || !snapshot.has_progress() {
            return;
        }

        debug!(
            media_key = %redact_media_uri(&session.media_key),
            position_ms = snapshot.current_time_ms,
            "Forced position save"
        );
        self.writer.upsert(PlaybackPosition::new(
            session.media_key.clone(),
            snapshot.current_time_ms,
            snapshot.duration_ms,
            self.clock.unix_timestamp_millis(),
        ));
    }

    /// Cancel tracking and release the engine. Idempotent.
    ///
    /// Waits for already-queued store writes to be applied.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        self.stopped.store(true, Ordering::SeqCst);
        if let Some(session) = self.session.lock().take() {
            session.cancel.cancel();
        }
        self.speed_hold.send_replace(false);
        self.engine.release();
        self.writer.flush().await;

        info!("Playback session controller shut down");
        self.emit(SessionEvent::Released);
    }

    /// Wait until every queued store write has been applied.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Saved position for `media_key`, after pending writes have landed.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::Store`] if the lookup fails.
    pub async fn saved_position(&self, media_key: &str) -> Result<Option<PlaybackPosition>> {
        self.writer.flush().await;
        Ok(self.store.get(media_key).await?)
    }

    // ========================================================================
    // Speed boost gesture
    // ========================================================================

    pub fn on_speed_hold_start(&self) -> Result<()> {
        self.engine.set_rate(self.policy.speed_boost_rate)?;
        self.speed_hold.send_replace(true);
        Ok(())
    }

    /// Restores the normal rate and lowers the indicator, however many
    /// starts preceded it.
    pub fn on_speed_hold_end(&self) -> Result<()> {
        self.speed_hold.send_replace(false);
        self.engine.set_rate(self.policy.normal_rate)
    }

    // ========================================================================
    // Transport passthroughs
    // ========================================================================

    pub fn play(&self) -> Result<()> {
        self.engine.play()
    }

    pub fn pause(&self) -> Result<()> {
        self.engine.pause()
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.engine.toggle_play_pause()
    }

    pub fn seek_to(&self, time_ms: i64) -> Result<()> {
        self.engine.seek_to(time_ms)
    }

    pub fn skip_forward(&self) -> Result<()> {
        self.engine.skip_forward(self.policy.skip_interval_ms)
    }

    pub fn skip_backward(&self) -> Result<()> {
        self.engine.skip_backward(self.policy.skip_interval_ms)
    }

    pub fn set_rate(&self, rate: f32) -> Result<()> {
        self.engine.set_rate(rate)
    }

    pub fn set_audio_track(&self, id: i32) -> Result<()> {
        self.engine.set_audio_track(id)
    }

    pub fn set_subtitle_track(&self, id: i32) -> Result<()> {
        self.engine.set_subtitle_track(id)
    }

    pub fn set_chapter(&self, index: i32) -> Result<()> {
        self.engine.set_chapter(index)
    }

    pub fn stop(&self) -> Result<()> {
        self.engine.stop()?;
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    // ========================================================================
    // Video output
    // ========================================================================

    pub fn attach_surfaces(&self, surfaces: VideoSurfaces) {
        self.engine.attach_surfaces(surfaces);
    }

    pub fn ensure_surfaces_attached(&self) {
        self.engine.ensure_surfaces_attached();
    }

    pub fn update_window_size(&self) {
        self.engine.update_window_size();
    }

    pub fn detach_surfaces(&self) {
        self.engine.detach_surfaces();
    }

    pub fn resync_position(&self) {
        self.engine.resync_position();
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Snapshot stream for the UI.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.engine.subscribe()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.engine.snapshot()
    }

    /// `true` while the speed-boost gesture is held.
    pub fn speed_indicator(&self) -> watch::Receiver<bool> {
        self.speed_hold.subscribe()
    }

    pub fn is_speed_boosted(&self) -> bool {
        *self.speed_hold.borrow()
    }

    pub fn current_media_key(&self) -> Option<String> {
        self.session
            .lock()
            .as_ref()
            .map(|session| session.media_key.clone())
    }

    /// Whether the saved position was applied for the current session.
    pub fn resume_applied(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|session| session.resume_applied.load(Ordering::SeqCst))
    }

    /// Wait until the current session's saved-position lookup has finished.
    ///
    /// Returns immediately without a session. Completes whether or not a
    /// position was applied.
    pub async fn resume_settled(&self) {
        let done = self
            .session
            .lock()
            .as_ref()
            .map(|session| session.resume_done.clone());
        if let Some(done) = done {
            done.cancelled().await;
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.stopped.load(Ordering::SeqCst) {
            return SessionPhase::Stopped;
        }
        if self.session.lock().is_none() {
            return SessionPhase::Idle;
        }
        SessionPhase::from_snapshot(&self.engine.snapshot())
    }

    /// Handle for out-of-app play/pause actions.
    pub fn remote_actions(&self) -> RemoteActionHandle {
        RemoteActionHandle::new(&self.engine)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn policy(&self) -> &PlaybackPolicy {
        &self.policy
    }

    fn ensure_running(&self) -> Result<()> {
        if self.shut_down.load(Ordering::SeqCst) || self.engine.is_released() {
            return Err(PlaybackError::Released);
        }
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.emit(CoreEvent::Session(event));
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.phase())
            .field("policy", &self.policy)
            .field("writer", &self.writer)
            .finish()
    }
}

// ============================================================================
// Background tasks
// ============================================================================

struct TrackingContext {
    rx: watch::Receiver<PlaybackSnapshot>,
    cancel: CancellationToken,
    media_key: String,
    tracker: PositionTracker,
    writer: PositionWriter,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

async fn track_positions(ctx: TrackingContext) {
    let TrackingContext {
        mut rx,
        cancel,
        media_key,
        mut tracker,
        writer,
        clock,
        events,
    } = ctx;

    debug!("Position tracking started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Position tracking cancelled");
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    debug!("Snapshot stream closed");
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                // A snapshot read after cancellation may already belong to the next media.
                if cancel.is_cancelled() {
                    break;
                }

                match tracker.observe(&snapshot) {
                    TrackingAction::None => {}
                    TrackingAction::Persist { position_ms, duration_ms } => {
                        writer.upsert(PlaybackPosition::new(
                            media_key.clone(),
                            position_ms,
                            duration_ms,
                            clock.unix_timestamp_millis(),
                        ));
                    }
                    TrackingAction::Clear => {
                        info!("Playback reached end; clearing saved position");
                        writer.delete(media_key.clone());
                        let _ = events.emit(CoreEvent::Session(SessionEvent::Ended {
                            media_key: media_key.clone(),
                        }));
                        break;
                    }
                }
            }
        }
    }
}

struct ResumeContext {
    engine: Arc<PlayerEngine>,
    store: Arc<dyn PositionRepository>,
    writer: PositionWriter,
    cancel: CancellationToken,
    media_key: String,
    threshold: f64,
    resume_applied: Arc<AtomicBool>,
    done: CancellationToken,
    events: EventBus,
}

async fn apply_resume(ctx: ResumeContext) {
    let _done = ctx.done.clone().drop_guard();
    // Earlier sessions may still have writes for this key in flight.
    ctx.writer.flush().await;
    if ctx.cancel.is_cancelled() {
        return;
    }

    let record = match ctx.store.get(&ctx.media_key).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            debug!("No saved position");
            return;
        }
        Err(e) => {
            warn!(error = %e, "Saved position lookup failed; starting from the beginning");
            return;
        }
    };

    let Some(target) = resume_target(&record, ctx.threshold) else {
        debug!(
            position_ms = record.position_ms,
            duration_ms = record.duration_ms,
            "Saved position too close to the end; not resuming"
        );
        return;
    };

    if ctx.cancel.is_cancelled() || ctx.resume_applied.swap(true, Ordering::SeqCst) {
        return;
    }

    match ctx.engine.seek_to(target) {
        Ok(()) => {
            info!(position_ms = target, "Resumed from saved position");
            let _ = ctx
                .events
                .emit(CoreEvent::Session(SessionEvent::ResumeApplied {
                    media_key: ctx.media_key,
                    position_ms: target,
                }));
        }
        Err(e) => warn!(error = %e, "Resume seek failed"),
    }
}
