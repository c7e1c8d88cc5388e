//! # Media Engine Facade
//!
//! Adapts the native engine's push notifications into a single published
//! [`PlaybackSnapshot`] and exposes the imperative transport surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  EngineEvent   ┌──────────────┐  send_modify  ┌──────────────┐
//! │ MediaEngine  ├───────────────>│ PlayerEngine ├──────────────>│ watch channel│──> UI / session
//! │ (own thread) │                │   reduce()   │               │  (snapshot)  │
//! └──────────────┘                └──────────────┘               └──────────────┘
//! ```
//!
//! The engine listener reconciles each event synchronously on the engine
//! thread and publishes the result with one atomic replace. Optimistic
//! updates from control calls go through the same channel, so readers only
//! ever observe whole snapshots.

use crate::config::EngineOptions;
use crate::error::{PlaybackError, Result};
use crate::snapshot::{reduce, PlaybackSnapshot, TrackListing};
use bridge_traits::{EngineEvent, EngineEventListener, MediaEngine, VideoOutput, VideoSurfaces};
use core_runtime::logging::redact_media_uri;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// Facade over one native engine instance.
pub struct PlayerEngine {
    engine: Arc<dyn MediaEngine>,
    options: EngineOptions,
    state: watch::Sender<PlaybackSnapshot>,
    released: AtomicBool,
    surfaces: Mutex<Option<VideoSurfaces>>,
}

impl PlayerEngine {
    /// Wrap `engine` and register the event listener.
    pub fn new(engine: Arc<dyn MediaEngine>, options: EngineOptions) -> Arc<Self> {
        let (state, _) = watch::channel(PlaybackSnapshot::default());
        let facade = Arc::new(Self {
            engine,
            options,
            state,
            released: AtomicBool::new(false),
            surfaces: Mutex::new(None),
        });

        let weak: Weak<Self> = Arc::downgrade(&facade);
        let listener: EngineEventListener = Arc::new(move |event| {
            if let Some(facade) = weak.upgrade() {
                facade.handle_event(event);
            }
        });
        facade.engine.set_event_listener(Some(listener));

        facade
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Latest published snapshot.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver for the snapshot stream. The current value is marked seen.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.state.subscribe()
    }

    /// Last requested playback rate.
    pub fn rate(&self) -> f32 {
        self.state.borrow().playback_rate
    }

    /// Current time straight from the engine, bypassing the snapshot.
    pub fn current_time_ms(&self) -> i64 {
        if self.is_released() {
            return self.state.borrow().current_time_ms;
        }
        self.engine.time()
    }

    /// Media length straight from the engine, bypassing the snapshot.
    pub fn duration_ms(&self) -> i64 {
        if self.is_released() {
            return self.state.borrow().duration_ms;
        }
        self.engine.length()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    // ========================================================================
    // Event reconciliation
    // ========================================================================

    fn handle_event(&self, event: EngineEvent) {
        if self.is_released() {
            return;
        }

        trace!(event = event.description(), "Engine event");

        // Read the engine before taking the channel lock.
        let listing = event
            .affects_tracks()
            .then(|| TrackListing::read(self.engine.as_ref()));
        let chapter =
            matches!(event, EngineEvent::TimeChanged { .. }).then(|| self.engine.chapter());

        self.state.send_modify(|snapshot| {
            let mut next = reduce(snapshot, &event);
            if let Some(listing) = listing {
                next = next.with_track_listing(listing);
            }
            if let Some(chapter) = chapter {
                next.current_chapter_index = chapter;
            }
            *snapshot = next;
        });
    }

    /// Re-read track and chapter enumeration from the engine.
    pub fn refresh_tracks(&self) -> Result<()> {
        self.ensure_live()?;
        let listing = TrackListing::read(self.engine.as_ref());
        self.state
            .send_modify(|snapshot| *snapshot = snapshot.clone().with_track_listing(listing));
        Ok(())
    }

    // ========================================================================
    // Transport controls
    // ========================================================================

    /// Replace the current media. Resets the snapshot, keeping only the rate.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::Engine`] if the engine cannot open `uri`;
    /// [`PlaybackError::Released`] after [`release`](Self::release).
    pub fn load_media(&self, uri: &str) -> Result<()> {
        self.ensure_live()?;

        let source = self.options.media_source(uri);
        self.engine.open(&source)?;

        self.state
            .send_modify(|snapshot| *snapshot = snapshot.reset_for_load());

        info!(media_key = %redact_media_uri(uri), "Media loaded");
        Ok(())
    }

    /// Request playback. No-op if already playing; `is_playing` flips only
    /// when the engine confirms.
    pub fn play(&self) -> Result<()> {
        self.ensure_live()?;
        if self.state.borrow().is_playing {
            return Ok(());
        }
        self.engine.play()?;
        Ok(())
    }

    /// Request pause. No-op if not playing.
    pub fn pause(&self) -> Result<()> {
        self.ensure_live()?;
        if !self.state.borrow().is_playing {
            return Ok(());
        }
        self.engine.pause();
        Ok(())
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        let is_playing = self.state.borrow().is_playing;
        if is_playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Seek to an absolute time. Range handling is left to the engine.
    pub fn seek_to(&self, time_ms: i64) -> Result<()> {
        self.ensure_live()?;
        self.engine.seek(time_ms);
        Ok(())
    }

    pub fn skip_forward(&self, delta_ms: i64) -> Result<()> {
        let target = {
            let snapshot = self.state.borrow();
            clamp_target(
                snapshot.current_time_ms.saturating_add(delta_ms),
                snapshot.duration_ms,
            )
        };
        self.seek_to(target)
    }

    pub fn skip_backward(&self, delta_ms: i64) -> Result<()> {
        let target = {
            let snapshot = self.state.borrow();
            clamp_target(
                snapshot.current_time_ms.saturating_sub(delta_ms),
                snapshot.duration_ms,
            )
        };
        self.seek_to(target)
    }

    /// Change playback rate. The snapshot reflects it immediately.
    pub fn set_rate(&self, rate: f32) -> Result<()> {
        self.ensure_live()?;
        if !(rate > 0.0) || !rate.is_finite() {
            return Err(PlaybackError::InvalidRate(rate));
        }
        self.engine.set_rate(rate);
        self.state.send_modify(|snapshot| snapshot.playback_rate = rate);
        Ok(())
    }

    pub fn set_audio_track(&self, id: i32) -> Result<()> {
        self.ensure_live()?;
        self.engine.set_audio_track(id);
        self.state
            .send_modify(|snapshot| snapshot.current_audio_track_id = id);
        Ok(())
    }

    /// `-1` disables subtitles.
    pub fn set_subtitle_track(&self, id: i32) -> Result<()> {
        self.ensure_live()?;
        self.engine.set_spu_track(id);
        self.state
            .send_modify(|snapshot| snapshot.current_subtitle_track_id = id);
        Ok(())
    }

    pub fn set_chapter(&self, index: i32) -> Result<()> {
        self.ensure_live()?;
        self.engine.set_chapter(index);
        self.state
            .send_modify(|snapshot| snapshot.current_chapter_index = index);
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        self.ensure_live()?;
        self.engine.stop();
        Ok(())
    }

    /// Tear down the engine. Terminal and idempotent.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        self.engine.set_event_listener(None);
        self.engine.stop();
        if let Some(output) = self.engine.video_output() {
            if output.are_views_attached() {
                output.detach_views();
            }
        }
        self.surfaces.lock().take();
        self.engine.release();

        self.state.send_modify(|snapshot| snapshot.is_playing = false);
        info!("Media engine released");
    }

    // ========================================================================
    // Video output
    // ========================================================================

    /// Remember `surfaces` and attach them if the output has none.
    pub fn attach_surfaces(&self, surfaces: VideoSurfaces) {
        if self.is_released() {
            return;
        }
        *self.surfaces.lock() = Some(surfaces);

        if let Some(output) = self.engine.video_output() {
            if !output.are_views_attached() {
                attach(output.as_ref(), &surfaces);
                if let Some((width, height)) = positive_size(output.as_ref(), &surfaces) {
                    output.set_window_size(width, height);
                }
            }
        }
    }

    /// Re-attach remembered surfaces after the output dropped them
    /// (background, Picture-in-Picture).
    pub fn ensure_surfaces_attached(&self) {
        let Some((output, surfaces)) = self.remembered_output() else {
            return;
        };
        if !output.are_views_attached() {
            debug!("Re-attaching video surfaces");
            attach(output.as_ref(), &surfaces);
        }
    }

    /// Push the current surface size to the output.
    pub fn update_window_size(&self) {
        let Some((output, surfaces)) = self.remembered_output() else {
            return;
        };
        if !output.are_views_attached() {
            return;
        }
        if let Some((width, height)) = positive_size(output.as_ref(), &surfaces) {
            output.set_window_size(width, height);
            output.reset_scaling();
        }
    }

    pub fn detach_surfaces(&self) {
        if self.is_released() {
            return;
        }
        if let Some(output) = self.engine.video_output() {
            if output.are_views_attached() {
                output.detach_views();
            }
        }
        self.surfaces.lock().take();
    }

    /// Re-seek to the current time to nudge A/V resynchronisation.
    pub fn resync_position(&self) {
        if self.is_released() {
            return;
        }
        let current = self.engine.time();
        if current > 0 {
            self.engine.seek(current);
        }
    }

    fn remembered_output(&self) -> Option<(Arc<dyn VideoOutput>, VideoSurfaces)> {
        if self.is_released() {
            return None;
        }
        let surfaces = (*self.surfaces.lock())?;
        let output = self.engine.video_output()?;
        Some((output, surfaces))
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_released() {
            warn!("Control call after release");
            return Err(PlaybackError::Released);
        }
        Ok(())
    }
}

impl Drop for PlayerEngine {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for PlayerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerEngine")
            .field("released", &self.is_released())
            .field("snapshot", &*self.state.borrow())
            .finish()
    }
}

/// Clamp a skip target to `[0, duration]`; only the lower bound applies
/// while the duration is unknown.
fn clamp_target(target_ms: i64, duration_ms: i64) -> i64 {
    let target = target_ms.max(0);
    if duration_ms > 0 {
        target.min(duration_ms)
    } else {
        target
    }
}

fn attach(output: &dyn VideoOutput, surfaces: &VideoSurfaces) {
    output.attach_views(surfaces);
    output.reset_scaling();
}

fn positive_size(output: &dyn VideoOutput, surfaces: &VideoSurfaces) -> Option<(u32, u32)> {
    output
        .surface_size(surfaces.video)
        .filter(|&(width, height)| width > 0 && height > 0)
}
