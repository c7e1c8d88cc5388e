//! Persistence and resume policy.
//!
//! Pure functions, independent of the engine and the store.

use crate::config::{DEFAULT_RESUME_THRESHOLD, DEFAULT_SAVE_INTERVAL_MS};
use crate::snapshot::PlaybackSnapshot;
use core_library::PlaybackPosition;

/// Debounce decision for a signed progress delta since the last save.
///
/// A negative delta (seek backward, restart, or a stray out-of-order time
/// event) always persists. Noisy engines can therefore cause extra writes.
pub fn should_persist(elapsed_ms: i64) -> bool {
    should_persist_with_interval(elapsed_ms, DEFAULT_SAVE_INTERVAL_MS)
}

pub fn should_persist_with_interval(elapsed_ms: i64, interval_ms: i64) -> bool {
    elapsed_ms >= interval_ms || elapsed_ms < 0
}

/// Resume decision for a saved position.
///
/// Strict `<`: a position exactly at the threshold is treated as finished.
pub fn should_resume(position_ms: i64, duration_ms: i64) -> bool {
    should_resume_with_threshold(position_ms, duration_ms, DEFAULT_RESUME_THRESHOLD)
}

pub fn should_resume_with_threshold(position_ms: i64, duration_ms: i64, threshold: f64) -> bool {
    duration_ms > 0 && (position_ms as f64 / duration_ms as f64) < threshold
}

/// Seek target for a saved record, if it should be resumed.
pub fn resume_target(record: &PlaybackPosition, threshold: f64) -> Option<i64> {
    should_resume_with_threshold(record.position_ms, record.duration_ms, threshold)
        .then_some(record.position_ms)
}

/// What the tracking loop should do with one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingAction {
    None,
    Persist { position_ms: i64, duration_ms: i64 },
    /// Playback ended: drop the saved position and stop tracking.
    Clear,
}

/// Per-session debounce state.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    save_interval_ms: i64,
    last_saved_time_ms: i64,
    finished: bool,
}

impl PositionTracker {
    pub fn new(save_interval_ms: i64) -> Self {
        Self {
            save_interval_ms,
            last_saved_time_ms: 0,
            finished: false,
        }
    }

    pub fn last_saved_time_ms(&self) -> i64 {
        self.last_saved_time_ms
    }

    /// `true` once [`TrackingAction::Clear`] has been returned.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn observe(&mut self, snapshot: &PlaybackSnapshot) -> TrackingAction {
        if self.finished {
            return TrackingAction::None;
        }

        if snapshot.is_ended {
            self.finished = true;
            return TrackingAction::Clear;
        }

        if !snapshot.has_progress() {
            return TrackingAction::None;
        }

        let elapsed = snapshot.current_time_ms - self.last_saved_time_ms;
        if !should_persist_with_interval(elapsed, self.save_interval_ms) {
            return TrackingAction::None;
        }

        self.last_saved_time_ms = snapshot.current_time_ms;
        TrackingAction::Persist {
            position_ms: snapshot.current_time_ms,
            duration_ms: snapshot.duration_ms,
        }
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_INTERVAL_MS)
    }
}
