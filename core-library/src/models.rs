//! Domain models for the position store

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Saved resume point for one media key.
///
/// At most one row exists per `media_key`; upserts replace it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PlaybackPosition {
    /// Canonical media locator string
    pub media_key: String,
    pub position_ms: i64,
    /// `0` when the duration was unknown at save time
    pub duration_ms: i64,
    /// Epoch milliseconds of the save
    pub last_played_at_ms: i64,
}

impl PlaybackPosition {
    pub fn new(
        media_key: impl Into<String>,
        position_ms: i64,
        duration_ms: i64,
        last_played_at_ms: i64,
    ) -> Self {
        Self {
            media_key: media_key.into(),
            position_ms,
            duration_ms,
            last_played_at_ms,
        }
    }

    /// Validate record data
    pub fn validate(&self) -> Result<(), String> {
        if self.media_key.is_empty() {
            return Err("Media key cannot be empty".to_string());
        }

        if self.position_ms < 0 {
            return Err("Position cannot be negative".to_string());
        }

        if self.duration_ms < 0 {
            return Err("Duration cannot be negative".to_string());
        }

        Ok(())
    }

    /// Fraction of the media already watched, `None` if duration is unknown.
    pub fn progress_ratio(&self) -> Option<f64> {
        if self.duration_ms > 0 {
            Some(self.position_ms as f64 / self.duration_ms as f64)
        } else {
            None
        }
    }
}
