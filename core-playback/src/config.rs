//! # Playback Configuration
//!
//! Session policy knobs and the options handed to the native engine.

use bridge_traits::MediaSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Saved positions at or beyond this fraction of the duration are not resumed.
pub const DEFAULT_RESUME_THRESHOLD: f64 = 0.95;

/// Minimum forward progress between two debounced position writes.
pub const DEFAULT_SAVE_INTERVAL_MS: i64 = 5_000;

/// Distance covered by one skip forward/backward.
pub const DEFAULT_SKIP_INTERVAL_MS: i64 = 10_000;

/// Rate applied while the user holds the speed-boost gesture.
pub const DEFAULT_SPEED_BOOST_RATE: f32 = 2.0;

pub const NORMAL_RATE: f32 = 1.0;

/// Saved positions untouched for longer than this are eligible for pruning.
pub const DEFAULT_POSITION_RETENTION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Resume, persistence and gesture policy for a playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackPolicy {
    /// Resume only when `position / duration` is strictly below this value.
    ///
    /// Default: 0.95.
    #[serde(default = "default_resume_threshold")]
    pub resume_threshold: f64,

    /// Debounce interval for periodic position saves, in milliseconds.
    ///
    /// A backward jump always saves immediately regardless of this value.
    ///
    /// Default: 5000.
    #[serde(default = "default_save_interval_ms")]
    pub save_interval_ms: i64,

    /// Skip distance in milliseconds.
    ///
    /// Default: 10000.
    #[serde(default = "default_skip_interval_ms")]
    pub skip_interval_ms: i64,

    /// Rate while the speed-boost gesture is held.
    #[serde(default = "default_speed_boost_rate")]
    pub speed_boost_rate: f32,

    /// Rate restored when the gesture ends.
    #[serde(default = "default_normal_rate")]
    pub normal_rate: f32,

    /// Age after which saved positions may be pruned.
    ///
    /// Default: 30 days.
    #[serde(default = "default_position_retention")]
    pub position_retention: Duration,
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self {
            resume_threshold: default_resume_threshold(),
            save_interval_ms: default_save_interval_ms(),
            skip_interval_ms: default_skip_interval_ms(),
            speed_boost_rate: default_speed_boost_rate(),
            normal_rate: default_normal_rate(),
            position_retention: default_position_retention(),
        }
    }
}

impl PlaybackPolicy {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.resume_threshold > 0.0 && self.resume_threshold <= 1.0) {
            return Err("resume_threshold must be in (0.0, 1.0]".to_string());
        }

        if self.save_interval_ms <= 0 {
            return Err("save_interval_ms must be > 0".to_string());
        }

        if self.skip_interval_ms <= 0 {
            return Err("skip_interval_ms must be > 0".to_string());
        }

        if !(self.speed_boost_rate > 0.0) || !(self.normal_rate > 0.0) {
            return Err("playback rates must be > 0".to_string());
        }

        Ok(())
    }
}

/// Options forwarded opaquely to the native engine.
///
/// `engine_args` are consumed by the host when it creates the engine
/// instance; `media_options` and `hardware_decoding` are applied to every
/// [`MediaSource`] opened through the facade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    #[serde(default = "default_engine_args")]
    pub engine_args: Vec<String>,

    #[serde(default = "default_media_options")]
    pub media_options: Vec<String>,

    #[serde(default = "default_hardware_decoding")]
    pub hardware_decoding: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            engine_args: default_engine_args(),
            media_options: default_media_options(),
            hardware_decoding: default_hardware_decoding(),
        }
    }
}

impl EngineOptions {
    /// Build the source descriptor for `uri` with the per-media options applied.
    pub fn media_source(&self, uri: &str) -> MediaSource {
        self.media_options
            .iter()
            .fold(MediaSource::new(uri), |source, option| {
                source.with_option(option.clone())
            })
            .with_hardware_decoding(self.hardware_decoding)
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_resume_threshold() -> f64 {
    DEFAULT_RESUME_THRESHOLD
}

fn default_save_interval_ms() -> i64 {
    DEFAULT_SAVE_INTERVAL_MS
}

fn default_skip_interval_ms() -> i64 {
    DEFAULT_SKIP_INTERVAL_MS
}

fn default_speed_boost_rate() -> f32 {
    DEFAULT_SPEED_BOOST_RATE
}

fn default_normal_rate() -> f32 {
    NORMAL_RATE
}

fn default_position_retention() -> Duration {
    DEFAULT_POSITION_RETENTION
}

fn default_engine_args() -> Vec<String> {
    [
        "--network-caching=1500",
        "--no-drop-late-frames",
        "--no-skip-frames",
        "--avcodec-skiploopfilter",
        "1",
        "--avcodec-skip-frame",
        "0",
        "--avcodec-skip-idct",
        "0",
        "--android-display-chroma",
        "RV32",
        "--audio-resampler",
        "soxr",
        "--stats",
        "-vv",
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect()
}

fn default_media_options() -> Vec<String> {
    vec![":network-caching=1500".to_string()]
}

fn default_hardware_decoding() -> bool {
    true
}
