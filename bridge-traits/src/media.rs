//! Media engine bridge traits and supporting types.
//!
//! These abstractions let the playback core drive a native media engine
//! (libVLC on Android) without knowing anything about decoding, demuxing or
//! rendering. The engine is treated as a black box: it is configured through
//! opaque string options, controlled through a small imperative surface, and
//! reports progress by pushing [`EngineEvent`]s to a registered listener.
//!
//! Host applications provide the concrete implementation; tests provide
//! recording fakes.

use crate::{error::Result, platform::PlatformSendSync};
use std::sync::Arc;

/// Description of a media source handed to [`MediaEngine::open`].
///
/// The URI is forwarded verbatim; this layer never parses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    /// Opaque media locator (file path, content URI, HTTP stream, ...).
    pub uri: String,
    /// Per-media engine options (e.g. `:network-caching=1500`).
    pub options: Vec<String>,
    /// Whether the engine should try hardware decoding for this media.
    pub hardware_decoding: bool,
}

impl MediaSource {
    /// Create a source with no extra options and hardware decoding enabled.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            options: Vec::new(),
            hardware_decoding: true,
        }
    }

    /// Append a per-media option.
    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }

    /// Toggle hardware decoding.
    pub fn with_hardware_decoding(mut self, enabled: bool) -> Self {
        self.hardware_decoding = enabled;
        self
    }
}

/// Audio or subtitle track as enumerated by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescription {
    /// Engine-assigned track id. `-1` conventionally means "disabled".
    pub id: i32,
    /// Human readable name, when the container provides one.
    pub name: Option<String>,
}

impl TrackDescription {
    pub fn new(id: i32, name: Option<&str>) -> Self {
        Self {
            id,
            name: name.map(str::to_string),
        }
    }
}

/// Chapter as enumerated by the engine for the current title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDescription {
    pub name: Option<String>,
    pub time_offset_ms: i64,
    pub duration_ms: i64,
}

/// Discrete notification pushed by the engine.
///
/// Events arrive in engine order but categories are independent of each
/// other: a `TimeChanged` may precede `Playing`, `LengthChanged` may arrive at
/// any point, and so on.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Playing,
    Paused,
    Stopped,
    EndReached,
    Buffering { percent: f32 },
    TimeChanged { time_ms: i64 },
    LengthChanged { length_ms: i64 },
    SeekableChanged { seekable: bool },
    /// An elementary stream (audio/video/subtitle track) appeared.
    TrackAdded,
    /// An elementary stream disappeared.
    TrackRemoved,
}

impl EngineEvent {
    /// Returns a short human-readable description of the event.
    pub fn description(&self) -> &'static str {
        match self {
            EngineEvent::Playing => "Playing",
            EngineEvent::Paused => "Paused",
            EngineEvent::Stopped => "Stopped",
            EngineEvent::EndReached => "End reached",
            EngineEvent::Buffering { .. } => "Buffering",
            EngineEvent::TimeChanged { .. } => "Time changed",
            EngineEvent::LengthChanged { .. } => "Length changed",
            EngineEvent::SeekableChanged { .. } => "Seekable changed",
            EngineEvent::TrackAdded => "Track added",
            EngineEvent::TrackRemoved => "Track removed",
        }
    }

    /// Returns `true` for events that change the set of enumerable tracks.
    pub fn affects_tracks(&self) -> bool {
        matches!(
            self,
            EngineEvent::Playing | EngineEvent::TrackAdded | EngineEvent::TrackRemoved
        )
    }
}

/// Callback registered with the engine. Invoked on an engine-owned thread.
pub type EngineEventListener = Arc<dyn Fn(EngineEvent) + Send + Sync>;

/// Opaque handle to a host rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// Surface pair the engine renders into: video plus a subtitle overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSurfaces {
    pub video: SurfaceHandle,
    pub subtitles: SurfaceHandle,
}

/// Video output attached to the engine.
///
/// Surfaces are owned by the host UI and may disappear at any time
/// (background, Picture-in-Picture transitions, rotation).
pub trait VideoOutput: PlatformSendSync {
    /// Whether views are currently attached to the output.
    fn are_views_attached(&self) -> bool;

    /// Attach the given surfaces.
    fn attach_views(&self, surfaces: &VideoSurfaces);

    /// Detach the current surfaces, if any.
    fn detach_views(&self);

    /// Inform the output about the size of the rendering window.
    fn set_window_size(&self, width: u32, height: u32);

    /// Let the engine pick the best-fit scale and aspect ratio.
    fn reset_scaling(&self);

    /// Current size of a host surface, `None` if it is not laid out yet.
    fn surface_size(&self, surface: SurfaceHandle) -> Option<(u32, u32)>;
}

/// Trait for the native media engine the playback core drives.
///
/// Control calls are synchronous requests; their effect is confirmed later
/// through [`EngineEvent`]s delivered to the registered listener.
pub trait MediaEngine: PlatformSendSync {
    /// Register (or clear, with `None`) the event listener.
    fn set_event_listener(&self, listener: Option<EngineEventListener>);

    /// Replace the current media with `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot parse or open the locator.
    fn open(&self, source: &MediaSource) -> Result<()>;

    /// Request playback to start or resume.
    fn play(&self) -> Result<()>;

    /// Request playback to pause.
    fn pause(&self);

    /// Stop playback of the current media.
    fn stop(&self);

    /// Seek to an absolute time. Range handling is up to the engine.
    fn seek(&self, time_ms: i64);

    fn set_rate(&self, rate: f32);

    fn set_audio_track(&self, id: i32);

    /// Select a subtitle (SPU) track; `-1` disables subtitles.
    fn set_spu_track(&self, id: i32);

    fn set_chapter(&self, index: i32);

    /// Current playback time in milliseconds.
    fn time(&self) -> i64;

    /// Media length in milliseconds, `0` when unknown.
    fn length(&self) -> i64;

    fn audio_tracks(&self) -> Vec<TrackDescription>;

    fn spu_tracks(&self) -> Vec<TrackDescription>;

    fn chapters(&self) -> Vec<ChapterDescription>;

    fn audio_track(&self) -> i32;

    fn spu_track(&self) -> i32;

    fn chapter(&self) -> i32;

    /// Video output, when the engine renders video.
    fn video_output(&self) -> Option<Arc<dyn VideoOutput>> {
        None
    }

    /// Release all native resources. No call is valid afterwards.
    fn release(&self);
}
