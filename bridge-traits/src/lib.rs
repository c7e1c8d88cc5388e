//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the
//! platform-specific pieces it cannot own: the native media engine, the
//! rendering surfaces, wall-clock time, host logging and app lifecycle.
//!
//! ## Traits
//!
//! ### Media
//! - [`MediaEngine`](media::MediaEngine) - Opaque decode/playback engine (libVLC)
//! - [`VideoOutput`](media::VideoOutput) - Surface attachment for video output
//!
//! ### Platform Integration
//! - [`LifecycleObserver`](background::LifecycleObserver) - App foreground/background transitions
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert native failures into it with enough context (the media
//! locator, the failing call) for the core to report a load failure.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`: engine callbacks arrive on
//! engine-owned threads while control calls come from async tasks.

pub mod background;
pub mod error;
pub mod media;
pub mod platform;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use background::{LifecycleChangeStream, LifecycleObserver, LifecycleState};
pub use media::{
    ChapterDescription, EngineEvent, EngineEventListener, MediaEngine, MediaSource,
    SurfaceHandle, TrackDescription, VideoOutput, VideoSurfaces,
};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
