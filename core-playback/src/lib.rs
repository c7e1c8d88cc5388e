//! # Playback Session Module
//!
//! Drives a native media engine and remembers where each piece of media was
//! left off.
//!
//! ## Overview
//!
//! This module handles:
//! - Reconciling engine notifications into one observable [`PlaybackSnapshot`]
//! - Transport, track and chapter controls through [`PlayerEngine`]
//! - Per-media resume positions: debounced saves, delete on end, seek on reload
//! - The hold-to-speed-up gesture and out-of-app play/pause actions
//!
//! ## Usage
//!
//! ```ignore
//! let engine = PlayerEngine::new(native_engine, EngineOptions::default());
//! let controller = SessionController::new(
//!     engine,
//!     Arc::new(SqlitePositionRepository::from_pool(pool)),
//!     Arc::new(SystemClock),
//!     PlaybackPolicy::default(),
//!     EventBus::default(),
//! )?;
//!
//! controller.load_and_play("https://cdn.example.com/show/ep1.mkv")?;
//! let mut snapshots = controller.subscribe();
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod policy;
pub mod remote;
pub mod session;
pub mod snapshot;
pub mod writer;

pub use config::{
    EngineOptions, PlaybackPolicy, DEFAULT_POSITION_RETENTION, DEFAULT_RESUME_THRESHOLD,
    DEFAULT_SAVE_INTERVAL_MS, DEFAULT_SKIP_INTERVAL_MS, DEFAULT_SPEED_BOOST_RATE, NORMAL_RATE,
};
pub use engine::PlayerEngine;
pub use error::{PlaybackError, Result};
pub use policy::{should_persist, should_resume, PositionTracker, TrackingAction};
pub use remote::RemoteActionHandle;
pub use session::{SessionController, SessionPhase};
pub use snapshot::{ChapterInfo, PlaybackSnapshot, TrackInfo, NO_TRACK};
pub use writer::PositionWriter;
