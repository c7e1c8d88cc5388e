//! Workspace façade crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates (`core-service`, `core-playback`, `core-library`). Host applications
//! can depend on `player-workspace` and enable the documented features without
//! wiring each crate individually.

#[cfg(feature = "service")]
pub use core_service as service;

#[cfg(feature = "playback")]
pub use core_playback as playback;

#[cfg(feature = "position-store")]
pub use core_library as library;
