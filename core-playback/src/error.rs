//! # Playback Error Types
//!
//! Errors surfaced by the engine facade and the session controller.

use bridge_traits::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// The native engine refused to open or start the media.
    #[error("Media engine error: {0}")]
    Engine(#[from] BridgeError),

    // ========================================================================
    // Store Errors
    // ========================================================================
    /// Resume-position persistence failed.
    #[error("Position store error: {0}")]
    Store(#[from] LibraryError),

    // ========================================================================
    // State Errors
    // ========================================================================
    /// Control call issued after the engine was released.
    #[error("Player already released")]
    Released,

    /// Playback rate must be a positive, finite number.
    #[error("Invalid playback rate: {0} (must be > 0)")]
    InvalidRate(f32),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Invalid playback configuration: {0}")]
    InvalidConfig(String),
}

impl PlaybackError {
    /// Returns `true` if the native engine reported the failure.
    pub fn is_engine_error(&self) -> bool {
        matches!(self, PlaybackError::Engine(_))
    }

    /// Returns `true` for persistence failures; playback is unaffected by these.
    pub fn is_store_error(&self) -> bool {
        matches!(self, PlaybackError::Store(_))
    }

    /// Returns `true` if the call was invalid for the player's current state.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, PlaybackError::Released)
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
