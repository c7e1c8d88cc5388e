//! App Lifecycle Integration
//!
//! Lets the host report foreground/background transitions so the playback
//! core can flush the resume position before the process may be killed and
//! re-attach video output when the UI comes back.

use crate::{
    error::Result,
    platform::{PlatformSend, PlatformSendSync},
};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Application is in the foreground and active
    Foreground,
    /// Application is in the background (includes Picture-in-Picture hosts
    /// that pause their activity)
    Background,
    /// Application is being suspended
    Suspended,
}

impl LifecycleState {
    /// Returns `true` when unsaved progress should be flushed.
    pub fn should_flush(&self) -> bool {
        matches!(self, LifecycleState::Background | LifecycleState::Suspended)
    }
}

/// Lifecycle observer trait
///
/// - **Android**: Activity `onPause`/`onStop`/`onResume` callbacks
/// - **Desktop**: Window focus/minimize events
#[async_trait::async_trait]
pub trait LifecycleObserver: PlatformSendSync {
    /// Get current lifecycle state
    async fn get_state(&self) -> Result<LifecycleState>;

    /// Subscribe to lifecycle state changes
    async fn subscribe_changes(&self) -> Result<Box<dyn LifecycleChangeStream>>;
}

/// Stream of lifecycle state changes
#[async_trait::async_trait]
pub trait LifecycleChangeStream: PlatformSend {
    /// Get the next lifecycle state update
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<LifecycleState>;
}
