//! Remote play/pause handle for platform collaborators.
//!
//! Handed to whatever delivers out-of-app actions (Picture-in-Picture
//! buttons, media notifications). Holds only a weak reference, so a stale
//! handle never keeps the engine alive and becomes a no-op once the session
//! controller is gone or the engine is released.

use crate::engine::PlayerEngine;
use std::sync::{Arc, Weak};
use tracing::debug;

#[derive(Clone)]
pub struct RemoteActionHandle {
    engine: Weak<PlayerEngine>,
}

impl RemoteActionHandle {
    pub(crate) fn new(engine: &Arc<PlayerEngine>) -> Self {
        Self {
            engine: Arc::downgrade(engine),
        }
    }

    /// Toggle play/pause. Returns `false` if the action could not be delivered.
    pub fn toggle_play(&self) -> bool {
        let Some(engine) = self.engine.upgrade() else {
            debug!("Remote toggle ignored: player gone");
            return false;
        };
        engine.toggle_play_pause().is_ok()
    }

    /// `true` while the target engine exists and has not been released.
    pub fn is_connected(&self) -> bool {
        self.engine
            .upgrade()
            .is_some_and(|engine| !engine.is_released())
    }
}

impl std::fmt::Debug for RemoteActionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteActionHandle")
            .field("connected", &self.is_connected())
            .finish()
    }
}
