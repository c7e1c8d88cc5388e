//! # Core Configuration Module
//!
//! Configuration for the player core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the host bridges and settings the core needs. It
//! enforces fail-fast validation so a missing media engine is reported at
//! startup rather than on the first `load`.
//!
//! ## Required Dependencies
//!
//! - `MediaEngine` - The native decode/playback engine
//! - A database location (`database_path`) or `in_memory_database()`
//!
//! ## Optional Dependencies
//!
//! - `Clock` - Time source for position timestamps (default: `SystemClock`)
//! - `LifecycleObserver` - App foreground/background transitions
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/data/player/positions.db")
//!     .media_engine(Arc::new(VlcEngine::new()?))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Missing media engine
//! let config = CoreConfig::builder()
//!     .database_path("/data/player/positions.db")
//!     .build()
//!     .expect("Should fail - missing media engine");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use crate::logging::LoggingConfig;
use bridge_traits::{Clock, LifecycleObserver, MediaEngine, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;

/// Where the position store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// SQLite file on disk
    File(PathBuf),
    /// Private in-memory database, lost on shutdown
    InMemory,
}

/// Core configuration for the player.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Position store location
    pub database: DatabaseLocation,

    /// Native media engine (required)
    pub media_engine: Arc<dyn MediaEngine>,

    /// Time source used to stamp saved positions
    pub clock: Arc<dyn Clock>,

    /// App lifecycle observer (optional)
    pub lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,

    /// Logging setup; `None` leaves the global subscriber to the host
    pub logging: Option<LoggingConfig>,

    /// Capacity of the session notification bus
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database", &self.database)
            .field("media_engine", &"MediaEngine { ... }")
            .field("clock", &"Clock { ... }")
            .field(
                "lifecycle_observer",
                &self
                    .lifecycle_observer
                    .as_ref()
                    .map(|_| "LifecycleObserver { ... }"),
            )
            .field("logging", &self.logging)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// This checks:
    /// - Database path is not empty
    /// - Event buffer holds at least one event
    pub fn validate(&self) -> Result<()> {
        if let DatabaseLocation::File(path) = &self.database {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn media_engine_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaEngine".to_string(),
        message: "MediaEngine implementation is required for playback. \
                 Android: inject the libVLC-backed engine. \
                 Tests: inject a fake engine that records calls and replays events."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database: Option<DatabaseLocation>,
    media_engine: Option<Arc<dyn MediaEngine>>,
    clock: Option<Arc<dyn Clock>>,
    lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,
    logging: Option<LoggingConfig>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the SQLite database file for saved positions.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .database_path("/data/player/positions.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database = Some(DatabaseLocation::File(path.into()));
        self
    }

    /// Keeps saved positions in memory only.
    pub fn in_memory_database(mut self) -> Self {
        self.database = Some(DatabaseLocation::InMemory);
        self
    }

    /// Sets the media engine implementation (required).
    pub fn media_engine(mut self, engine: Arc<dyn MediaEngine>) -> Self {
        self.media_engine = Some(engine);
        self
    }

    /// Sets the time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the lifecycle observer implementation (optional).
    ///
    /// When present, the service flushes the resume position on background
    /// transitions and re-attaches video output on foreground.
    pub fn lifecycle_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.lifecycle_observer = Some(observer);
        self
    }

    /// Installs a global tracing subscriber during bootstrap.
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Sets the notification bus capacity.
    ///
    /// Default: 100 events
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the final [`CoreConfig`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no database location was set or validation fails
    /// - [`Error::CapabilityMissing`] if no media engine was provided
    pub fn build(self) -> Result<CoreConfig> {
        let database = self.database.ok_or_else(|| {
            Error::Config(
                "Database location is required. Use database_path() or in_memory_database()."
                    .to_string(),
            )
        })?;

        let media_engine = self.media_engine.ok_or_else(media_engine_missing_error)?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        let config = CoreConfig {
            database,
            media_engine,
            clock,
            lifecycle_observer: self.lifecycle_observer,
            logging: self.logging,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;
        Ok(config)
    }
}
