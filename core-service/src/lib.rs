//! Core service façade and bootstrap helpers.
//!
//! This crate wires the host-provided media engine, clock and lifecycle
//! observer into the shared Rust core: it initializes logging, opens the
//! position store, builds the engine facade and the session controller, and
//! forwards app lifecycle transitions to them.
//!
//! ```ignore
//! let config = CoreConfig::builder()
//!     .database_path(data_dir.join("positions.db"))
//!     .media_engine(Arc::new(VlcEngine::new(&EngineOptions::default().engine_args)?))
//!     .logging(LoggingConfig::default())
//!     .build()?;
//!
//! let service =
//!     PlayerService::bootstrap(config, PlaybackPolicy::default(), EngineOptions::default())
//!         .await?;
//! service.controller().load_and_play(uri)?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{Clock, LifecycleObserver, LifecycleState};
use core_library::{create_pool, DatabaseConfig, PositionRepository, SqlitePositionRepository};
use core_playback::{EngineOptions, PlaybackPolicy, PlayerEngine, SessionController};
use core_runtime::config::{CoreConfig, DatabaseLocation};
use core_runtime::events::{CoreEvent, EventBus, EventStream};
use core_runtime::logging::init_logging;
use parking_lot::Mutex;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Primary façade exposed to host applications.
pub struct PlayerService {
    controller: Arc<SessionController>,
    store: Arc<dyn PositionRepository>,
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    events: EventBus,
    lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,
    lifecycle_watch: Mutex<Option<CancellationToken>>,
}

impl PlayerService {
    /// Build every core component from `config`.
    ///
    /// Logging is initialized when configured; a subscriber installed earlier
    /// by the host is kept.
    pub async fn bootstrap(
        config: CoreConfig,
        policy: PlaybackPolicy,
        engine_options: EngineOptions,
    ) -> Result<Self> {
        config.validate()?;

        let CoreConfig {
            database,
            media_engine,
            clock,
            lifecycle_observer,
            logging,
            event_buffer_size,
        } = config;

        if let Some(logging) = logging {
            match init_logging(logging) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "Keeping existing logging setup");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let database = match database {
            DatabaseLocation::File(path) => DatabaseConfig::new(path),
            DatabaseLocation::InMemory => DatabaseConfig::in_memory(),
        };
        let pool = create_pool(database).await?;
        let store: Arc<dyn PositionRepository> =
            Arc::new(SqlitePositionRepository::from_pool(pool.clone()));

        let events = EventBus::new(event_buffer_size);
        let engine = PlayerEngine::new(media_engine, engine_options);
        let controller = SessionController::new(
            engine,
            Arc::clone(&store),
            Arc::clone(&clock),
            policy,
            events.clone(),
        )?;

        info!("Player service initialized");

        Ok(Self {
            controller: Arc::new(controller),
            store,
            pool,
            clock,
            events,
            lifecycle_observer,
            lifecycle_watch: Mutex::new(None),
        })
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    /// Position store, for maintenance and diagnostics.
    pub fn store(&self) -> Arc<dyn PositionRepository> {
        Arc::clone(&self.store)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// Session lifecycle notifications only, without store traffic.
    pub fn subscribe_session_events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
            .filter(|event| matches!(event, CoreEvent::Session(_)))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Apply one host lifecycle transition.
    pub fn on_lifecycle(&self, state: LifecycleState) {
        apply_lifecycle(&self.controller, state);
    }

    /// Follow the configured [`LifecycleObserver`] in a background task.
    ///
    /// Replaces any previous watcher. The task ends when the stream closes,
    /// on [`stop_lifecycle_watch`](Self::stop_lifecycle_watch) or on
    /// [`shutdown`](Self::shutdown).
    pub async fn watch_lifecycle(&self) -> Result<()> {
        let observer = self
            .lifecycle_observer
            .clone()
            .ok_or_else(|| CoreError::CapabilityMissing {
                capability: "LifecycleObserver".to_string(),
                message: "No lifecycle observer configured; call on_lifecycle() directly"
                    .to_string(),
            })?;

        let mut stream = observer.subscribe_changes().await?;
        let token = CancellationToken::new();
        if let Some(previous) = self.lifecycle_watch.lock().replace(token.clone()) {
            previous.cancel();
        }

        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    next = stream.next() => match next {
                        Some(state) => apply_lifecycle(&controller, state),
                        None => {
                            debug!("Lifecycle stream closed");
                            break;
                        }
                    },
                }
            }
        });

        Ok(())
    }

    pub fn stop_lifecycle_watch(&self) {
        if let Some(token) = self.lifecycle_watch.lock().take() {
            token.cancel();
        }
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Delete saved positions untouched for longer than the retention window.
    ///
    /// Returns the number of records removed.
    pub async fn prune_stale_positions(&self) -> Result<u64> {
        let retention = self.controller.policy().position_retention;
        let retention_ms = i64::try_from(retention.as_millis()).unwrap_or(i64::MAX);
        let threshold_ms = self.clock.unix_timestamp_millis().saturating_sub(retention_ms);

        let removed = self.store.prune_older_than(threshold_ms).await?;
        info!(removed, threshold_ms, "Pruned stale playback positions");
        Ok(removed)
    }

    /// Stop watchers, release the engine and close the store. Idempotent.
    pub async fn shutdown(&self) {
        self.stop_lifecycle_watch();
        self.controller.shutdown().await;
        self.pool.close().await;
        info!("Player service shut down");
    }
}

impl std::fmt::Debug for PlayerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerService")
            .field("controller", &self.controller)
            .field("events", &self.events)
            .finish()
    }
}

fn apply_lifecycle(controller: &SessionController, state: LifecycleState) {
    debug!(?state, "Lifecycle transition");
    if state.should_flush() {
        controller.save_position_now();
        return;
    }
    controller.ensure_surfaces_attached();
    controller.update_window_size();
    controller.resync_position();
}
