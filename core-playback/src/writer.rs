//! # Ordered Position Writer
//!
//! Fire-and-forget persistence of resume positions.
//!
//! All store operations funnel through one FIFO drained by a single task, so
//! writes for any key are applied in the order they were issued and an older
//! upsert can never overwrite a newer one. Failures are logged, published as
//! [`StoreEvent::WriteFailed`] and otherwise ignored: losing a resume point
//! never interrupts playback.

use core_library::{PlaybackPosition, PositionRepository};
use core_runtime::events::{CoreEvent, EventBus, StoreEvent};
use core_runtime::logging::redact_media_uri;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

enum WriteOp {
    Upsert(PlaybackPosition),
    Delete(String),
    /// Barrier: acknowledged once every earlier op has been applied.
    Flush(oneshot::Sender<()>),
}

/// Handle for enqueueing store writes.
///
/// Cloning is cheap; all clones feed the same queue. The worker task exits
/// once every handle is dropped and the queue is drained.
#[derive(Clone)]
pub struct PositionWriter {
    tx: mpsc::UnboundedSender<WriteOp>,
}

impl PositionWriter {
    /// Spawn the worker on `runtime`.
    pub fn spawn(
        runtime: &Handle,
        store: Arc<dyn PositionRepository>,
        events: EventBus,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = runtime.spawn(run_writer(store, events, rx));
        (Self { tx }, handle)
    }

    /// Queue an upsert. Never blocks.
    pub fn upsert(&self, record: PlaybackPosition) {
        self.enqueue(WriteOp::Upsert(record));
    }

    /// Queue a delete. Never blocks.
    pub fn delete(&self, media_key: impl Into<String>) {
        self.enqueue(WriteOp::Delete(media_key.into()));
    }

    /// Wait until every write queued before this call has been applied.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(WriteOp::Flush(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }

    fn enqueue(&self, op: WriteOp) {
        if self.tx.send(op).is_err() {
            warn!("Position writer stopped; dropping store write");
        }
    }
}

impl std::fmt::Debug for PositionWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionWriter")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

async fn run_writer(
    store: Arc<dyn PositionRepository>,
    events: EventBus,
    mut rx: mpsc::UnboundedReceiver<WriteOp>,
) {
    debug!("Position writer started");

    while let Some(op) = rx.recv().await {
        match op {
            WriteOp::Upsert(record) => match store.upsert(&record).await {
                Ok(()) => {
                    debug!(
                        media_key = %redact_media_uri(&record.media_key),
                        position_ms = record.position_ms,
                        duration_ms = record.duration_ms,
                        "Playback position saved"
                    );
                    let _ = events.emit(CoreEvent::Store(StoreEvent::PositionSaved {
                        media_key: record.media_key,
                        position_ms: record.position_ms,
                        duration_ms: record.duration_ms,
                    }));
                }
                Err(e) => report_failure(&events, "upsert", &record.media_key, &e),
            },
            WriteOp::Delete(media_key) => match store.delete(&media_key).await {
                Ok(_) => {
                    debug!(
                        media_key = %redact_media_uri(&media_key),
                        "Playback position cleared"
                    );
                    let _ =
                        events.emit(CoreEvent::Store(StoreEvent::PositionCleared { media_key }));
                }
                Err(e) => report_failure(&events, "delete", &media_key, &e),
            },
            WriteOp::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    debug!("Position writer stopped");
}

fn report_failure(
    events: &EventBus,
    operation: &str,
    media_key: &str,
    error: &dyn std::error::Error,
) {
    warn!(
        operation,
        media_key = %redact_media_uri(media_key),
        error = %error,
        "Position store write failed; continuing without it"
    );
    let _ = events.emit(CoreEvent::Store(StoreEvent::WriteFailed {
        operation: operation.to_string(),
        message: error.to_string(),
    }));
}
