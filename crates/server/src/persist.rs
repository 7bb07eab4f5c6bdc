//! Background writes through the position repository.
//!
//! Ingestion only enqueues; a single worker task drains the queue in order,
//! so the hot path never waits on storage and an older record can never land
//! after a newer one. Repository failures are logged here and go no further.

use std::sync::Arc;

use bus_tracker_fleet::{PersistedPosition, PositionRepository};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct PersistenceQueue {
    tx: mpsc::UnboundedSender<PersistedPosition>,
}

/// Handle on the worker task. It finishes once every queue clone is gone
/// and the backlog is written.
pub struct PersistenceWorker {
    handle: JoinHandle<()>,
}

impl PersistenceQueue {
    /// Must be called from within a tokio runtime
    pub fn spawn(repository: Arc<dyn PositionRepository>) -> (Self, PersistenceWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(repository, rx));

        (Self { tx }, PersistenceWorker { handle })
    }

    pub fn enqueue(&self, record: PersistedPosition) {
        if let Err(rejected) = self.tx.send(record) {
            warn!(
                vehicle_id = %rejected.0.vehicle_id,
                "persistence worker has stopped, dropping write"
            );
        }
    }
}

impl PersistenceWorker {
    pub async fn join(self) {
        if let Err(error) = self.handle.await {
            warn!(%error, "persistence worker ended abnormally");
        }
    }
}

async fn run(
    repository: Arc<dyn PositionRepository>,
    mut rx: mpsc::UnboundedReceiver<PersistedPosition>,
) {
    while let Some(record) = rx.recv().await {
        match repository.save(&record).await {
            Ok(()) => debug!(vehicle_id = %record.vehicle_id, "persisted position"),
            Err(error) => warn!(
                vehicle_id = %record.vehicle_id,
                %error,
                "failed to persist position, keeping in-memory state"
            ),
        }
    }
}
