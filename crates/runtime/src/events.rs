//! Broadcast of reconciliation events.
//!
//! Events are best-effort: publishing without subscribers is normal, and slow
//! subscribers may observe `Lagged`.

use serde::{Deserialize, Serialize};
use stat_core::OwnerId;
use tokio::sync::broadcast;

use crate::sync::{PassSummary, SyncOutcome};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncEvent {
    /// Owner scaled from the host baseline into custom values.
    OwnerMigrated {
        owner: OwnerId,
        custom_max: f64,
        host_max: f64,
    },
    /// An incremental pass wrote values.
    OwnerReconciled {
        owner: OwnerId,
        outcome: SyncOutcome,
        custom_current: f64,
        host_current: f64,
    },
    /// A pass failed; the owner will be retried.
    OwnerFailed { owner: OwnerId, error: String },
    /// A batch pass over the host world finished.
    PassCompleted(PassSummary),
}

#[derive(Clone, Debug)]
pub struct SyncEventBus {
    tx: broadcast::Sender<SyncEvent>,
}

impl SyncEventBus {
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: SyncEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!(target: "stat_runtime::events", "no subscribers for sync event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SyncEventBus {
    fn default() -> Self {
        Self::with_capacity(100)
    }
}
