//! Cloneable façade for issuing commands to the runtime.
//!
//! [`StatRuntimeHandle`] hides channel plumbing and offers async helpers for
//! reconciling owners or streaming sync events.
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use stat_core::OwnerId;

use super::errors::{Result, RuntimeError};
use crate::events::{SyncEvent, SyncEventBus};
use crate::sync::{PassSummary, SyncOutcome};
use crate::workers::{Command, MetricsSnapshot, SyncMetrics};

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct StatRuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    events: SyncEventBus,
    metrics: Arc<SyncMetrics>,
}

impl StatRuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        events: SyncEventBus,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self {
            command_tx,
            events,
            metrics,
        }
    }

    /// Reconcile one live owner, skipping it when nothing changed
    pub async fn sync_owner(&self, owner: OwnerId) -> Result<SyncOutcome> {
        self.request_owner(owner, false).await
    }

    /// Reconcile one live owner unconditionally
    pub async fn force_sync_owner(&self, owner: OwnerId) -> Result<SyncOutcome> {
        self.request_owner(owner, true).await
    }

    /// Run a full pass now, outside the periodic schedule
    pub async fn sync_all(&self) -> Result<PassSummary> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::SyncAll { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Subscribe to sync events
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut rx = handle.subscribe();
    /// while let Ok(event) = rx.recv().await {
    ///     if let SyncEvent::OwnerFailed { owner, error } = event {
    ///         eprintln!("{owner}: {error}");
    ///     }
    /// }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Point-in-time copy of the worker's counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn request_owner(&self, owner: OwnerId, force: bool) -> Result<SyncOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::SyncOwner {
                owner,
                force,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }
}
