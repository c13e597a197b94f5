//! Sync worker that owns the host world.
//!
//! Receives commands from [`StatRuntimeHandle`](crate::api::StatRuntimeHandle),
//! runs on-demand owner passes, and drives periodic full passes over every
//! live owner.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info};

use stat_core::OwnerId;

use crate::api::{Result, RuntimeError};
use crate::host::HostWorld;
use crate::sync::{PassSummary, SyncEngine, SyncOutcome};

/// Commands that can be sent to the sync worker
pub enum Command {
    /// Reconcile a single live owner.
    SyncOwner {
        owner: OwnerId,
        force: bool,
        reply: oneshot::Sender<Result<SyncOutcome>>,
    },
    /// Run a full pass over the host world now.
    SyncAll { reply: oneshot::Sender<PassSummary> },
}

/// Background task that serializes all host access.
pub struct SyncWorker {
    engine: Arc<SyncEngine>,
    world: Box<dyn HostWorld>,
    command_rx: mpsc::Receiver<Command>,
    shutdown_rx: oneshot::Receiver<()>,
    interval: Option<Duration>,
}

impl SyncWorker {
    pub fn new(
        engine: Arc<SyncEngine>,
        world: Box<dyn HostWorld>,
        command_rx: mpsc::Receiver<Command>,
        shutdown_rx: oneshot::Receiver<()>,
        interval: Option<Duration>,
    ) -> Self {
        Self {
            engine,
            world,
            command_rx,
            shutdown_rx,
            interval,
        }
    }

    /// Main worker loop.
    ///
    /// Exits on shutdown signal or once every command sender is gone.
    pub async fn run(mut self) {
        let periodic = self.interval.is_some();
        let mut ticker = time::interval(self.interval.unwrap_or(Duration::from_secs(3600)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick completes immediately
        ticker.tick().await;

        info!(
            target: "stat_runtime::worker",
            interval = ?self.interval,
            "sync worker started"
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut self.shutdown_rx => {
                    debug!(target: "stat_runtime::worker", "shutdown requested");
                    break;
                }
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                _ = ticker.tick(), if periodic => {
                    self.engine.sync_world(self.world.as_mut());
                }
            }
        }

        info!(target: "stat_runtime::worker", "sync worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SyncOwner {
                owner,
                force,
                reply,
            } => {
                let result = self.sync_owner(owner, force);
                if reply.send(result).is_err() {
                    debug!(target: "stat_runtime::worker", "SyncOwner reply channel closed (caller dropped)");
                }
            }
            Command::SyncAll { reply } => {
                let report = self.engine.sync_world(self.world.as_mut());
                if reply.send(report.summary()).is_err() {
                    debug!(target: "stat_runtime::worker", "SyncAll reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn sync_owner(&mut self, owner: OwnerId, force: bool) -> Result<SyncOutcome> {
        let engine = &self.engine;
        let mut result = None;
        let found = self.world.visit(owner, &mut |mirror| {
            result = Some(if force {
                engine.force_sync_owner(mirror)
            } else {
                engine.sync_owner(mirror)
            });
        });

        match result {
            Some(result) if found => result.map_err(RuntimeError::from),
            _ => Err(RuntimeError::UnknownOwner(owner)),
        }
    }
}
