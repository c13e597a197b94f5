//! High-level runtime orchestrator.
//!
//! The runtime owns the sync worker, wires up command/event channels, and
//! exposes a builder-based API for hosts to embed the attribute system.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

use stat_core::{AttributeManager, AttributeRegistry};

use crate::api::{Result, RuntimeError, StatRuntimeHandle};
use crate::config::RuntimeConfig;
use crate::events::SyncEventBus;
use crate::host::HostWorld;
use crate::lifecycle::Lifecycle;
use crate::sync::SyncEngine;
use crate::workers::{SyncMetrics, SyncWorker};

/// Main runtime that keeps custom attributes reconciled with the host
///
/// Design: the runtime owns the worker; [`StatRuntimeHandle`] provides a
/// cloneable façade for clients. Synchronous host hooks go through
/// [`Lifecycle`] directly.
pub struct StatRuntime {
    handle: StatRuntimeHandle,
    manager: Arc<AttributeManager>,
    engine: Arc<SyncEngine>,
    lifecycle: Arc<Lifecycle>,
    shutdown_tx: oneshot::Sender<()>,
    worker_handle: JoinHandle<()>,
}

impl StatRuntime {
    /// Create a new runtime builder
    pub fn builder() -> StatRuntimeBuilder {
        StatRuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> StatRuntimeHandle {
        self.handle.clone()
    }

    pub fn manager(&self) -> &Arc<AttributeManager> {
        &self.manager
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    /// Stop the worker and clear all attribute and sync state
    ///
    /// A pass already running completes first.
    pub async fn shutdown(self) -> Result<()> {
        // the worker may already be gone; joining reports how it ended
        let _ = self.shutdown_tx.send(());

        self.worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        self.lifecycle.shutdown();
        info!(target: "stat_runtime::worker", "runtime shut down");
        Ok(())
    }
}

/// Builder for [`StatRuntime`] with flexible configuration.
pub struct StatRuntimeBuilder {
    config: RuntimeConfig,
    registry: Option<Arc<AttributeRegistry>>,
    world: Option<Box<dyn HostWorld>>,
}

impl StatRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            registry: None,
            world: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Registry to share; defaults to one holding the builtin attributes.
    pub fn registry(mut self, registry: Arc<AttributeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn world(mut self, world: impl HostWorld + 'static) -> Self {
        self.world = Some(Box::new(world));
        self
    }

    /// Validate configuration and spawn the sync worker.
    ///
    /// Must be called inside a tokio runtime.
    pub async fn build(self) -> Result<StatRuntime> {
        self.config.validate()?;
        let world = self.world.ok_or(RuntimeError::MissingHostWorld)?;
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(AttributeRegistry::with_builtins()));

        let manager = Arc::new(AttributeManager::new(registry));
        let events = SyncEventBus::with_capacity(self.config.event_buffer_size);
        let metrics = Arc::new(SyncMetrics::new());
        let engine = Arc::new(SyncEngine::with_channels(
            Arc::clone(&manager),
            self.config.sync.clone(),
            events.clone(),
            Arc::clone(&metrics),
        ));
        let lifecycle = Arc::new(Lifecycle::new(Arc::clone(&engine)));

        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let worker = SyncWorker::new(
            Arc::clone(&engine),
            world,
            command_rx,
            shutdown_rx,
            self.config.sync_interval,
        );
        let worker_handle = tokio::spawn(worker.run());

        let handle = StatRuntimeHandle::new(command_tx, events, metrics);

        Ok(StatRuntime {
            handle,
            manager,
            engine,
            lifecycle,
            shutdown_tx,
            worker_handle,
        })
    }
}
