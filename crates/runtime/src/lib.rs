//! Runtime that keeps custom attributes and a host's native health in sync.
//!
//! This crate wires the `stat-core` attribute model to a host through the
//! [`NativeMirror`] and [`HostWorld`] interfaces. Consumers embed
//! [`StatRuntime`] to run periodic reconciliation, call [`Lifecycle`] from
//! their own event hooks, and talk to the worker through [`StatRuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the handle and error types downstream clients use
//! - [`sync`] implements migration and incremental reconciliation
//! - [`lifecycle`] handles joins, leaves, heals, damage and equipment
//! - [`events`] broadcasts sync events
//! - [`host`] defines what the host implements
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod config;
pub mod events;
pub mod host;
pub mod lifecycle;
pub mod runtime;
pub mod sync;

mod workers;

pub use api::{Result, RuntimeError, StatRuntimeHandle};
pub use config::{RuntimeConfig, SyncConfig};
pub use events::{SyncEvent, SyncEventBus};
pub use host::{HostWorld, NativeMirror};
pub use lifecycle::Lifecycle;
pub use runtime::{StatRuntime, StatRuntimeBuilder};
pub use sync::{
    Fingerprint, OwnerSyncState, PassSummary, SyncEngine, SyncError, SyncFailure, SyncOutcome,
    SyncReport,
};
pub use workers::{MetricsSnapshot, SyncMetrics};
