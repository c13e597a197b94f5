//! Health reconciliation between custom attributes and host mirrors.
//!
//! [`SyncEngine`] owns per-owner [`OwnerSyncState`] and drives migration and
//! incremental passes; [`SyncReport`] aggregates a batch so one failing owner
//! never hides the others.
mod engine;
mod error;
mod report;
mod state;

pub use engine::SyncEngine;
pub(crate) use engine::health_span;
pub use error::SyncError;
pub use report::{PassSummary, SyncFailure, SyncOutcome, SyncReport};
pub use state::{Fingerprint, OwnerSyncState};
