//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, configuration and reconciliation
//! so hosts can bubble them up with consistent context.
use stat_core::OwnerId;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::sync::SyncError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("sync worker command channel closed")]
    CommandChannelClosed,

    #[error("sync worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("sync worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires a host world to be configured before building")]
    MissingHostWorld,

    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("owner {0} is not live in the host world")]
    UnknownOwner(OwnerId),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
