//! Worker tasks that back the runtime orchestration.
//!
//! The sync worker owns the host world; metrics are shared with handles.

mod metrics;
mod sync;

pub use metrics::{MetricsSnapshot, SyncMetrics};
pub use sync::{Command, SyncWorker};
