//! Reconciliation metrics.
//!
//! Counts per-owner outcomes and batch pass timing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sync::{SyncOutcome, SyncReport};

/// Counters shared by the sync engine, the worker and runtime handles.
///
/// Uses atomics for lock-free access across threads.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    migrated: AtomicU64,
    /// Passes that wrote something (max propagated or current corrected).
    reconciled: AtomicU64,
    unchanged: AtomicU64,
    failed: AtomicU64,

    /// Completed batch passes.
    passes: AtomicU64,

    /// Sum of batch pass durations, in nanoseconds.
    total_pass_time_nanos: AtomicU64,

    /// Longest batch pass observed, in nanoseconds.
    peak_pass_time_nanos: AtomicU64,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one owner's outcome.
    pub fn record_outcome(&self, outcome: SyncOutcome) {
        let counter = match outcome {
            SyncOutcome::Migrated => &self.migrated,
            SyncOutcome::MaxPropagated | SyncOutcome::CurrentCorrected => &self.reconciled,
            SyncOutcome::Unchanged | SyncOutcome::NotApplicable => &self.unchanged,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed batch pass.
    pub fn record_pass(&self, report: &SyncReport) {
        self.passes.fetch_add(1, Ordering::Relaxed);

        let nanos = report.elapsed.as_nanos() as u64;
        self.total_pass_time_nanos
            .fetch_add(nanos, Ordering::Relaxed);

        // Update peak using compare-and-swap loop
        let mut current_peak = self.peak_pass_time_nanos.load(Ordering::Relaxed);
        while nanos > current_peak {
            match self.peak_pass_time_nanos.compare_exchange_weak(
                current_peak,
                nanos,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current_peak = actual,
            }
        }
    }

    pub fn migrated(&self) -> u64 {
        self.migrated.load(Ordering::Relaxed)
    }

    pub fn reconciled(&self) -> u64 {
        self.reconciled.load(Ordering::Relaxed)
    }

    pub fn unchanged(&self) -> u64 {
        self.unchanged.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    pub fn avg_pass_time(&self) -> Duration {
        let passes = self.passes();
        if passes == 0 {
            Duration::ZERO
        } else {
            let total_nanos = self.total_pass_time_nanos.load(Ordering::Relaxed);
            Duration::from_nanos(total_nanos / passes)
        }
    }

    pub fn peak_pass_time(&self) -> Duration {
        Duration::from_nanos(self.peak_pass_time_nanos.load(Ordering::Relaxed))
    }

    /// Creates a snapshot of all metrics for display/logging.
    ///
    /// Fields are read individually, so the snapshot may straddle a pass.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            migrated: self.migrated(),
            reconciled: self.reconciled(),
            unchanged: self.unchanged(),
            failed: self.failed(),
            passes: self.passes(),
            avg_pass_time: self.avg_pass_time(),
            peak_pass_time: self.peak_pass_time(),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub migrated: u64,
    pub reconciled: u64,
    pub unchanged: u64,
    pub failed: u64,
    pub passes: u64,
    pub avg_pass_time: Duration,
    pub peak_pass_time: Duration,
}
