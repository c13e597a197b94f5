use std::time::Duration;

use serde::{Deserialize, Serialize};
use stat_core::OwnerId;

use super::SyncError;

/// Result of one owner's pass.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum SyncOutcome {
    /// First pass under the current epoch: host baseline scaled into custom values.
    Migrated,
    /// Custom max moved (or host max drifted); max pushed to host, ratio kept.
    MaxPropagated,
    /// Host current changed; custom current pulled from host.
    CurrentCorrected,
    /// Nothing to do within tolerance.
    Unchanged,
    /// Owner's category has no health attributes.
    NotApplicable,
}

impl SyncOutcome {
    /// True when the pass wrote to the host or to custom values.
    pub const fn changed(self) -> bool {
        matches!(
            self,
            Self::Migrated | Self::MaxPropagated | Self::CurrentCorrected
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyncFailure {
    pub owner: OwnerId,
    pub error: SyncError,
}

/// Aggregated result of a batch pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncReport {
    pub migrated: usize,
    pub max_propagated: usize,
    pub current_corrected: usize,
    pub unchanged: usize,
    pub not_applicable: usize,
    pub failures: Vec<SyncFailure>,
    pub elapsed: Duration,
}

impl SyncReport {
    pub fn record(&mut self, owner: OwnerId, result: Result<SyncOutcome, SyncError>) {
        match result {
            Ok(SyncOutcome::Migrated) => self.migrated += 1,
            Ok(SyncOutcome::MaxPropagated) => self.max_propagated += 1,
            Ok(SyncOutcome::CurrentCorrected) => self.current_corrected += 1,
            Ok(SyncOutcome::Unchanged) => self.unchanged += 1,
            Ok(SyncOutcome::NotApplicable) => self.not_applicable += 1,
            Err(error) => self.failures.push(SyncFailure { owner, error }),
        }
    }

    pub fn processed(&self) -> usize {
        self.succeeded() + self.failures.len()
    }

    pub fn succeeded(&self) -> usize {
        self.migrated
            + self.max_propagated
            + self.current_corrected
            + self.unchanged
            + self.not_applicable
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn summary(&self) -> PassSummary {
        PassSummary {
            migrated: self.migrated,
            max_propagated: self.max_propagated,
            current_corrected: self.current_corrected,
            unchanged: self.unchanged,
            not_applicable: self.not_applicable,
            failed: self.failures.len(),
            elapsed_micros: self.elapsed.as_micros() as u64,
        }
    }
}

/// Serializable counts of a batch pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    pub migrated: usize,
    pub max_propagated: usize,
    pub current_corrected: usize,
    pub unchanged: usize,
    pub not_applicable: usize,
    pub failed: usize,
    pub elapsed_micros: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_outcomes() {
        let mut report = SyncReport::default();
        report.record(OwnerId(1), Ok(SyncOutcome::Migrated));
        report.record(OwnerId(2), Ok(SyncOutcome::Unchanged));
        report.record(
            OwnerId(3),
            Err(SyncError::NonPositiveNativeMax {
                owner: OwnerId(3),
                value: 0.0,
            }),
        );

        assert_eq!(report.processed(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].owner, OwnerId(3));

        let summary = report.summary();
        assert_eq!(summary.migrated, 1);
        assert_eq!(summary.failed, 1);
    }
}
