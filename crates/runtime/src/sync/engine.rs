//! Reconciliation between custom health and the host's native mirror.
//!
//! Custom values relate to host values by the scale factor `S`
//! (custom = native × S). The custom system is authoritative for maximum
//! health, the host for current health.
//!
//! A pass over one owner is one of:
//!
//! - **migration**, when the owner has no state under the configured epoch:
//!   the host baseline is scaled into custom max/current and mirrored back.
//! - **reconciliation**, afterwards: a changed custom max is pushed to the
//!   host keeping the host's current/max ratio; otherwise a changed host
//!   current is pulled into custom current.
//!
//! Host writes go through [`SyncConfig::host_safe`], so the host never sees
//! values above its ceiling while custom values keep the unclamped truth. An
//! unbounded custom max is mirrored as the ceiling; custom current is then
//! measured against [`StatConfig::SAFE_INFINITY_VALUE`].

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::Mutex;
use stat_core::{
    AttributeDefinition, AttributeInstance, AttributeManager, ErrorSeverity, OwnerId, OwnerRef,
    StatConfig, StatError, builtin,
};
use tracing::{debug, error, trace, warn};

use super::{Fingerprint, OwnerSyncState, SyncError, SyncOutcome, SyncReport};
use crate::config::SyncConfig;
use crate::events::{SyncEvent, SyncEventBus};
use crate::host::{HostWorld, NativeMirror};
use crate::workers::SyncMetrics;

/// The two health instances of one owner.
struct HealthPair {
    max: Arc<AttributeInstance>,
    current: Arc<AttributeInstance>,
}

impl HealthPair {
    fn fingerprint(&self, host_max: f64, host_current: f64) -> Fingerprint {
        Fingerprint {
            max_revision: self.max.revision(),
            current_revision: self.current.revision(),
            host_max,
            host_current,
        }
    }
}

/// Reconciles owners against their host mirrors.
///
/// Each owner's state sits behind its own mutex, so concurrent passes over the
/// same owner serialize while different owners proceed in parallel.
pub struct SyncEngine {
    manager: Arc<AttributeManager>,
    config: SyncConfig,
    owners: DashMap<OwnerId, Arc<Mutex<OwnerSyncState>>>,
    metrics: Arc<SyncMetrics>,
    events: SyncEventBus,
}

impl SyncEngine {
    pub fn new(manager: Arc<AttributeManager>, config: SyncConfig) -> Self {
        Self::with_channels(
            manager,
            config,
            SyncEventBus::default(),
            Arc::new(SyncMetrics::new()),
        )
    }

    pub fn with_channels(
        manager: Arc<AttributeManager>,
        config: SyncConfig,
        events: SyncEventBus,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self {
            manager,
            config,
            owners: DashMap::new(),
            metrics,
            events,
        }
    }

    pub fn manager(&self) -> &Arc<AttributeManager> {
        &self.manager
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.metrics
    }

    pub fn events(&self) -> &SyncEventBus {
        &self.events
    }

    // ===== passes =====

    /// Reconciles one owner, skipping it cheaply when nothing moved since the last pass.
    pub fn sync_owner(&self, mirror: &mut dyn NativeMirror) -> Result<SyncOutcome, SyncError> {
        self.run(mirror, false)
    }

    /// Reconciles one owner even if its fingerprint is unchanged.
    pub fn force_sync_owner(&self, mirror: &mut dyn NativeMirror) -> Result<SyncOutcome, SyncError> {
        self.run(mirror, true)
    }

    /// Reconciles every mirror; a failing owner never aborts the batch.
    pub fn sync_owners<'a, I>(&self, mirrors: I) -> SyncReport
    where
        I: IntoIterator<Item = &'a mut dyn NativeMirror>,
    {
        let started = Instant::now();
        let mut report = SyncReport::default();
        for mirror in mirrors {
            let owner = mirror.owner().id;
            report.record(owner, self.sync_owner(mirror));
        }
        self.finish_pass(report, started)
    }

    /// Reconciles every live owner of `world`.
    pub fn sync_world(&self, world: &mut dyn HostWorld) -> SyncReport {
        let started = Instant::now();
        let mut report = SyncReport::default();
        world.visit_all(&mut |mirror| {
            let owner = mirror.owner().id;
            report.record(owner, self.sync_owner(mirror));
        });
        self.finish_pass(report, started)
    }

    // ===== state =====

    pub fn owner_state(&self, owner: OwnerId) -> OwnerSyncState {
        self.owners
            .get(&owner)
            .map(|slot| *slot.lock())
            .unwrap_or_default()
    }

    /// Drops the owner's state; its next pass migrates again.
    pub fn forget_owner(&self, owner: OwnerId) -> bool {
        self.owners.remove(&owner).is_some()
    }

    pub fn clear(&self) {
        self.owners.clear();
    }

    pub fn tracked_owner_count(&self) -> usize {
        self.owners.len()
    }

    // ===== internals =====

    fn run(&self, mirror: &mut dyn NativeMirror, force: bool) -> Result<SyncOutcome, SyncError> {
        let owner = mirror.owner().id;
        let result = self.reconcile(mirror, force);

        match &result {
            Ok(outcome) => {
                self.metrics.record_outcome(*outcome);
                if outcome.changed() {
                    debug!(target: "stat_runtime::sync", owner = %owner, outcome = %outcome, force, "owner synced");
                } else {
                    trace!(target: "stat_runtime::sync", owner = %owner, outcome = %outcome, "owner unchanged");
                }
            }
            Err(err) => {
                self.metrics.record_failure();
                match err.severity() {
                    ErrorSeverity::Internal => error!(
                        target: "stat_runtime::sync",
                        owner = %owner,
                        code = err.error_code(),
                        error = ?err,
                        "owner sync failed, skipping"
                    ),
                    ErrorSeverity::Recoverable | ErrorSeverity::Validation => warn!(
                        target: "stat_runtime::sync",
                        owner = %owner,
                        code = err.error_code(),
                        error = ?err,
                        "owner sync failed, will retry next pass"
                    ),
                }
                self.events.publish(SyncEvent::OwnerFailed {
                    owner,
                    error: err.to_string(),
                });
            }
        }

        result
    }

    fn reconcile(&self, mirror: &mut dyn NativeMirror, force: bool) -> Result<SyncOutcome, SyncError> {
        let owner = mirror.owner();
        let (max_def, current_def) = self.health_definitions()?;
        if !max_def.is_applicable_to(owner.category) || !current_def.is_applicable_to(owner.category)
        {
            return Ok(SyncOutcome::NotApplicable);
        }

        let host_max = mirror.max_value();
        let host_current = mirror.current_value();
        if !host_max.is_finite() || !host_current.is_finite() {
            return Err(SyncError::NonFiniteNative {
                owner: owner.id,
                max: host_max,
                current: host_current,
            });
        }
        if host_max <= 0.0 {
            return Err(SyncError::NonPositiveNativeMax {
                owner: owner.id,
                value: host_max,
            });
        }

        let map = self.manager.map(owner.id);
        let health = HealthPair {
            max: map.get_or_create(&max_def),
            current: map.get_or_create(&current_def),
        };

        let slot = self.slot(owner.id);
        let mut state = slot.lock();

        let outcome = if state.is_current(self.config.scale_epoch) {
            let unchanged = state
                .fingerprint()
                .is_some_and(|last| last.matches(&health.fingerprint(host_max, host_current)));
            if unchanged && !force {
                return Ok(SyncOutcome::Unchanged);
            }
            self.reconcile_values(mirror, owner, &health, host_max, host_current)?
        } else {
            self.migrate(mirror, owner, &health, host_max, host_current)?
        };

        *state = OwnerSyncState::Reconciled {
            epoch: self.config.scale_epoch,
            fingerprint: health.fingerprint(mirror.max_value(), mirror.current_value()),
        };
        Ok(outcome)
    }

    fn migrate(
        &self,
        mirror: &mut dyn NativeMirror,
        owner: OwnerRef,
        health: &HealthPair,
        host_max: f64,
        host_current: f64,
    ) -> Result<SyncOutcome, SyncError> {
        let scale = self.config.scale_factor();
        let custom_max = if self.config.privileged.contains_category(owner.category) {
            self.config.stat.privileged_max_health
        } else {
            host_max * scale
        };
        let ratio = health_ratio(host_current, host_max);

        health.max.set_base_value(custom_max)?;
        let final_max = health.max.get_value();
        health.current.set_value(ratio * health_span(final_max))?;

        let mirrored_max = self.config.host_safe(final_max);
        mirror.set_max_value(mirrored_max);
        mirror.set_current_value(ratio * mirrored_max);

        if let Some(armor) = mirror.armor_value().filter(|armor| armor.is_finite())
            && let Some(defense) = self.manager.definition(&builtin::PHYSICAL_DEFENSE)
        {
            self.manager.set_base_value(owner, &defense, armor * scale)?;
        }

        debug!(
            target: "stat_runtime::sync",
            owner = %owner.id,
            host_max,
            host_current,
            custom_max = final_max,
            mirrored_max,
            ratio,
            "owner migrated"
        );
        self.events.publish(SyncEvent::OwnerMigrated {
            owner: owner.id,
            custom_max: final_max,
            host_max: mirrored_max,
        });
        Ok(SyncOutcome::Migrated)
    }

    fn reconcile_values(
        &self,
        mirror: &mut dyn NativeMirror,
        owner: OwnerRef,
        health: &HealthPair,
        host_max: f64,
        host_current: f64,
    ) -> Result<SyncOutcome, SyncError> {
        let epsilon = self.config.epsilon();
        let final_max = health.max.get_value();
        let span = health_span(final_max);
        let current = health.current.get_value();
        let mirrored_max = self.config.host_safe(final_max);

        let outcome = if (host_max - mirrored_max).abs() > epsilon {
            let ratio = health_ratio(host_current, host_max);
            health.current.set_value(ratio * span)?;
            mirror.set_max_value(mirrored_max);
            mirror.set_current_value(ratio * mirrored_max);
            SyncOutcome::MaxPropagated
        } else if span > 0.0 && (host_current - current * mirrored_max / span).abs() > epsilon {
            let pulled = (host_current * span / mirrored_max).clamp(0.0, span);
            health.current.set_value(pulled)?;
            SyncOutcome::CurrentCorrected
        } else {
            return Ok(SyncOutcome::Unchanged);
        };

        self.events.publish(SyncEvent::OwnerReconciled {
            owner: owner.id,
            outcome,
            custom_current: health.current.get_value(),
            host_current: mirror.current_value(),
        });
        Ok(outcome)
    }

    fn health_definitions(
        &self,
    ) -> Result<(Arc<AttributeDefinition>, Arc<AttributeDefinition>), SyncError> {
        let lookup = |id: &stat_core::Identifier| {
            self.manager
                .definition(id)
                .ok_or_else(|| SyncError::MissingDefinition { id: id.clone() })
        };
        Ok((
            lookup(&builtin::MAX_HEALTH)?,
            lookup(&builtin::CURRENT_HEALTH)?,
        ))
    }

    fn slot(&self, owner: OwnerId) -> Arc<Mutex<OwnerSyncState>> {
        Arc::clone(self.owners.entry(owner).or_default().value())
    }

    fn finish_pass(&self, mut report: SyncReport, started: Instant) -> SyncReport {
        report.elapsed = started.elapsed();
        self.metrics.record_pass(&report);

        if report.failed() > 0 {
            warn!(
                target: "stat_runtime::sync",
                processed = report.processed(),
                failed = report.failed(),
                "sync pass completed with failures"
            );
        } else {
            trace!(
                target: "stat_runtime::sync",
                processed = report.processed(),
                elapsed = ?report.elapsed,
                "sync pass completed"
            );
        }

        self.events.publish(SyncEvent::PassCompleted(report.summary()));
        report
    }
}

/// Host current/max ratio, clamped to `[0, 1]`.
fn health_ratio(current: f64, max: f64) -> f64 {
    (current / max).clamp(0.0, 1.0)
}

/// Custom max used for ratio arithmetic; an unbounded max counts as
/// [`StatConfig::SAFE_INFINITY_VALUE`].
pub(crate) fn health_span(max: f64) -> f64 {
    if max.is_finite() {
        max
    } else {
        StatConfig::SAFE_INFINITY_VALUE
    }
}

#[cfg(test)]
mod tests {
    use stat_core::AttributeRegistry;

    use super::*;

    struct Mirror {
        owner: OwnerRef,
        max: f64,
        current: f64,
    }

    impl NativeMirror for Mirror {
        fn owner(&self) -> OwnerRef {
            self.owner
        }

        fn max_value(&self) -> f64 {
            self.max
        }

        fn set_max_value(&mut self, value: f64) {
            self.max = value;
        }

        fn current_value(&self) -> f64 {
            self.current
        }

        fn set_current_value(&mut self, value: f64) {
            self.current = value;
        }
    }

    fn engine() -> SyncEngine {
        let registry = Arc::new(AttributeRegistry::with_builtins());
        SyncEngine::new(
            Arc::new(AttributeManager::new(registry)),
            SyncConfig::default(),
        )
    }

    #[test]
    fn stale_epoch_migrates_again() {
        let engine = engine();
        let mut mirror = Mirror {
            owner: OwnerRef::monster(1),
            max: 20.0,
            current: 20.0,
        };
        assert_eq!(engine.sync_owner(&mut mirror), Ok(SyncOutcome::Migrated));

        let slot = engine.slot(OwnerId(1));
        let fingerprint = *slot.lock().fingerprint().unwrap();
        *slot.lock() = OwnerSyncState::Reconciled {
            epoch: 0,
            fingerprint,
        };

        // host max is already scaled, so a second migration scales it again
        assert_eq!(engine.sync_owner(&mut mirror), Ok(SyncOutcome::Migrated));
        assert_eq!(mirror.max, 500.0);
        assert_eq!(engine.owner_state(OwnerId(1)).epoch(), Some(1));
    }

    #[test]
    fn unbounded_max_mirrors_the_ceiling() {
        let engine = engine();
        let owner = OwnerRef::monster(1);
        let mut mirror = Mirror {
            owner,
            max: 20.0,
            current: 20.0,
        };
        engine.sync_owner(&mut mirror).unwrap();

        let max_def = engine.manager().definition(&builtin::MAX_HEALTH).unwrap();
        let current_def = engine
            .manager()
            .definition(&builtin::CURRENT_HEALTH)
            .unwrap();
        assert_eq!(
            engine.manager().set_base_value(owner, &max_def, f64::INFINITY),
            Ok(true)
        );

        assert_eq!(
            engine.force_sync_owner(&mut mirror),
            Ok(SyncOutcome::MaxPropagated)
        );
        assert_eq!(mirror.max, 1024.0);
        assert_eq!(mirror.current, 1024.0);
        assert_eq!(
            engine.manager().value(owner, &current_def),
            StatConfig::SAFE_INFINITY_VALUE
        );

        assert_eq!(engine.sync_owner(&mut mirror), Ok(SyncOutcome::Unchanged));
        assert_eq!(engine.force_sync_owner(&mut mirror), Ok(SyncOutcome::Unchanged));

        // host damage is pulled against the finite stand-in
        mirror.current = 512.0;
        assert_eq!(
            engine.sync_owner(&mut mirror),
            Ok(SyncOutcome::CurrentCorrected)
        );
        assert_eq!(
            engine.manager().value(owner, &current_def),
            StatConfig::SAFE_INFINITY_VALUE / 2.0
        );
    }

    #[test]
    fn ratio_is_clamped_to_unit_range() {
        assert_eq!(health_ratio(30.0, 20.0), 1.0);
        assert_eq!(health_ratio(-5.0, 20.0), 0.0);
        assert_eq!(health_ratio(5.0, 20.0), 0.25);
    }

    #[test]
    fn concurrent_passes_over_one_owner_serialize() {
        let engine = Arc::new(engine());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    let mut mirror = Mirror {
                        owner: OwnerRef::monster(9),
                        max: 20.0,
                        current: 10.0,
                    };
                    engine.sync_owner(&mut mirror)
                })
            })
            .collect();

        let migrated = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .filter(|outcome| *outcome == SyncOutcome::Migrated)
            .count();
        assert_eq!(migrated, 1);
        assert_eq!(engine.tracked_owner_count(), 1);
    }
}
