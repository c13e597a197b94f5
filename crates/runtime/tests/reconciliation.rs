mod common;

use std::sync::Arc;

use common::{FakeMirror, assert_close, builtin_manager, init_tracing};
use stat_core::{
    AttributeDefinition, AttributeManager, AttributeRegistry, DefenseType, ErrorSeverity,
    Modifier, OwnerId, StatError, builtin,
};
use stat_runtime::{
    Lifecycle, NativeMirror, OwnerSyncState, SyncConfig, SyncEngine, SyncError, SyncEvent,
    SyncOutcome,
};

fn engine() -> SyncEngine {
    init_tracing();
    SyncEngine::new(builtin_manager(), SyncConfig::default())
}

fn custom_health(engine: &SyncEngine, mirror: &FakeMirror) -> (f64, f64) {
    let manager = engine.manager();
    let max = manager
        .definition(&builtin::MAX_HEALTH)
        .expect("max health registered");
    let current = manager
        .definition(&builtin::CURRENT_HEALTH)
        .expect("current health registered");
    (
        manager.value(mirror.owner(), &max),
        manager.value(mirror.owner(), &current),
    )
}

#[test]
fn migration_scales_native_health() {
    let engine = engine();
    let mut mirror = FakeMirror::monster(1, 20.0, 10.0);

    let outcome = engine.sync_owner(&mut mirror).unwrap();

    assert_eq!(outcome, SyncOutcome::Migrated);
    let (max, current) = custom_health(&engine, &mirror);
    assert_close(max, 100.0);
    assert_close(current, 50.0);
    assert_close(mirror.max, 100.0);
    assert_close(mirror.current, 50.0);
    assert_eq!(engine.owner_state(OwnerId(1)).epoch(), Some(1));
}

#[test]
fn privileged_owner_gets_fixed_max() {
    let engine = engine();
    let mut mirror = FakeMirror::player(1, 40.0, 40.0);

    engine.sync_owner(&mut mirror).unwrap();

    let (max, current) = custom_health(&engine, &mirror);
    assert_close(max, 100.0);
    assert_close(current, 100.0);
    assert_close(mirror.max, 100.0);
}

#[test]
fn repeated_pass_is_unchanged() {
    let engine = engine();
    let mut mirror = FakeMirror::monster(1, 20.0, 15.0);

    engine.sync_owner(&mut mirror).unwrap();
    let after_migration = (mirror.max, mirror.current);

    assert_eq!(engine.sync_owner(&mut mirror).unwrap(), SyncOutcome::Unchanged);
    assert_eq!(
        engine.force_sync_owner(&mut mirror).unwrap(),
        SyncOutcome::Unchanged
    );
    assert_eq!((mirror.max, mirror.current), after_migration);
}

#[test]
fn host_ceiling_clamps_mirror_only() {
    let engine = engine();
    let mut mirror = FakeMirror::monster(1, 2000.0, 2000.0);

    engine.sync_owner(&mut mirror).unwrap();

    let (max, current) = custom_health(&engine, &mirror);
    assert_close(max, 10_000.0);
    assert_close(current, 10_000.0);
    assert_close(mirror.max, 1024.0);
    assert_close(mirror.current, 1024.0);
    assert_eq!(engine.sync_owner(&mut mirror).unwrap(), SyncOutcome::Unchanged);
}

#[test]
fn custom_max_change_is_pushed_to_host() {
    let engine = engine();
    let mut mirror = FakeMirror::monster(1, 20.0, 10.0);
    engine.sync_owner(&mut mirror).unwrap();

    let max_def = engine
        .manager()
        .definition(&builtin::MAX_HEALTH)
        .unwrap();
    engine
        .manager()
        .add_modifier(mirror.owner(), &max_def, Modifier::additive("buff", 50.0))
        .unwrap();

    assert_eq!(
        engine.sync_owner(&mut mirror).unwrap(),
        SyncOutcome::MaxPropagated
    );
    let (max, current) = custom_health(&engine, &mirror);
    assert_close(max, 150.0);
    assert_close(current, 75.0);
    assert_close(mirror.max, 150.0);
    assert_close(mirror.current, 75.0);

    assert_eq!(engine.sync_owner(&mut mirror).unwrap(), SyncOutcome::Unchanged);
    assert_eq!(
        engine.force_sync_owner(&mut mirror).unwrap(),
        SyncOutcome::Unchanged
    );
    assert_close(mirror.current, 75.0);
}

#[test]
fn host_current_change_is_pulled() {
    let engine = engine();
    let mut mirror = FakeMirror::monster(1, 20.0, 10.0);
    engine.sync_owner(&mut mirror).unwrap();

    mirror.current = 30.0;

    assert_eq!(
        engine.sync_owner(&mut mirror).unwrap(),
        SyncOutcome::CurrentCorrected
    );
    let (_, current) = custom_health(&engine, &mirror);
    assert_close(current, 30.0);
    assert_close(mirror.current, 30.0);

    assert_eq!(engine.sync_owner(&mut mirror).unwrap(), SyncOutcome::Unchanged);
    assert_eq!(
        engine.force_sync_owner(&mut mirror).unwrap(),
        SyncOutcome::Unchanged
    );
    let (_, current) = custom_health(&engine, &mirror);
    assert_close(current, 30.0);
}

#[test]
fn current_is_pulled_through_the_ceiling_ratio() {
    let engine = engine();
    let mut mirror = FakeMirror::monster(1, 2000.0, 2000.0);
    engine.sync_owner(&mut mirror).unwrap();

    mirror.current = 512.0;
    assert_eq!(
        engine.sync_owner(&mut mirror).unwrap(),
        SyncOutcome::CurrentCorrected
    );

    let (_, current) = custom_health(&engine, &mirror);
    assert_close(current, 5000.0);
}

#[test]
fn batch_continues_past_failing_owner() {
    let engine = engine();
    let mut healthy = FakeMirror::monster(1, 20.0, 20.0);
    let mut broken = FakeMirror::monster(2, 0.0, 0.0);
    let mut other = FakeMirror::monster(3, 10.0, 5.0);

    let mirrors: Vec<&mut dyn NativeMirror> = vec![&mut healthy, &mut broken, &mut other];
    let report = engine.sync_owners(mirrors);

    assert_eq!(report.migrated, 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.processed(), 3);
    assert_eq!(report.failures[0].owner, OwnerId(2));
    assert!(matches!(
        report.failures[0].error,
        SyncError::NonPositiveNativeMax { value, .. } if value == 0.0
    ));
    assert_eq!(
        engine.owner_state(OwnerId(2)),
        OwnerSyncState::Uninitialized
    );
    assert_close(other.max, 50.0);

    let metrics = engine.metrics().snapshot();
    assert_eq!(metrics.migrated, 2);
    assert_eq!(metrics.failed, 1);
    assert_eq!(metrics.passes, 1);
}

#[test]
fn non_finite_host_values_are_rejected() {
    let engine = engine();
    let mut mirror = FakeMirror::monster(1, f64::NAN, 10.0);

    let err = engine.sync_owner(&mut mirror).unwrap_err();
    assert!(matches!(err, SyncError::NonFiniteNative { .. }));
    assert_eq!(err.severity(), ErrorSeverity::Recoverable);
}

#[test]
fn forgotten_owner_migrates_again() {
    let engine = engine();
    let mut mirror = FakeMirror::monster(1, 20.0, 20.0);
    engine.sync_owner(&mut mirror).unwrap();

    assert!(engine.forget_owner(OwnerId(1)));
    assert_eq!(engine.tracked_owner_count(), 0);
    assert_eq!(engine.sync_owner(&mut mirror).unwrap(), SyncOutcome::Migrated);
}

#[test]
fn state_records_scale_epoch() {
    let engine = engine();
    let mut mirror = FakeMirror::monster(1, 20.0, 20.0);
    engine.sync_owner(&mut mirror).unwrap();

    let state = engine.owner_state(OwnerId(1));
    assert!(state.is_current(1));
    assert!(!state.is_current(2));
}

#[test]
fn missing_health_definitions_fail_internally() {
    init_tracing();
    let manager = Arc::new(AttributeManager::new(Arc::new(AttributeRegistry::new())));
    let engine = SyncEngine::new(manager, SyncConfig::default());
    let mut mirror = FakeMirror::monster(1, 20.0, 20.0);

    let err = engine.sync_owner(&mut mirror).unwrap_err();
    assert_eq!(
        err,
        SyncError::MissingDefinition {
            id: builtin::MAX_HEALTH
        }
    );
    assert_eq!(err.severity(), ErrorSeverity::Internal);
}

#[test]
fn categories_without_health_are_not_applicable() {
    init_tracing();
    let registry = AttributeRegistry::new();
    registry
        .register(AttributeDefinition::player_only(
            builtin::MAX_HEALTH,
            100.0,
            1.0,
            f64::INFINITY,
        ))
        .unwrap();
    registry
        .register(AttributeDefinition::player_only(
            builtin::CURRENT_HEALTH,
            100.0,
            0.0,
            f64::INFINITY,
        ))
        .unwrap();
    let engine = SyncEngine::new(
        Arc::new(AttributeManager::new(Arc::new(registry))),
        SyncConfig::default(),
    );

    let mut monster = FakeMirror::monster(1, 20.0, 20.0);
    assert_eq!(
        engine.sync_owner(&mut monster).unwrap(),
        SyncOutcome::NotApplicable
    );
    assert_close(monster.max, 20.0);
}

#[test]
fn events_follow_changes() {
    let engine = engine();
    let mut rx = engine.events().subscribe();
    let mut mirror = FakeMirror::monster(1, 20.0, 10.0);

    engine.sync_owner(&mut mirror).unwrap();
    engine.sync_owner(&mut mirror).unwrap();

    assert!(matches!(
        rx.try_recv().unwrap(),
        SyncEvent::OwnerMigrated { owner: OwnerId(1), .. }
    ));
    assert!(rx.try_recv().is_err());
}

#[test]
fn migration_copies_scaled_armor() {
    let engine = engine();
    let mut mirror = FakeMirror::monster(1, 20.0, 20.0).with_armor(20.0);
    engine.sync_owner(&mut mirror).unwrap();

    let physical = engine
        .manager()
        .definition(&builtin::PHYSICAL_DEFENSE)
        .unwrap();
    assert_close(engine.manager().base_value(mirror.owner(), &physical), 100.0);
}

// ===== lifecycle =====

fn lifecycle() -> Lifecycle {
    Lifecycle::new(Arc::new(engine()))
}

#[test]
fn joined_owner_is_initialized_and_migrated() {
    let lifecycle = lifecycle();
    let mut mirror = FakeMirror::monster(7, 20.0, 20.0);

    assert_eq!(
        lifecycle.owner_joined(&mut mirror).unwrap(),
        SyncOutcome::Migrated
    );
    let manager = lifecycle.engine().manager();
    let true_defense = manager.definition(&builtin::TRUE_DEFENSE).unwrap();
    assert!(manager.has_map(OwnerId(7)));
    assert!(manager.has_attribute(mirror.owner(), &true_defense));

    assert!(lifecycle.owner_left(OwnerId(7)));
    assert!(!manager.has_map(OwnerId(7)));
    assert_eq!(lifecycle.engine().tracked_owner_count(), 0);
    assert!(!lifecycle.owner_left(OwnerId(7)));
}

#[test]
fn damage_is_scaled_and_reduced_by_defense() {
    let lifecycle = lifecycle();
    let mut mirror = FakeMirror::monster(1, 20.0, 20.0).with_armor(20.0);
    lifecycle.owner_joined(&mut mirror).unwrap();

    let dealt = lifecycle
        .native_damaged(&mut mirror, 4.0, DefenseType::Physical)
        .unwrap();

    // 4 × 5 = 20 against 100 defense (50% reduction)
    assert_close(dealt, 10.0);
    assert_close(mirror.current, 90.0);
    let (_, current) = custom_health(lifecycle.engine(), &mirror);
    assert_close(current, 90.0);
}

#[test]
fn heal_is_scaled_and_capped() {
    let lifecycle = lifecycle();
    let mut mirror = FakeMirror::monster(1, 20.0, 10.0);
    lifecycle.owner_joined(&mut mirror).unwrap();

    assert_close(lifecycle.native_healed(&mut mirror, 2.0).unwrap(), 10.0);
    assert_close(mirror.current, 60.0);

    lifecycle.native_healed(&mut mirror, 100.0).unwrap();
    assert_close(mirror.current, 100.0);
    let (_, current) = custom_health(lifecycle.engine(), &mirror);
    assert_close(current, 100.0);
}

#[test]
fn damage_above_the_ceiling_lands_in_custom_units() {
    let lifecycle = lifecycle();
    let mut mirror = FakeMirror::monster(1, 2000.0, 2000.0);
    lifecycle.owner_joined(&mut mirror).unwrap();
    assert_close(mirror.max, 1024.0);

    let dealt = lifecycle
        .native_damaged(&mut mirror, 4.0, DefenseType::Physical)
        .unwrap();

    assert_close(dealt, 20.0);
    let (max, current) = custom_health(lifecycle.engine(), &mirror);
    assert_close(max, 10_000.0);
    assert_close(current, 9980.0);
    assert_close(mirror.max, 1024.0);
    assert_close(mirror.current, 9980.0 * 1024.0 / 10_000.0);

    assert_close(lifecycle.native_healed(&mut mirror, 2.0).unwrap(), 10.0);
    let (_, current) = custom_health(lifecycle.engine(), &mirror);
    assert_close(current, 9990.0);
    assert_close(mirror.current, 9990.0 * 1024.0 / 10_000.0);
    assert_eq!(
        lifecycle.engine().sync_owner(&mut mirror).unwrap(),
        SyncOutcome::Unchanged
    );
}

#[test]
fn equipment_change_refreshes_physical_defense() {
    let lifecycle = lifecycle();
    let mut mirror = FakeMirror::monster(1, 20.0, 20.0).with_armor(20.0);
    lifecycle.owner_joined(&mut mirror).unwrap();

    assert!(!lifecycle.equipment_changed(&mut mirror).unwrap());

    mirror.armor = Some(10.0);
    assert!(lifecycle.equipment_changed(&mut mirror).unwrap());

    let manager = lifecycle.engine().manager();
    let physical = manager.definition(&builtin::PHYSICAL_DEFENSE).unwrap();
    assert_close(manager.base_value(mirror.owner(), &physical), 50.0);
}

#[test]
fn health_boost_moves_host_max_and_keeps_ratio() {
    let lifecycle = lifecycle();
    let mut mirror = FakeMirror::monster(1, 20.0, 10.0);
    lifecycle.owner_joined(&mut mirror).unwrap();

    assert!(lifecycle.apply_health_boost(&mut mirror, 1).unwrap());
    assert_close(mirror.max, 120.0);
    assert_close(mirror.current, 60.0);

    assert_eq!(lifecycle.remove_health_boost(&mut mirror).unwrap(), 1);
    assert_close(mirror.max, 100.0);
    assert_close(mirror.current, 50.0);
    let (max, current) = custom_health(lifecycle.engine(), &mirror);
    assert_close(max, 100.0);
    assert_close(current, 50.0);
}

#[test]
fn resistance_reduces_damage() {
    let lifecycle = lifecycle();
    let mut mirror = FakeMirror::monster(1, 20.0, 20.0);
    lifecycle.owner_joined(&mut mirror).unwrap();

    // level 5 → 100 true defense, applied to every damage type
    assert!(lifecycle.apply_resistance(&mut mirror, 5).unwrap());
    let dealt = lifecycle
        .native_damaged(&mut mirror, 4.0, DefenseType::Fire)
        .unwrap();
    assert_close(dealt, 10.0);

    assert_eq!(lifecycle.remove_resistance(&mut mirror), 1);
}

#[test]
fn shutdown_clears_everything() {
    let lifecycle = lifecycle();
    let mut first = FakeMirror::monster(1, 20.0, 20.0);
    let mut second = FakeMirror::player(2, 20.0, 20.0);
    lifecycle.owner_joined(&mut first).unwrap();
    lifecycle.owner_joined(&mut second).unwrap();

    lifecycle.shutdown();

    assert_eq!(lifecycle.engine().manager().managed_owner_count(), 0);
    assert_eq!(lifecycle.engine().tracked_owner_count(), 0);
}
