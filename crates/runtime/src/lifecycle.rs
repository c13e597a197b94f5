//! Owner lifecycle and host event handling.
//!
//! Hosts call these from their own event hooks. Amounts coming from the host
//! are in native units and get scaled before touching custom values. Heals
//! and damage land on custom current health first and reach the host through
//! the ceiling ratio; every handler that moves health ends with a forced pass
//! so custom and host values agree when it returns.

use std::sync::Arc;

use stat_core::{AttributeManager, DefenseType, OwnerId, builtin, defense, effects};
use tracing::{debug, info};

use crate::host::NativeMirror;
use crate::sync::{SyncEngine, SyncError, SyncOutcome, health_span};

pub struct Lifecycle {
    manager: Arc<AttributeManager>,
    engine: Arc<SyncEngine>,
}

impl Lifecycle {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self {
            manager: Arc::clone(engine.manager()),
            engine,
        }
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Creates the owner's applicable attributes and migrates it.
    pub fn owner_joined(&self, mirror: &mut dyn NativeMirror) -> Result<SyncOutcome, SyncError> {
        let owner = mirror.owner();
        let map = self.manager.initialize_owner(owner);
        let outcome = self.engine.sync_owner(mirror)?;

        info!(
            target: "stat_runtime::lifecycle",
            owner = %owner.id,
            category = %owner.category,
            attributes = map.len(),
            outcome = %outcome,
            "owner joined"
        );
        Ok(outcome)
    }

    /// Frees the owner's attributes and sync state.
    pub fn owner_left(&self, owner: OwnerId) -> bool {
        let removed = self.manager.remove_owner(owner);
        let tracked = self.engine.forget_owner(owner);
        if removed || tracked {
            info!(target: "stat_runtime::lifecycle", owner = %owner, "owner left");
        }
        removed || tracked
    }

    /// Drops every owner's attributes and sync state.
    pub fn shutdown(&self) {
        let owners = self.manager.managed_owner_count();
        self.manager.clear_all();
        self.engine.clear();
        info!(target: "stat_runtime::lifecycle", owners, "attribute state cleared");
    }

    /// Applies a native heal of `amount` to the mirror, scaled into custom units.
    ///
    /// Returns the scaled amount.
    pub fn native_healed(
        &self,
        mirror: &mut dyn NativeMirror,
        amount: f64,
    ) -> Result<f64, SyncError> {
        let scaled = amount.max(0.0) * self.engine.config().scale_factor();
        self.shift_health(mirror, scaled)?;

        debug!(
            target: "stat_runtime::lifecycle",
            owner = %mirror.owner().id,
            amount,
            scaled,
            "heal scaled"
        );
        self.engine.force_sync_owner(mirror)?;
        Ok(scaled)
    }

    /// Applies native damage of `amount` after scaling and the owner's defense.
    ///
    /// Returns the damage dealt in custom units.
    pub fn native_damaged(
        &self,
        mirror: &mut dyn NativeMirror,
        amount: f64,
        ty: DefenseType,
    ) -> Result<f64, SyncError> {
        let owner = mirror.owner();
        let scaled = amount.max(0.0) * self.engine.config().scale_factor();
        let reduction = defense::damage_reduction_for(&self.manager, owner, ty);
        let dealt = scaled * (1.0 - reduction);
        self.shift_health(mirror, -dealt)?;

        debug!(
            target: "stat_runtime::lifecycle",
            owner = %owner.id,
            amount,
            scaled,
            defense = %ty,
            reduction,
            dealt,
            "damage scaled"
        );
        self.engine.force_sync_owner(mirror)?;
        Ok(dealt)
    }

    /// Re-derives physical defense from native armor.
    ///
    /// Returns whether the base value moved.
    pub fn equipment_changed(&self, mirror: &mut dyn NativeMirror) -> Result<bool, SyncError> {
        let owner = mirror.owner();
        let Some(armor) = mirror.armor_value().filter(|armor| armor.is_finite()) else {
            return Ok(false);
        };
        let Some(physical) = self.manager.definition(&builtin::PHYSICAL_DEFENSE) else {
            return Err(SyncError::MissingDefinition {
                id: builtin::PHYSICAL_DEFENSE,
            });
        };

        let target = armor * self.engine.config().scale_factor();
        let current = self.manager.base_value(owner, &physical);
        if (current - target).abs() <= self.engine.config().armor_tolerance {
            return Ok(false);
        }

        let changed = self.manager.set_base_value(owner, &physical, target)?;
        if changed {
            debug!(
                target: "stat_runtime::lifecycle",
                owner = %owner.id,
                armor,
                physical_defense = target,
                "armor refreshed"
            );
        }
        Ok(changed)
    }

    /// Replaces the owner's resistance effect; `level` 0 only removes it.
    pub fn apply_resistance(
        &self,
        mirror: &mut dyn NativeMirror,
        level: u32,
    ) -> Result<bool, SyncError> {
        Ok(effects::apply_resistance(&self.manager, mirror.owner(), level)?)
    }

    pub fn remove_resistance(&self, mirror: &mut dyn NativeMirror) -> usize {
        effects::remove_resistance(&self.manager, mirror.owner())
    }

    /// Replaces the owner's health boost and pushes the new max to the host.
    pub fn apply_health_boost(
        &self,
        mirror: &mut dyn NativeMirror,
        level: u32,
    ) -> Result<bool, SyncError> {
        let applied = effects::apply_health_boost(&self.manager, mirror.owner(), level)?;
        self.engine.force_sync_owner(mirror)?;
        Ok(applied)
    }

    pub fn remove_health_boost(&self, mirror: &mut dyn NativeMirror) -> Result<usize, SyncError> {
        let removed = effects::remove_health_boost(&self.manager, mirror.owner())?;
        if removed > 0 {
            self.engine.force_sync_owner(mirror)?;
        }
        Ok(removed)
    }

    /// Moves custom current health by `delta` within `[0, max]` and writes the
    /// host-safe equivalent to the mirror.
    fn shift_health(&self, mirror: &mut dyn NativeMirror, delta: f64) -> Result<(), SyncError> {
        let owner = mirror.owner();
        let max_def = self
            .manager
            .definition(&builtin::MAX_HEALTH)
            .ok_or(SyncError::MissingDefinition {
                id: builtin::MAX_HEALTH,
            })?;
        let current_def = self
            .manager
            .definition(&builtin::CURRENT_HEALTH)
            .ok_or(SyncError::MissingDefinition {
                id: builtin::CURRENT_HEALTH,
            })?;
        if !max_def.is_applicable_to(owner.category)
            || !current_def.is_applicable_to(owner.category)
        {
            return Ok(());
        }

        let max = self.manager.value(owner, &max_def);
        let span = health_span(max);
        let next = (self.manager.value(owner, &current_def) + delta).clamp(0.0, span);
        self.manager.set_value(owner, &current_def, next)?;

        let mirrored_max = self.engine.config().host_safe(max);
        mirror.set_max_value(mirrored_max);
        mirror.set_current_value(next * mirrored_max / span);
        Ok(())
    }
}
