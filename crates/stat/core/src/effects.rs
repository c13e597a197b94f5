//! Status effects expressed as tagged modifiers.
//!
//! Each effect owns one modifier source; applying an effect replaces that
//! source's modifiers, removing it drops them. Health boosts keep the
//! current/max health ratio across the change.

use std::sync::Arc;

use crate::builtin;
use crate::definition::AttributeDefinition;
use crate::ident::{Identifier, OwnerRef, STATCORE_NAMESPACE};
use crate::instance::ValueError;
use crate::manager::AttributeManager;
use crate::modifier::Modifier;

pub const RESISTANCE_SOURCE: Identifier =
    Identifier::from_static(STATCORE_NAMESPACE, "resistance_potion");
pub const HEALTH_BOOST_SOURCE: Identifier =
    Identifier::from_static(STATCORE_NAMESPACE, "health_boost_potion");

/// True defense granted per resistance level.
pub const RESISTANCE_DEFENSE_PER_LEVEL: f64 = 20.0;
/// Maximum health granted per health boost level.
pub const HEALTH_BOOST_PER_LEVEL: f64 = 20.0;

/// Replaces the owner's resistance modifiers with one `+20 × level` true defense bonus.
///
/// Returns `Ok(false)` when true defense is unregistered or does not apply.
pub fn apply_resistance(
    manager: &AttributeManager,
    owner: OwnerRef,
    level: u32,
) -> Result<bool, ValueError> {
    let Some(true_defense) = manager.definition(&builtin::TRUE_DEFENSE) else {
        return Ok(false);
    };
    remove_resistance(manager, owner);
    if level == 0 {
        return Ok(false);
    }

    let modifier = Modifier::additive(
        format!("resistance {level}"),
        RESISTANCE_DEFENSE_PER_LEVEL * f64::from(level),
    )
    .with_source(RESISTANCE_SOURCE);
    manager.add_modifier(owner, &true_defense, modifier)
}

/// Drops every resistance modifier; returns how many were removed.
pub fn remove_resistance(manager: &AttributeManager, owner: OwnerRef) -> usize {
    manager.remove_modifiers_by_source(owner.id, &RESISTANCE_SOURCE)
}

/// Replaces the owner's health boost with `+20 × level` maximum health.
///
/// Current health is scaled so the current/max ratio is unchanged.
pub fn apply_health_boost(
    manager: &AttributeManager,
    owner: OwnerRef,
    level: u32,
) -> Result<bool, ValueError> {
    let Some((max_health, current_health)) = health_definitions(manager) else {
        return Ok(false);
    };
    remove_health_boost(manager, owner)?;
    if level == 0 || !max_health.is_applicable_to(owner.category) {
        return Ok(false);
    }

    let ratio = health_ratio(manager, owner, &max_health, &current_health);
    let modifier = Modifier::additive(
        format!("health boost {level}"),
        HEALTH_BOOST_PER_LEVEL * f64::from(level),
    )
    .with_source(HEALTH_BOOST_SOURCE);
    manager.add_modifier(owner, &max_health, modifier)?;

    let new_max = manager.value(owner, &max_health);
    manager.set_value(owner, &current_health, new_max * ratio)?;
    Ok(true)
}

/// Drops the health boost, keeping the health ratio and capping at the new maximum.
///
/// Returns how many modifiers were removed.
pub fn remove_health_boost(manager: &AttributeManager, owner: OwnerRef) -> Result<usize, ValueError> {
    let Some((max_health, current_health)) = health_definitions(manager) else {
        return Ok(0);
    };
    let ratio = health_ratio(manager, owner, &max_health, &current_health);
    let removed = manager.remove_modifiers_by_source(owner.id, &HEALTH_BOOST_SOURCE);
    if removed == 0 {
        return Ok(0);
    }

    let new_max = manager.value(owner, &max_health);
    manager.set_value(owner, &current_health, (new_max * ratio).min(new_max))?;
    Ok(removed)
}

fn health_definitions(
    manager: &AttributeManager,
) -> Option<(Arc<AttributeDefinition>, Arc<AttributeDefinition>)> {
    Some((
        manager.definition(&builtin::MAX_HEALTH)?,
        manager.definition(&builtin::CURRENT_HEALTH)?,
    ))
}

fn health_ratio(
    manager: &AttributeManager,
    owner: OwnerRef,
    max_health: &AttributeDefinition,
    current_health: &AttributeDefinition,
) -> f64 {
    let max = manager.value(owner, max_health);
    if max > 0.0 && max.is_finite() {
        manager.value(owner, current_health) / max
    } else {
        1.0
    }
}
