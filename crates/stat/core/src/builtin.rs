//! Builtin `statcore` attribute catalog.
//!
//! | id | default | min | max |
//! |---|---|---|---|
//! | `statcore:max_health` | 100 | 1 | unbounded |
//! | `statcore:current_health` | 100 | 0 | unbounded |
//! | `statcore:health_regeneration` | 0 | 0 | 100 |
//! | `statcore:*_defense` | 0 | 0 | 1000 |

use crate::config::StatConfig;
use crate::definition::AttributeDefinition;
use crate::ident::{Identifier, STATCORE_NAMESPACE};
use crate::registry::AttributeRegistry;

pub const MAX_HEALTH: Identifier = Identifier::from_static(STATCORE_NAMESPACE, "max_health");
pub const CURRENT_HEALTH: Identifier =
    Identifier::from_static(STATCORE_NAMESPACE, "current_health");
pub const HEALTH_REGENERATION: Identifier =
    Identifier::from_static(STATCORE_NAMESPACE, "health_regeneration");

pub const PHYSICAL_DEFENSE: Identifier =
    Identifier::from_static(STATCORE_NAMESPACE, "physical_defense");
pub const PROJECTILE_DEFENSE: Identifier =
    Identifier::from_static(STATCORE_NAMESPACE, "projectile_defense");
pub const EXPLOSION_DEFENSE: Identifier =
    Identifier::from_static(STATCORE_NAMESPACE, "explosion_defense");
pub const FIRE_DEFENSE: Identifier = Identifier::from_static(STATCORE_NAMESPACE, "fire_defense");
pub const TRUE_DEFENSE: Identifier = Identifier::from_static(STATCORE_NAMESPACE, "true_defense");

/// Upper limit shared by every defense attribute.
pub const DEFENSE_MAX: f64 = 1000.0;
/// Upper limit for health regeneration.
pub const REGENERATION_MAX: f64 = 100.0;

pub fn max_health() -> AttributeDefinition {
    AttributeDefinition::universal(
        MAX_HEALTH,
        StatConfig::PLAYER_DEFAULT_MAX_HEALTH,
        1.0,
        f64::INFINITY,
    )
}

pub fn current_health() -> AttributeDefinition {
    AttributeDefinition::universal(
        CURRENT_HEALTH,
        StatConfig::PLAYER_DEFAULT_MAX_HEALTH,
        0.0,
        f64::INFINITY,
    )
}

pub fn health_regeneration() -> AttributeDefinition {
    AttributeDefinition::universal(HEALTH_REGENERATION, 0.0, 0.0, REGENERATION_MAX)
}

fn defense(id: Identifier) -> AttributeDefinition {
    AttributeDefinition::universal(id, 0.0, 0.0, DEFENSE_MAX)
}

pub fn physical_defense() -> AttributeDefinition {
    defense(PHYSICAL_DEFENSE)
}

pub fn projectile_defense() -> AttributeDefinition {
    defense(PROJECTILE_DEFENSE)
}

pub fn explosion_defense() -> AttributeDefinition {
    defense(EXPLOSION_DEFENSE)
}

pub fn fire_defense() -> AttributeDefinition {
    defense(FIRE_DEFENSE)
}

pub fn true_defense() -> AttributeDefinition {
    defense(TRUE_DEFENSE)
}

/// Every builtin definition, health first.
pub fn all() -> Vec<AttributeDefinition> {
    vec![
        max_health(),
        current_health(),
        health_regeneration(),
        physical_defense(),
        projectile_defense(),
        explosion_defense(),
        fire_defense(),
        true_defense(),
    ]
}

/// Registers the builtin catalog, skipping ids that are already present.
///
/// Returns the number of newly registered definitions.
pub fn register_all(registry: &AttributeRegistry) -> usize {
    all()
        .into_iter()
        .filter_map(|definition| registry.register(definition).ok())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Bound;

    #[test]
    fn catalog_matches_table() {
        let registry = AttributeRegistry::with_builtins();
        assert_eq!(registry.len(), 8);

        let hp = registry.get(&MAX_HEALTH).unwrap();
        assert_eq!(hp.default_value(), 100.0);
        assert_eq!(hp.min(), Bound::Limited(1.0));
        assert_eq!(hp.max(), Bound::Unbounded);

        let regen = registry.get(&HEALTH_REGENERATION).unwrap();
        assert_eq!(regen.max(), Bound::Limited(100.0));

        for id in [
            PHYSICAL_DEFENSE,
            PROJECTILE_DEFENSE,
            EXPLOSION_DEFENSE,
            FIRE_DEFENSE,
            TRUE_DEFENSE,
        ] {
            let def = registry.get(&id).unwrap();
            assert_eq!(def.max(), Bound::Limited(DEFENSE_MAX));
            assert_eq!(def.categories(), crate::category::CategorySet::all());
        }
    }

    #[test]
    fn register_all_is_idempotent() {
        let registry = AttributeRegistry::new();
        assert_eq!(register_all(&registry), 8);
        assert_eq!(register_all(&registry), 0);
        assert_eq!(registry.len(), 8);
    }
}
