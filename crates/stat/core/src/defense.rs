//! Defense categories and damage reduction.
//!
//! Effective defense against a damage type is the owner's defense of that
//! type plus every base defense type (physical and true defense), each counted
//! once. Reduction follows `d / (d + 100)`.

use crate::builtin;
use crate::ident::{Identifier, OwnerRef};
use crate::manager::AttributeManager;

/// Denominator offset of the reduction curve.
pub const REDUCTION_CONSTANT: f64 = 100.0;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DefenseType {
    Physical,
    Projectile,
    Explosion,
    Fire,
    TrueDefense,
}

impl DefenseType {
    pub const ALL: [DefenseType; 5] = [
        Self::Physical,
        Self::Projectile,
        Self::Explosion,
        Self::Fire,
        Self::TrueDefense,
    ];

    /// Base types contribute to every other type's effective defense.
    pub const fn is_base(self) -> bool {
        matches!(self, Self::Physical | Self::TrueDefense)
    }

    pub fn base_types() -> impl Iterator<Item = DefenseType> {
        Self::ALL.into_iter().filter(|ty| ty.is_base())
    }

    /// This type followed by the base types, without duplicates.
    pub fn effective_types(self) -> Vec<DefenseType> {
        let mut types = vec![self];
        types.extend(Self::base_types().filter(|ty| *ty != self));
        types
    }

    /// Attribute holding this type's defense value.
    pub const fn attribute(self) -> Identifier {
        match self {
            Self::Physical => builtin::PHYSICAL_DEFENSE,
            Self::Projectile => builtin::PROJECTILE_DEFENSE,
            Self::Explosion => builtin::EXPLOSION_DEFENSE,
            Self::Fire => builtin::FIRE_DEFENSE,
            Self::TrueDefense => builtin::TRUE_DEFENSE,
        }
    }

    pub fn translation_key(self) -> String {
        format!("defense.statcore.{self}")
    }
}

/// Fraction of incoming damage absorbed by `defense` (0 for non-positive values).
pub fn damage_reduction(defense: f64) -> f64 {
    if defense.is_nan() || defense <= 0.0 {
        0.0
    } else if defense.is_infinite() {
        1.0
    } else {
        defense / (defense + REDUCTION_CONSTANT)
    }
}

/// Sum of the owner's defense values that apply against `ty`.
///
/// Unregistered defense attributes contribute nothing.
pub fn effective_defense(manager: &AttributeManager, owner: OwnerRef, ty: DefenseType) -> f64 {
    ty.effective_types()
        .into_iter()
        .filter_map(|ty| manager.definition(&ty.attribute()))
        .map(|definition| manager.value(owner, &definition))
        .sum()
}

pub fn damage_reduction_for(manager: &AttributeManager, owner: OwnerRef, ty: DefenseType) -> f64 {
    damage_reduction(effective_defense(manager, owner, ty))
}

/// Damage left after the owner's defense against `ty`.
pub fn reduce_damage(
    manager: &AttributeManager,
    owner: OwnerRef,
    amount: f64,
    ty: DefenseType,
) -> f64 {
    amount * (1.0 - damage_reduction_for(manager, owner, ty))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::registry::AttributeRegistry;

    #[test]
    fn reduction_curve() {
        assert_eq!(damage_reduction(0.0), 0.0);
        assert_eq!(damage_reduction(-5.0), 0.0);
        assert_eq!(damage_reduction(100.0), 0.5);
        assert!((damage_reduction(300.0) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn effective_types_are_deduplicated() {
        assert_eq!(
            DefenseType::Fire.effective_types(),
            vec![DefenseType::Fire, DefenseType::Physical, DefenseType::TrueDefense]
        );
        assert_eq!(
            DefenseType::Physical.effective_types(),
            vec![DefenseType::Physical, DefenseType::TrueDefense]
        );
        assert_eq!(
            DefenseType::TrueDefense.effective_types(),
            vec![DefenseType::TrueDefense, DefenseType::Physical]
        );
    }

    #[test]
    fn effective_defense_sums_base_types() {
        let manager = AttributeManager::new(Arc::new(AttributeRegistry::with_builtins()));
        let owner = OwnerRef::player(1);
        let def = |id| manager.definition(&id).unwrap();

        manager.set_base_value(owner, &def(builtin::FIRE_DEFENSE), 30.0).unwrap();
        manager.set_base_value(owner, &def(builtin::PHYSICAL_DEFENSE), 50.0).unwrap();
        manager.set_base_value(owner, &def(builtin::TRUE_DEFENSE), 20.0).unwrap();
        manager.set_base_value(owner, &def(builtin::EXPLOSION_DEFENSE), 999.0).unwrap();

        assert_eq!(effective_defense(&manager, owner, DefenseType::Fire), 100.0);
        assert_eq!(damage_reduction_for(&manager, owner, DefenseType::Fire), 0.5);
        assert_eq!(reduce_damage(&manager, owner, 40.0, DefenseType::Fire), 20.0);
        assert_eq!(effective_defense(&manager, owner, DefenseType::Physical), 70.0);
    }

    #[test]
    fn translation_keys() {
        assert_eq!(
            DefenseType::TrueDefense.translation_key(),
            "defense.statcore.true_defense"
        );
    }

    #[test]
    fn unknown_owner_reads_without_registering() {
        let manager = AttributeManager::new(Arc::new(AttributeRegistry::with_builtins()));
        assert_eq!(effective_defense(&manager, OwnerRef::monster(6), DefenseType::Fire), 0.0);
        assert_eq!(manager.managed_owner_count(), 0);
    }
}
