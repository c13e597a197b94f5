//! Final value computation from base value and modifiers.
//!
//! Default formula:
//!
//! ```text
//! final = clamp((base + Σadditive) × (1 + Σmultiplicative))
//! ```
//!
//! A definition with a custom aggregation hook gets the first say whenever at
//! least one modifier is present; with no modifiers the result is always
//! `clamp(base)`. Priority never influences the result.

use crate::definition::{Aggregation, AttributeDefinition};
use crate::modifier::{Modifier, ModifierOperation};

/// Per-operation sums over a modifier set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModifierSums {
    pub additive: f64,
    pub multiplicative: f64,
}

impl ModifierSums {
    pub fn of<'a>(modifiers: impl IntoIterator<Item = &'a Modifier>) -> Self {
        modifiers
            .into_iter()
            .fold(Self::default(), |mut sums, modifier| {
                match modifier.operation {
                    ModifierOperation::Additive => sums.additive += modifier.amount,
                    ModifierOperation::Multiplicative => sums.multiplicative += modifier.amount,
                }
                sums
            })
    }

    /// `1 + Σmultiplicative`
    pub fn multiplier(&self) -> f64 {
        1.0 + self.multiplicative
    }

    /// Unclamped default formula.
    pub fn apply(&self, base: f64) -> f64 {
        (base + self.additive) * self.multiplier()
    }

    /// Base value that makes [`apply`](Self::apply) produce `target`.
    ///
    /// `None` when the multiplier is zero (within `f64::EPSILON`).
    pub fn invert(&self, target: f64) -> Option<f64> {
        let multiplier = self.multiplier();
        if multiplier.abs() <= f64::EPSILON {
            return None;
        }
        Some(target / multiplier - self.additive)
    }
}

/// Computes the final value of `definition` for `base` and `modifiers`.
///
/// `modifiers` is expected in display order; only custom hooks can observe it.
pub fn calculate(definition: &AttributeDefinition, base: f64, modifiers: &[Modifier]) -> f64 {
    if modifiers.is_empty() {
        return definition.clamp(base);
    }

    if let Aggregation::Custom(hook) = definition.aggregation()
        && let Some(value) = hook.aggregate(base, modifiers)
    {
        return definition.clamp(value);
    }

    definition.clamp(ModifierSums::of(modifiers).apply(base))
}
