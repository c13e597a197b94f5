//! Attribute definitions: identity, bounds, applicability and aggregation.
//!
//! Definitions are immutable once registered; the registry hands them out as
//! `Arc<AttributeDefinition>` and every instance keeps one.

use std::fmt;
use std::sync::Arc;

use crate::category::{CategorySet, EntityCategory};
use crate::ident::Identifier;
use crate::modifier::Modifier;

/// One side of an attribute's value range.
///
/// An unbounded side is never clamped. Infinite floats passed to
/// [`Bound::from_f64`] become `Unbounded`, so a numeric infinity is never
/// mistaken for a configured limit. NaN stays a (broken) limit so that
/// registration rejects it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bound {
    Unbounded,
    Limited(f64),
}

impl Bound {
    pub fn from_f64(value: f64) -> Self {
        if value.is_infinite() {
            Self::Unbounded
        } else {
            Self::Limited(value)
        }
    }

    pub const fn limit(&self) -> Option<f64> {
        match self {
            Self::Unbounded => None,
            Self::Limited(value) => Some(*value),
        }
    }

    pub const fn is_limited(&self) -> bool {
        matches!(self, Self::Limited(_))
    }
}

impl From<f64> for Bound {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

/// Replacement for the default aggregation formula.
///
/// Receives the base value and the current modifiers (display ordered).
/// Returning `None` falls back to the default formula; a returned value is
/// still clamped to the definition's bounds.
pub trait CustomAggregation: Send + Sync {
    fn aggregate(&self, base: f64, modifiers: &[Modifier]) -> Option<f64>;
}

impl<F> CustomAggregation for F
where
    F: Fn(f64, &[Modifier]) -> Option<f64> + Send + Sync,
{
    fn aggregate(&self, base: f64, modifiers: &[Modifier]) -> Option<f64> {
        self(base, modifiers)
    }
}

/// How an instance turns base + modifiers into a final value.
#[derive(Clone, Default)]
pub enum Aggregation {
    /// `(base + Σadditive) × (1 + Σmultiplicative)`
    #[default]
    DefaultFormula,
    Custom(Arc<dyn CustomAggregation>),
}

impl Aggregation {
    pub fn custom(hook: impl CustomAggregation + 'static) -> Self {
        Self::Custom(Arc::new(hook))
    }

    pub const fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Debug for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultFormula => f.write_str("DefaultFormula"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Immutable description of one attribute.
#[derive(Clone, Debug)]
pub struct AttributeDefinition {
    id: Identifier,
    default_value: f64,
    min: Bound,
    max: Bound,
    stackable: bool,
    categories: CategorySet,
    aggregation: Aggregation,
}

impl AttributeDefinition {
    /// Definition applicable to the given categories.
    ///
    /// Infinite `min`/`max` mean "no limit on that side".
    pub fn custom(
        id: Identifier,
        default_value: f64,
        min: f64,
        max: f64,
        categories: CategorySet,
    ) -> Self {
        Self {
            id,
            default_value,
            min: Bound::from_f64(min),
            max: Bound::from_f64(max),
            stackable: true,
            categories,
            aggregation: Aggregation::DefaultFormula,
        }
    }

    /// Applies to every category.
    pub fn universal(id: Identifier, default_value: f64, min: f64, max: f64) -> Self {
        Self::custom(id, default_value, min, max, CategorySet::all())
    }

    pub fn player_only(id: Identifier, default_value: f64, min: f64, max: f64) -> Self {
        Self::custom(id, default_value, min, max, CategorySet::PLAYER)
    }

    /// Players and monsters.
    pub fn combat_only(id: Identifier, default_value: f64, min: f64, max: f64) -> Self {
        Self::custom(id, default_value, min, max, CategorySet::COMBAT)
    }

    /// Every non-player category.
    pub fn entity_only(id: Identifier, default_value: f64, min: f64, max: f64) -> Self {
        Self::custom(id, default_value, min, max, CategorySet::NON_PLAYER)
    }

    pub fn with_bounds(mut self, min: Bound, max: Bound) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_stackable(mut self, stackable: bool) -> Self {
        self.stackable = stackable;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_custom_aggregation(self, hook: impl CustomAggregation + 'static) -> Self {
        self.with_aggregation(Aggregation::custom(hook))
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    pub fn min(&self) -> Bound {
        self.min
    }

    pub fn max(&self) -> Bound {
        self.max
    }

    /// Informational only; instances always accept several modifiers.
    pub fn is_stackable(&self) -> bool {
        self.stackable
    }

    pub fn categories(&self) -> CategorySet {
        self.categories
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    pub fn has_min_limit(&self) -> bool {
        self.min.is_limited()
    }

    pub fn has_max_limit(&self) -> bool {
        self.max.is_limited()
    }

    pub fn is_applicable_to(&self, category: EntityCategory) -> bool {
        self.categories.contains_category(category)
    }

    /// Clamps `value` to the limited sides of the range.
    pub fn clamp(&self, value: f64) -> f64 {
        let value = match self.min {
            Bound::Limited(min) if value < min => min,
            _ => value,
        };
        match self.max {
            Bound::Limited(max) if value > max => max,
            _ => value,
        }
    }

    /// Localization key, `attribute.<namespace>.<path>`.
    pub fn translation_key(&self) -> String {
        format!(
            "attribute.{}.{}",
            self.id.namespace(),
            self.id.path().replace('/', ".")
        )
    }

    /// Checks the definition is internally consistent.
    ///
    /// Returns a human-readable reason on failure.
    pub(crate) fn check(&self) -> Result<(), String> {
        if !self.default_value.is_finite() {
            return Err(format!("default value {} is not finite", self.default_value));
        }
        for (side, bound) in [("min", self.min), ("max", self.max)] {
            if bound.limit().is_some_and(f64::is_nan) {
                return Err(format!("{side} bound is NaN"));
            }
        }
        if let (Some(min), Some(max)) = (self.min.limit(), self.max.limit())
            && min > max
        {
            return Err(format!("min {min} exceeds max {max}"));
        }
        if self.clamp(self.default_value) != self.default_value {
            return Err(format!(
                "default value {} lies outside the bounds",
                self.default_value
            ));
        }
        if self.categories.is_empty() {
            return Err("definition applies to no category".to_owned());
        }
        Ok(())
    }
}
