//! Modifiers applied on top of an attribute's base value.

use crate::ident::{Identifier, ModifierId};

/// How a modifier's amount participates in aggregation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ModifierOperation {
    /// Added to the base before multiplication.
    Additive,
    /// Summed with the other multiplicative amounts into `1 + Σ`.
    Multiplicative,
}

/// Immutable modifier value object.
///
/// `priority` only affects display ordering; aggregation is order independent.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifier {
    pub id: ModifierId,
    pub name: String,
    pub amount: f64,
    pub operation: ModifierOperation,
    pub priority: i32,
    pub source: Option<Identifier>,
}

impl Modifier {
    pub fn new(name: impl Into<String>, amount: f64, operation: ModifierOperation) -> Self {
        Self {
            id: ModifierId::random(),
            name: name.into(),
            amount,
            operation,
            priority: 0,
            source: None,
        }
    }

    pub fn additive(name: impl Into<String>, amount: f64) -> Self {
        Self::new(name, amount, ModifierOperation::Additive)
    }

    pub fn multiplicative(name: impl Into<String>, amount: f64) -> Self {
        Self::new(name, amount, ModifierOperation::Multiplicative)
    }

    pub fn with_id(mut self, id: ModifierId) -> Self {
        self.id = id;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_source(mut self, source: Identifier) -> Self {
        self.source = Some(source);
        self
    }

    pub fn is_additive(&self) -> bool {
        self.operation == ModifierOperation::Additive
    }

    pub fn is_multiplicative(&self) -> bool {
        self.operation == ModifierOperation::Multiplicative
    }

    /// True when the modifier was tagged with `source`.
    pub fn is_from(&self, source: &Identifier) -> bool {
        self.source.as_ref() == Some(source)
    }

    /// Display ordering: priority first, then name.
    pub(crate) fn display_order(a: &Modifier, b: &Modifier) -> std::cmp::Ordering {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.name.cmp(&b.name))
    }
}
