//! Per-owner attribute state with a memoized final value.
//!
//! Each instance keeps base value, modifiers, cached final value, dirty flag
//! and revision behind a single mutex. Every mutation marks the cache dirty
//! and bumps the revision while holding the lock, and recomputation happens
//! under the same lock, so a read that starts after a write returned always
//! observes that write.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::aggregation::{self, ModifierSums};
use crate::definition::AttributeDefinition;
use crate::error::{ErrorSeverity, StatError, is_storable};
use crate::ident::{Identifier, ModifierId, OwnerId};
use crate::modifier::Modifier;

/// Errors raised by value writes. Nothing is written when one is returned.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("cannot invert {id} to {target}: multiplier 1 + Σmultiplicative is {denominator}")]
    InvalidInverseTarget {
        id: Identifier,
        target: f64,
        denominator: f64,
    },

    #[error("non-finite value {value} rejected for {id}")]
    NonFinite { id: Identifier, value: f64 },
}

impl StatError for ValueError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidInverseTarget { .. } => ErrorSeverity::Recoverable,
            Self::NonFinite { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInverseTarget { .. } => "VALUE_INVALID_INVERSE_TARGET",
            Self::NonFinite { .. } => "VALUE_NON_FINITE",
        }
    }
}

/// Point-in-time copy of an instance, for display and diagnostics.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceSnapshot {
    pub id: Identifier,
    pub owner: OwnerId,
    pub base_value: f64,
    pub final_value: f64,
    pub revision: u64,
    /// Display ordered (priority, then name).
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug)]
struct InstanceState {
    base: f64,
    modifiers: HashMap<ModifierId, Modifier>,
    cached: f64,
    dirty: bool,
    revision: u64,
}

impl InstanceState {
    fn touch(&mut self) {
        self.dirty = true;
        self.revision = self.revision.wrapping_add(1);
    }

    fn sorted_modifiers(&self) -> Vec<Modifier> {
        let mut modifiers: Vec<Modifier> = self.modifiers.values().cloned().collect();
        modifiers.sort_by(Modifier::display_order);
        modifiers
    }
}

/// One attribute of one owner.
#[derive(Debug)]
pub struct AttributeInstance {
    owner: OwnerId,
    definition: Arc<AttributeDefinition>,
    state: Mutex<InstanceState>,
}

impl AttributeInstance {
    pub fn new(owner: OwnerId, definition: Arc<AttributeDefinition>) -> Self {
        let base = definition.clamp(definition.default_value());
        Self {
            owner,
            definition,
            state: Mutex::new(InstanceState {
                base,
                modifiers: HashMap::new(),
                cached: base,
                dirty: true,
                revision: 0,
            }),
        }
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn definition(&self) -> &Arc<AttributeDefinition> {
        &self.definition
    }

    pub fn id(&self) -> &Identifier {
        self.definition.id()
    }

    // ===== values =====

    pub fn base_value(&self) -> f64 {
        self.state.lock().base
    }

    /// Final value, recomputed only when a mutation happened since the last read.
    pub fn get_value(&self) -> f64 {
        let mut state = self.state.lock();
        if state.dirty {
            state.cached = self.compute(&state);
            state.dirty = false;
        }
        state.cached
    }

    /// Sets the base value, clamped to the definition's limited bounds.
    ///
    /// NaN is rejected. An infinity is kept only when that side is unbounded.
    pub fn set_base_value(&self, value: f64) -> Result<(), ValueError> {
        self.ensure_storable(value)?;
        let clamped = self.definition.clamp(value);
        let mut state = self.state.lock();
        state.base = clamped;
        state.touch();
        Ok(())
    }

    /// Sets the base value directly, ignoring existing modifiers.
    ///
    /// The final value is whatever the modifiers make of `value`.
    pub fn force_set_base_value(&self, value: f64) -> Result<(), ValueError> {
        self.set_base_value(value)
    }

    /// Adjusts the base value so the final value becomes `target`.
    ///
    /// Uses the default formula's inverse: `base = target / (1 + Σmul) - Σadd`.
    pub fn set_value(&self, target: f64) -> Result<(), ValueError> {
        if !target.is_finite() {
            return Err(self.non_finite(target));
        }

        let mut state = self.state.lock();
        let base = if state.modifiers.is_empty() {
            target
        } else {
            let sums = ModifierSums::of(state.modifiers.values());
            let base = sums
                .invert(target)
                .ok_or_else(|| ValueError::InvalidInverseTarget {
                    id: self.id().clone(),
                    target,
                    denominator: sums.multiplier(),
                })?;
            if !base.is_finite() {
                return Err(self.non_finite(base));
            }
            base
        };

        state.base = self.definition.clamp(base);
        state.touch();
        Ok(())
    }

    // ===== modifiers =====

    /// Inserts `modifier`, replacing any modifier with the same id.
    ///
    /// Returns the replaced modifier.
    pub fn add_modifier(&self, modifier: Modifier) -> Result<Option<Modifier>, ValueError> {
        if !modifier.amount.is_finite() {
            return Err(self.non_finite(modifier.amount));
        }
        let mut state = self.state.lock();
        let previous = state.modifiers.insert(modifier.id, modifier);
        state.touch();
        Ok(previous)
    }

    pub fn remove_modifier(&self, id: ModifierId) -> Option<Modifier> {
        let mut state = self.state.lock();
        let removed = state.modifiers.remove(&id);
        if removed.is_some() {
            state.touch();
        }
        removed
    }

    /// Removes every modifier tagged with `source`; returns how many were removed.
    pub fn remove_modifiers_by_source(&self, source: &Identifier) -> usize {
        let mut state = self.state.lock();
        let before = state.modifiers.len();
        state.modifiers.retain(|_, modifier| !modifier.is_from(source));
        let removed = before - state.modifiers.len();
        if removed > 0 {
            state.touch();
        }
        removed
    }

    pub fn clear_modifiers(&self) {
        let mut state = self.state.lock();
        state.modifiers.clear();
        state.touch();
    }

    /// Restores the default base value and drops every modifier.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.base = self.definition.clamp(self.definition.default_value());
        state.modifiers.clear();
        state.touch();
    }

    // ===== queries =====

    pub fn modifier(&self, id: ModifierId) -> Option<Modifier> {
        self.state.lock().modifiers.get(&id).cloned()
    }

    /// All modifiers, ordered by priority then name.
    pub fn modifiers(&self) -> Vec<Modifier> {
        self.state.lock().sorted_modifiers()
    }

    pub fn modifiers_by_source(&self, source: &Identifier) -> Vec<Modifier> {
        let mut modifiers: Vec<Modifier> = self
            .state
            .lock()
            .modifiers
            .values()
            .filter(|modifier| modifier.is_from(source))
            .cloned()
            .collect();
        modifiers.sort_by(Modifier::display_order);
        modifiers
    }

    pub fn has_modifier(&self, id: ModifierId) -> bool {
        self.state.lock().modifiers.contains_key(&id)
    }

    pub fn modifier_count(&self) -> usize {
        self.state.lock().modifiers.len()
    }

    /// Monotonic counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.state.lock().revision
    }

    pub fn snapshot(&self) -> InstanceSnapshot {
        let mut state = self.state.lock();
        if state.dirty {
            state.cached = self.compute(&state);
            state.dirty = false;
        }
        InstanceSnapshot {
            id: self.id().clone(),
            owner: self.owner,
            base_value: state.base,
            final_value: state.cached,
            revision: state.revision,
            modifiers: state.sorted_modifiers(),
        }
    }

    // ===== helpers =====

    fn compute(&self, state: &InstanceState) -> f64 {
        let value = if state.modifiers.is_empty() {
            self.definition.clamp(state.base)
        } else if self.definition.aggregation().is_custom() {
            // hooks observe display order
            aggregation::calculate(&self.definition, state.base, &state.sorted_modifiers())
        } else {
            self.definition
                .clamp(ModifierSums::of(state.modifiers.values()).apply(state.base))
        };
        if is_storable(value) {
            value
        } else {
            // A hook (or ∞ × 0) produced NaN; fall back to the clamped base.
            self.definition.clamp(state.base)
        }
    }

    fn ensure_storable(&self, value: f64) -> Result<(), ValueError> {
        if is_storable(value) {
            Ok(())
        } else {
            Err(self.non_finite(value))
        }
    }

    fn non_finite(&self, value: f64) -> ValueError {
        ValueError::NonFinite {
            id: self.id().clone(),
            value,
        }
    }
}
