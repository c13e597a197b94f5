//! Owner directory with applicability-gated value access.
//!
//! Every read and write takes an [`OwnerRef`] and first checks whether the
//! definition applies to the owner's category. Reads of a non-applicable
//! attribute return the definition default; writes are no-ops reported as
//! `false`.
//!
//! Maps are never evicted implicitly: hosts must call
//! [`AttributeManager::remove_owner`] when an owner goes away.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::category::EntityCategory;
use crate::definition::AttributeDefinition;
use crate::ident::{Identifier, ModifierId, OwnerId, OwnerRef};
use crate::instance::ValueError;
use crate::map::AttributeMap;
use crate::modifier::Modifier;
use crate::registry::AttributeRegistry;

#[derive(Debug)]
pub struct AttributeManager {
    registry: Arc<AttributeRegistry>,
    maps: DashMap<OwnerId, Arc<AttributeMap>>,
}

impl AttributeManager {
    pub fn new(registry: Arc<AttributeRegistry>) -> Self {
        Self {
            registry,
            maps: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<AttributeRegistry> {
        &self.registry
    }

    /// Looks up a registered definition.
    pub fn definition(&self, id: &Identifier) -> Option<Arc<AttributeDefinition>> {
        self.registry.get(id)
    }

    // ===== directory =====

    /// Returns the owner's map, creating an empty one on first use.
    pub fn map(&self, owner: OwnerId) -> Arc<AttributeMap> {
        self.maps
            .entry(owner)
            .or_insert_with(|| {
                trace!(target: "stat_core::manager", owner = %owner, "attribute map created");
                Arc::new(AttributeMap::new(owner))
            })
            .value()
            .clone()
    }

    pub fn existing_map(&self, owner: OwnerId) -> Option<Arc<AttributeMap>> {
        self.maps.get(&owner).map(|entry| Arc::clone(entry.value()))
    }

    pub fn has_map(&self, owner: OwnerId) -> bool {
        self.maps.contains_key(&owner)
    }

    /// Creates instances for every definition applicable to the owner.
    pub fn initialize_owner(&self, owner: OwnerRef) -> Arc<AttributeMap> {
        let map = self.map(owner.id);
        for definition in self.registry.applicable_to(owner.category) {
            map.get_or_create(&definition);
        }
        trace!(
            target: "stat_core::manager",
            owner = %owner.id,
            category = %owner.category,
            attributes = map.len(),
            "owner initialized"
        );
        map
    }

    pub fn remove_owner(&self, owner: OwnerId) -> bool {
        let removed = self.maps.remove(&owner).is_some();
        if removed {
            trace!(target: "stat_core::manager", owner = %owner, "attribute map removed");
        }
        removed
    }

    pub fn clear_all(&self) {
        self.maps.clear();
    }

    pub fn managed_owner_count(&self) -> usize {
        self.maps.len()
    }

    pub fn managed_owner_ids(&self) -> Vec<OwnerId> {
        let mut ids: Vec<OwnerId> = self.maps.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }

    pub fn applicable_definitions(&self, category: EntityCategory) -> Vec<Arc<AttributeDefinition>> {
        self.registry.applicable_to(category)
    }

    pub fn has_attribute(&self, owner: OwnerRef, definition: &AttributeDefinition) -> bool {
        definition.is_applicable_to(owner.category)
            && self
                .existing_map(owner.id)
                .is_some_and(|map| map.contains(definition.id()))
    }

    // ===== gated reads =====

    // Reads never create a map; an owner without one reads defaults.

    pub fn value(&self, owner: OwnerRef, definition: &AttributeDefinition) -> f64 {
        match self.existing_map(owner.id) {
            Some(map) if definition.is_applicable_to(owner.category) => map.value(definition),
            _ => definition.default_value(),
        }
    }

    pub fn base_value(&self, owner: OwnerRef, definition: &AttributeDefinition) -> f64 {
        match self.existing_map(owner.id) {
            Some(map) if definition.is_applicable_to(owner.category) => {
                map.base_value(definition)
            }
            _ => definition.default_value(),
        }
    }

    // ===== gated writes =====

    pub fn set_base_value(
        &self,
        owner: OwnerRef,
        definition: &Arc<AttributeDefinition>,
        value: f64,
    ) -> Result<bool, ValueError> {
        if !definition.is_applicable_to(owner.category) {
            return Ok(false);
        }
        self.map(owner.id).set_base_value(definition, value)?;
        Ok(true)
    }

    /// Inverse write: adjusts the base so the final value becomes `target`.
    pub fn set_value(
        &self,
        owner: OwnerRef,
        definition: &Arc<AttributeDefinition>,
        target: f64,
    ) -> Result<bool, ValueError> {
        if !definition.is_applicable_to(owner.category) {
            return Ok(false);
        }
        self.map(owner.id).get_or_create(definition).set_value(target)?;
        Ok(true)
    }

    pub fn force_set_base_value(
        &self,
        owner: OwnerRef,
        definition: &Arc<AttributeDefinition>,
        value: f64,
    ) -> Result<bool, ValueError> {
        if !definition.is_applicable_to(owner.category) {
            return Ok(false);
        }
        self.map(owner.id)
            .get_or_create(definition)
            .force_set_base_value(value)?;
        Ok(true)
    }

    pub fn add_modifier(
        &self,
        owner: OwnerRef,
        definition: &Arc<AttributeDefinition>,
        modifier: Modifier,
    ) -> Result<bool, ValueError> {
        if !definition.is_applicable_to(owner.category) {
            return Ok(false);
        }
        self.map(owner.id).add_modifier(definition, modifier)?;
        Ok(true)
    }

    pub fn remove_modifier(
        &self,
        owner: OwnerRef,
        definition: &AttributeDefinition,
        modifier: ModifierId,
    ) -> bool {
        if !definition.is_applicable_to(owner.category) {
            return false;
        }
        self.existing_map(owner.id)
            .and_then(|map| map.remove_modifier(definition.id(), modifier))
            .is_some()
    }

    /// Removes every modifier tagged with `source` across the owner's attributes.
    pub fn remove_modifiers_by_source(&self, owner: OwnerId, source: &Identifier) -> usize {
        self.existing_map(owner)
            .map_or(0, |map| map.remove_modifiers_by_source(source))
    }

    pub fn clear_modifiers(&self, owner: OwnerRef, definition: &AttributeDefinition) -> bool {
        if !definition.is_applicable_to(owner.category) {
            return false;
        }
        match self
            .existing_map(owner.id)
            .and_then(|map| map.get(definition.id()))
        {
            Some(instance) => {
                instance.clear_modifiers();
                true
            }
            None => false,
        }
    }

    /// Resets every instance of the owner to its default state.
    pub fn reset_owner(&self, owner: OwnerId) -> bool {
        match self.existing_map(owner) {
            Some(map) => {
                map.reset_all();
                true
            }
            None => false,
        }
    }
}
