//! All attribute instances of one owner, created lazily.

use std::sync::Arc;

use dashmap::DashMap;

use crate::definition::AttributeDefinition;
use crate::ident::{Identifier, ModifierId, OwnerId};
use crate::instance::{AttributeInstance, ValueError};
use crate::modifier::Modifier;

#[derive(Debug)]
pub struct AttributeMap {
    owner: OwnerId,
    instances: DashMap<Identifier, Arc<AttributeInstance>>,
}

impl AttributeMap {
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            instances: DashMap::new(),
        }
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Returns the instance for `definition`, creating it on first use.
    ///
    /// Concurrent callers for the same definition receive the same instance.
    pub fn get_or_create(&self, definition: &Arc<AttributeDefinition>) -> Arc<AttributeInstance> {
        self.instances
            .entry(definition.id().clone())
            .or_insert_with(|| {
                Arc::new(AttributeInstance::new(self.owner, Arc::clone(definition)))
            })
            .value()
            .clone()
    }

    pub fn get(&self, id: &Identifier) -> Option<Arc<AttributeInstance>> {
        self.instances.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.instances.contains_key(id)
    }

    pub fn remove(&self, id: &Identifier) -> Option<Arc<AttributeInstance>> {
        self.instances.remove(id).map(|(_, instance)| instance)
    }

    pub fn clear(&self) {
        self.instances.clear();
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn ids(&self) -> Vec<Identifier> {
        let mut ids: Vec<Identifier> = self
            .instances
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Instances ordered by attribute id.
    pub fn instances(&self) -> Vec<Arc<AttributeInstance>> {
        let mut instances: Vec<Arc<AttributeInstance>> = self
            .instances
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        instances.sort_by(|a, b| a.id().cmp(b.id()));
        instances
    }

    // ===== value access =====

    /// Final value, or the definition default when no instance exists yet.
    pub fn value(&self, definition: &AttributeDefinition) -> f64 {
        self.get(definition.id())
            .map_or_else(|| definition.default_value(), |instance| instance.get_value())
    }

    pub fn base_value(&self, definition: &AttributeDefinition) -> f64 {
        self.get(definition.id())
            .map_or_else(|| definition.default_value(), |instance| instance.base_value())
    }

    pub fn set_base_value(
        &self,
        definition: &Arc<AttributeDefinition>,
        value: f64,
    ) -> Result<(), ValueError> {
        self.get_or_create(definition).set_base_value(value)
    }

    pub fn add_modifier(
        &self,
        definition: &Arc<AttributeDefinition>,
        modifier: Modifier,
    ) -> Result<Option<Modifier>, ValueError> {
        self.get_or_create(definition).add_modifier(modifier)
    }

    pub fn remove_modifier(&self, id: &Identifier, modifier: ModifierId) -> Option<Modifier> {
        self.get(id)?.remove_modifier(modifier)
    }

    /// Removes every modifier tagged with `source` from every instance.
    pub fn remove_modifiers_by_source(&self, source: &Identifier) -> usize {
        // Collect first so no shard lock is held while instances lock.
        self.instances()
            .iter()
            .map(|instance| instance.remove_modifiers_by_source(source))
            .sum()
    }

    pub fn reset_all(&self) {
        for instance in self.instances() {
            instance.reset();
        }
    }
}
