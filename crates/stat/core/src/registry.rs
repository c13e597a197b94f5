//! Process-wide table of attribute definitions.
//!
//! The registry is an explicitly constructed service. Hosts build one at
//! startup (usually via [`AttributeRegistry::with_builtins`]) and share it
//! behind an `Arc`.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::builtin;
use crate::category::{CategorySet, EntityCategory};
use crate::definition::AttributeDefinition;
use crate::error::{ErrorSeverity, StatError};
use crate::ident::Identifier;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("attribute {id} is already registered")]
    AlreadyRegistered { id: Identifier },

    #[error("attribute {id} is invalid: {reason}")]
    InvalidDefinition { id: Identifier, reason: String },
}

impl StatError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyRegistered { .. } => "REGISTRY_ALREADY_REGISTERED",
            Self::InvalidDefinition { .. } => "REGISTRY_INVALID_DEFINITION",
        }
    }
}

#[derive(Debug, Default)]
pub struct AttributeRegistry {
    definitions: DashMap<Identifier, Arc<AttributeDefinition>>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the `statcore` builtin catalog.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        builtin::register_all(&registry);
        registry
    }

    /// Registers `definition`. Fails without side effects if the id is taken.
    pub fn register(
        &self,
        definition: AttributeDefinition,
    ) -> Result<Arc<AttributeDefinition>, RegistryError> {
        definition
            .check()
            .map_err(|reason| RegistryError::InvalidDefinition {
                id: definition.id().clone(),
                reason,
            })?;

        match self.definitions.entry(definition.id().clone()) {
            Entry::Occupied(entry) => Err(RegistryError::AlreadyRegistered {
                id: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                let definition = Arc::new(definition);
                entry.insert(Arc::clone(&definition));
                Ok(definition)
            }
        }
    }

    pub fn get(&self, id: &Identifier) -> Option<Arc<AttributeDefinition>> {
        self.definitions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<Identifier> {
        let mut ids: Vec<Identifier> = self
            .definitions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Every definition, sorted by id.
    pub fn definitions(&self) -> Vec<Arc<AttributeDefinition>> {
        self.filtered(|_| true)
    }

    pub fn applicable_to(&self, category: EntityCategory) -> Vec<Arc<AttributeDefinition>> {
        self.filtered(|definition| definition.is_applicable_to(category))
    }

    pub fn player_definitions(&self) -> Vec<Arc<AttributeDefinition>> {
        self.applicable_to(EntityCategory::Player)
    }

    /// Definitions applicable to at least one non-player category.
    pub fn entity_definitions(&self) -> Vec<Arc<AttributeDefinition>> {
        self.filtered(|definition| definition.categories().intersects(CategorySet::NON_PLAYER))
    }

    pub fn unregister(&self, id: &Identifier) -> bool {
        self.definitions.remove(id).is_some()
    }

    pub fn clear(&self) {
        self.definitions.clear();
    }

    fn filtered(
        &self,
        predicate: impl Fn(&AttributeDefinition) -> bool,
    ) -> Vec<Arc<AttributeDefinition>> {
        let mut definitions: Vec<Arc<AttributeDefinition>> = self
            .definitions
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        definitions.sort_by(|a, b| a.id().cmp(b.id()));
        definitions
    }
}
