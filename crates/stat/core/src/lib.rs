//! Attribute registry, modifier aggregation and per-owner attribute state.
//!
//! `stat-core` holds the custom attribute model that sits beside a host's
//! native one: definitions live in an [`AttributeRegistry`], every owner gets
//! an [`AttributeMap`] of lazily created [`AttributeInstance`]s, and the
//! [`AttributeManager`] gates reads and writes by the owner's category.
//! Reconciliation against the host lives in `stat-runtime`.
pub mod aggregation;
pub mod builtin;
pub mod category;
pub mod config;
pub mod defense;
pub mod definition;
pub mod effects;
pub mod error;
pub mod ident;
pub mod instance;
pub mod manager;
pub mod map;
pub mod modifier;
pub mod registry;

pub use aggregation::{ModifierSums, calculate};
pub use category::{CategorySet, EntityCategory};
pub use config::StatConfig;
pub use defense::DefenseType;
pub use definition::{Aggregation, AttributeDefinition, Bound, CustomAggregation};
pub use error::{ErrorSeverity, StatError};
pub use ident::{Identifier, IdentifierError, ModifierId, OwnerId, OwnerRef};
pub use instance::{AttributeInstance, InstanceSnapshot, ValueError};
pub use manager::AttributeManager;
pub use map::AttributeMap;
pub use modifier::{Modifier, ModifierOperation};
pub use registry::{AttributeRegistry, RegistryError};
