//! Public runtime API surface.
//!
//! This module gathers the types exposed to hosts of the runtime crate so
//! other layers can stay focused on reconciliation and workers.

pub mod errors;
pub mod handle;

pub use errors::{Result, RuntimeError};
pub use handle::StatRuntimeHandle;
