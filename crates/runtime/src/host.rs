//! Interfaces the host implements so the runtime can reach its entities.
//!
//! The runtime never stores host entities. Reconciliation borrows a
//! [`NativeMirror`] for the duration of one pass; the sync worker reaches
//! mirrors through a [`HostWorld`] visitor.

use stat_core::{OwnerId, OwnerRef};

/// The host's native health pair (and optional armor) for one owner.
///
/// Values are in host units. Implementations may clamp writes the way the
/// host does; the runtime re-reads after writing.
pub trait NativeMirror {
    fn owner(&self) -> OwnerRef;

    fn max_value(&self) -> f64;

    fn set_max_value(&mut self, value: f64);

    fn current_value(&self) -> f64;

    fn set_current_value(&mut self, value: f64);

    /// Native armor, for hosts that expose one.
    fn armor_value(&self) -> Option<f64> {
        None
    }
}

/// Access to every live owner of the host, used by the sync worker.
pub trait HostWorld: Send {
    /// Calls `visitor` once per live owner.
    fn visit_all(&mut self, visitor: &mut dyn FnMut(&mut dyn NativeMirror));

    /// Calls `visitor` for `owner` if it is live; returns whether it was.
    fn visit(&mut self, owner: OwnerId, visitor: &mut dyn FnMut(&mut dyn NativeMirror)) -> bool;
}
