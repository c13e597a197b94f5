//! Per-owner reconciliation state.

use serde::{Deserialize, Serialize};

/// Instance revisions and host values observed at the end of the last pass.
///
/// When nothing moved since then a pass can return early without computing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub max_revision: u64,
    pub current_revision: u64,
    pub host_max: f64,
    pub host_current: f64,
}

impl Fingerprint {
    /// Exact comparison; any host write, however small, invalidates the fingerprint.
    pub fn matches(&self, other: &Fingerprint) -> bool {
        self.max_revision == other.max_revision
            && self.current_revision == other.current_revision
            && self.host_max.to_bits() == other.host_max.to_bits()
            && self.host_current.to_bits() == other.host_current.to_bits()
    }
}

/// Where an owner stands in the reconciliation protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum OwnerSyncState {
    /// Never migrated, or forgotten.
    #[default]
    Uninitialized,
    /// Migrated under scale epoch `epoch`; later passes reconcile incrementally.
    Reconciled { epoch: u32, fingerprint: Fingerprint },
}

impl OwnerSyncState {
    /// True when the owner was migrated under `epoch`.
    pub fn is_current(&self, epoch: u32) -> bool {
        matches!(self, Self::Reconciled { epoch: recorded, .. } if *recorded == epoch)
    }

    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        match self {
            Self::Uninitialized => None,
            Self::Reconciled { fingerprint, .. } => Some(fingerprint),
        }
    }

    pub fn epoch(&self) -> Option<u32> {
        match self {
            Self::Uninitialized => None,
            Self::Reconciled { epoch, .. } => Some(*epoch),
        }
    }
}
