#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use stat_core::{AttributeManager, AttributeRegistry, OwnerId, OwnerRef};
use stat_runtime::{HostWorld, NativeMirror};

pub const TOLERANCE: f64 = 1e-9;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("stat_runtime=debug")
        .with_test_writer()
        .try_init();
}

pub fn builtin_manager() -> Arc<AttributeManager> {
    Arc::new(AttributeManager::new(Arc::new(
        AttributeRegistry::with_builtins(),
    )))
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "expected {expected}, got {actual}"
    );
}

/// In-memory host entity that clamps current health the way hosts do.
#[derive(Clone, Debug)]
pub struct FakeMirror {
    pub owner: OwnerRef,
    pub max: f64,
    pub current: f64,
    pub armor: Option<f64>,
}

impl FakeMirror {
    pub fn new(owner: OwnerRef, max: f64, current: f64) -> Self {
        Self {
            owner,
            max,
            current,
            armor: None,
        }
    }

    pub fn monster(id: u64, max: f64, current: f64) -> Self {
        Self::new(OwnerRef::monster(id), max, current)
    }

    pub fn player(id: u64, max: f64, current: f64) -> Self {
        Self::new(OwnerRef::player(id), max, current)
    }

    pub fn with_armor(mut self, armor: f64) -> Self {
        self.armor = Some(armor);
        self
    }
}

impl NativeMirror for FakeMirror {
    fn owner(&self) -> OwnerRef {
        self.owner
    }

    fn max_value(&self) -> f64 {
        self.max
    }

    fn set_max_value(&mut self, value: f64) {
        self.max = value;
        self.current = self.current.min(value);
    }

    fn current_value(&self) -> f64 {
        self.current
    }

    fn set_current_value(&mut self, value: f64) {
        self.current = value.clamp(0.0, self.max.max(0.0));
    }

    fn armor_value(&self) -> Option<f64> {
        self.armor
    }
}

/// Shared list of live mirrors; clones see the same entities.
#[derive(Clone, Debug, Default)]
pub struct FakeWorld {
    pub mirrors: Arc<Mutex<Vec<FakeMirror>>>,
}

impl FakeWorld {
    pub fn new(mirrors: Vec<FakeMirror>) -> Self {
        Self {
            mirrors: Arc::new(Mutex::new(mirrors)),
        }
    }

    pub fn mirror(&self, owner: OwnerId) -> Option<FakeMirror> {
        self.mirrors
            .lock()
            .iter()
            .find(|mirror| mirror.owner.id == owner)
            .cloned()
    }

    pub fn update(&self, owner: OwnerId, f: impl FnOnce(&mut FakeMirror)) {
        if let Some(mirror) = self
            .mirrors
            .lock()
            .iter_mut()
            .find(|mirror| mirror.owner.id == owner)
        {
            f(mirror);
        }
    }
}

impl HostWorld for FakeWorld {
    fn visit_all(&mut self, visitor: &mut dyn FnMut(&mut dyn NativeMirror)) {
        for mirror in self.mirrors.lock().iter_mut() {
            visitor(mirror);
        }
    }

    fn visit(&mut self, owner: OwnerId, visitor: &mut dyn FnMut(&mut dyn NativeMirror)) -> bool {
        match self
            .mirrors
            .lock()
            .iter_mut()
            .find(|mirror| mirror.owner.id == owner)
        {
            Some(mirror) => {
                visitor(mirror);
                true
            }
            None => false,
        }
    }
}
