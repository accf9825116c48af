use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};
use slotmap::{Key, SlotMap};

/// Lifetime counters for one storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageCounters {
    pub created: usize,
    pub disposed: usize,
    pub live: usize,
}

// Thread-safe container shared between the runtime and script capabilities.
pub struct AssetStorage<H: Key, T> {
    inner: RwLock<SlotMap<H, Arc<T>>>,
    created: AtomicUsize,
    disposed: AtomicUsize,
}

impl<H: Key, T> Default for AssetStorage<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Key, T> AssetStorage<H, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SlotMap::with_key()),
            created: AtomicUsize::new(0),
            disposed: AtomicUsize::new(0),
        }
    }

    /// [Write] Adds a resource and returns a Handle.
    pub fn add(&self, asset: impl Into<T>) -> H {
        let handle = self.inner.write().insert(Arc::new(asset.into()));
        self.created.fetch_add(1, Ordering::Relaxed);
        handle
    }

    /// [Read] Gets a single resource.
    pub fn get(&self, handle: H) -> Option<Arc<T>> {
        self.inner.read().get(handle).cloned()
    }

    #[must_use]
    pub fn contains(&self, handle: H) -> bool {
        self.inner.read().contains_key(handle)
    }

    /// [Write] Releases a resource. Returns `false` if the handle was already
    /// released, so repeated disposal is harmless and counted once.
    pub fn dispose(&self, handle: H) -> bool {
        let removed = self.inner.write().remove(handle).is_some();
        if removed {
            self.disposed.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn counters(&self) -> StorageCounters {
        StorageCounters {
            created: self.created.load(Ordering::Relaxed),
            disposed: self.disposed.load(Ordering::Relaxed),
            live: self.len(),
        }
    }

    /// [Read - Advanced] Acquires a read-lock guard for batch access in the
    /// render loop.
    pub fn read_lock(&self) -> RwLockReadGuard<'_, SlotMap<H, Arc<T>>> {
        self.inner.read()
    }
}
