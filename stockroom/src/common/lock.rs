use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// A handle to a named read-write lock.
pub struct LockHandle {
    lock: Arc<RwLock<()>>,
}

impl LockHandle {
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }
}

/// Registry of named read-write locks, one per collection.
///
/// Record stores take the write lock of a collection for the whole
/// read-modify-write cycle of a mutation, so two mutations of the same
/// collection in one process never overwrite each other.
///
/// # Examples
///
/// ```
/// use stockroom::common::LockRegistry;
/// let registry = LockRegistry::new();
/// let handle = registry.get_lock("products");
/// {
///     let _guard = handle.write();
/// }
/// assert_eq!(registry.lock_count(), 1);
/// ```
#[derive(Clone)]
pub struct LockRegistry {
    locks: Arc<RwLock<HashMap<String, Arc<RwLock<()>>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        LockRegistry {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Gets the lock for `name`, creating it on first use.
    pub fn get_lock(&self, name: &str) -> LockHandle {
        if let Some(lock) = self.locks.read().get(name) {
            return LockHandle { lock: lock.clone() };
        }

        let lock = {
            let mut locks = self.locks.write();
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(())))
                .clone()
        };
        LockHandle { lock }
    }

    /// Removes a lock, returning whether it existed.
    pub fn remove_lock(&self, name: &str) -> bool {
        self.locks.write().remove(name).is_some()
    }

    pub fn lock_count(&self) -> usize {
        self.locks.read().len()
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
