//! Per-key mutual exclusion.
//!
//! Each key gets its own lock, created on first use and dropped from the table as
//! soon as nobody holds or waits on it. Callers on different keys only share the
//! table lock for the lookup, never while their critical sections run.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
pub struct KeyedLocks<K> {
    table: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Copy,
{
    pub fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// The table entry is released even if `f` panics.
    pub fn with_lock<T>(&self, key: K, f: impl FnOnce() -> T) -> T {
        let lock = self.table().entry(key).or_default().clone();
        let _release = Release {
            locks: self,
            key,
            lock: &lock,
        };

        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of keys currently locked or contended.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self) -> MutexGuard<'_, HashMap<K, Arc<Mutex<()>>>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drops the table entry for `key` once nobody else holds or waits on it.
struct Release<'a, K>
where
    K: Eq + Hash + Copy,
{
    locks: &'a KeyedLocks<K>,
    key: K,
    lock: &'a Arc<Mutex<()>>,
}

impl<K> Drop for Release<'_, K>
where
    K: Eq + Hash + Copy,
{
    fn drop(&mut self) {
        // Clones are only taken under the table lock, so 2 means: the table and us.
        let mut table = self.locks.table();
        if Arc::strong_count(self.lock) == 2 {
            table.remove(&self.key);
        }
    }
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}
