//! # Keyed Lock Table
//!
//! One async mutex per key, created on first use and removed again when the
//! last holder or waiter lets go. The table therefore only holds entries for
//! keys that are currently being worked on.

use dashmap::DashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-key async mutexes.
pub(crate) struct LockTable<K>
where
    K: Eq + Hash + Clone,
{
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K> LockTable<K>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Waits for exclusive access to `key`.
    pub(crate) async fn lock(&self, key: K) -> KeyGuard<'_, K> {
        let mutex = Arc::clone(self.locks.entry(key.clone()).or_default().value());
        let guard = mutex.lock_owned().await;
        KeyGuard {
            table: self,
            key,
            guard: Some(guard),
        }
    }

    /// Number of keys with a live holder or waiter.
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

impl<K> fmt::Debug for LockTable<K>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockTable")
            .field("keys", &self.locks.len())
            .finish()
    }
}

/// Exclusive access to one key; the entry is pruned on drop when unused.
pub(crate) struct KeyGuard<'a, K>
where
    K: Eq + Hash + Clone,
{
    table: &'a LockTable<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K> Drop for KeyGuard<'_, K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        // Release the mutex first so its Arc no longer counts as a holder.
        self.guard.take();
        // Entry creation and removal both run under the shard lock, so a
        // count of one means nobody else holds or awaits this mutex.
        self.table
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
