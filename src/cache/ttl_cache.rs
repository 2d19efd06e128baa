//! Shared TTL Cache
//!
//! Thread-safe handle over a [`CacheStore`], safe to share across tasks via `Arc`.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::info;

use crate::cache::{CacheStats, CacheStore};
use crate::error::Result;

// == TTL Cache ==
/// LRU + TTL cache guarded by a single mutex.
///
/// Every operation, including recency reordering on a hit and the stats
/// snapshot, runs inside the same short critical section. The lock is never
/// held across an `.await`.
#[derive(Debug)]
pub struct TtlCache<V> {
    inner: Mutex<CacheStore<V>>,
}

impl<V: Clone> TtlCache<V> {
    /// Creates a cache holding at most `max_size` entries, each living for `ttl`.
    pub fn new(max_size: usize, ttl: Duration) -> Result<Self> {
        let store = CacheStore::new(max_size, ttl)?;
        info!(
            max_size = store.max_size(),
            ttl_secs = store.ttl().as_secs(),
            "TtlCache initialized"
        );
        Ok(Self {
            inner: Mutex::new(store),
        })
    }

    /// Returns the cached value, or `None` on a miss or expired entry.
    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key)
    }

    /// Inserts or replaces `key`, evicting least recently used entries as needed.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.lock().set(key.into(), value);
    }

    /// Removes `key` if present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().invalidate(key)
    }

    /// Removes every entry, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let count = self.lock().clear();
        info!(count, "cache cleared");
        count
    }

    /// Removes every expired entry, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.lock().purge_expired()
    }

    pub fn contains_fresh(&self, key: &str) -> bool {
        self.lock().contains_fresh(key)
    }

    /// Consistent snapshot of the counters, taken under the cache lock.
    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, CacheStore<V>> {
        // Store mutations never leave the map and recency list out of step
        // mid-operation, so a poisoned guard is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
