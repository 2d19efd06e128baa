//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::stats::Counters;
use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::error::{GatewayError, Result};

// == Cache Store ==
/// Unsynchronized cache storage with LRU eviction and TTL support.
///
/// [`TtlCache`](crate::cache::TtlCache) wraps this behind a mutex for shared use.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance counters
    counters: Counters,
    /// Maximum number of entries allowed
    max_size: usize,
    /// Lifetime of every entry
    ttl: Duration,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and TTL.
    ///
    /// # Errors
    /// `InvalidArgument` when `max_size` is zero or `ttl` is zero.
    pub fn new(max_size: usize, ttl: Duration) -> Result<Self> {
        if max_size == 0 {
            return Err(GatewayError::InvalidArgument(
                "cache max_size must be positive".to_string(),
            ));
        }
        if ttl.is_zero() {
            return Err(GatewayError::InvalidArgument(
                "cache ttl must be positive".to_string(),
            ));
        }

        Ok(Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            counters: Counters::default(),
            max_size,
            ttl,
        })
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and not expired, marking it most recently used.
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = Instant::now();

        let expired = match self.entries.get(key) {
            None => {
                self.counters.record_miss();
                debug!(key, "cache miss");
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            self.remove_entry(key);
            self.counters.record_miss();
            self.counters.record_expirations(1);
            debug!(key, "cache entry expired");
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.record_access(now);
        self.lru.touch(entry.slot);
        self.counters.record_hit();
        debug!(
            key,
            age_ms = entry.age(now).as_millis() as u64,
            ttl_remaining_ms = entry.ttl_remaining(now).as_millis() as u64,
            "cache hit"
        );
        Some(entry.value.clone())
    }

    // == Set ==
    /// Stores a key-value pair.
    ///
    /// An existing key is replaced as a fresh insertion (new TTL, most recent position).
    /// Least recently used entries are evicted until the new entry fits.
    pub fn set(&mut self, key: String, value: V) {
        self.remove_entry(&key);

        while self.entries.len() >= self.max_size {
            match self.lru.evict_oldest() {
                Some(evicted) => {
                    self.entries.remove(&evicted);
                    self.counters.record_eviction();
                    debug!(key = %evicted, "evicted least recently used entry");
                }
                None => break,
            }
        }

        let slot = self.lru.push_front(&key);
        let entry = CacheEntry::new(key.clone(), value, self.ttl, Instant::now(), slot);
        self.entries.insert(key, entry);
        debug!(size = self.entries.len(), max_size = self.max_size, "cache set");
    }

    // == Invalidate ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let removed = self.remove_entry(key).is_some();
        if removed {
            debug!(key, "cache entry invalidated");
        }
        removed
    }

    // == Clear ==
    /// Removes every entry, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.remove_entry(&key);
        }

        self.counters.record_expirations(count);
        count
    }

    // == Contains Fresh ==
    /// Checks for a live entry without touching recency or counters.
    pub fn contains_fresh(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(Instant::now()))
    }

    /// Access metadata for a key, without counting as a lookup.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats::snapshot(
            &self.counters,
            self.entries.len(),
            self.max_size,
            self.ttl.as_secs(),
        )
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.lru.keys()
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(entry.slot);
        Some(entry)
    }
}
