//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and access metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The key this entry is stored under
    pub key: String,
    /// The stored value
    pub value: V,
    /// Insertion time; the TTL is measured from here and never extended by reads
    pub inserted_at: Instant,
    /// Time-to-live of this entry
    pub ttl: Duration,
    /// Number of cache hits served by this entry
    pub access_count: u64,
    /// Time of the most recent hit (or the insertion)
    pub last_accessed: Instant,
    /// Slot of this key in the recency list
    pub(crate) slot: usize,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry inserted at `now`.
    pub(crate) fn new(key: String, value: V, ttl: Duration, now: Instant, slot: usize) -> Self {
        Self {
            key,
            value,
            inserted_at: now,
            ttl,
            access_count: 0,
            last_accessed: now,
            slot,
        }
    }

    // == Age ==
    /// Time elapsed since insertion.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry whose age equals its TTL is already expired.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.age(now) >= self.ttl
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.ttl.saturating_sub(self.age(now))
    }

    // == Record Access ==
    /// Updates access metadata on a cache hit.
    pub(crate) fn record_access(&mut self, now: Instant) {
        self.access_count += 1;
        self.last_accessed = now;
    }
}
