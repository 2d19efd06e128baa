//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::Serialize;

// == Counters ==
/// Running counters owned by a cache store.
#[derive(Debug, Clone, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl Counters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }
}

// == Cache Stats ==
/// Point-in-time snapshot of cache performance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Current number of entries in the cache
    pub size: usize,
    /// Capacity of the cache
    pub max_size: usize,
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted due to LRU policy
    pub evictions: u64,
    /// Number of entries dropped because their TTL elapsed
    pub expirations: u64,
    /// Percentage of lookups served from the cache, rounded to two decimals
    pub hit_rate: f64,
    /// Lifetime of every entry, in seconds
    pub ttl_seconds: u64,
}

impl CacheStats {
    pub(crate) fn snapshot(
        counters: &Counters,
        size: usize,
        max_size: usize,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            size,
            max_size,
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            expirations: counters.expirations,
            hit_rate: hit_rate(counters.hits, counters.misses),
            ttl_seconds,
        }
    }
}

// == Hit Rate ==
/// Calculates hits / (hits + misses) * 100, or 0.0 if no lookups have been made.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        let rate = hits as f64 / total as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }
}
