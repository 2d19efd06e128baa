//! Cache Module
//!
//! Provides in-memory response caching with TTL expiration and LRU eviction.

mod entry;
mod key;
mod lru;
mod stats;
mod store;
mod ttl_cache;


// Re-export public types
pub use entry::CacheEntry;
pub use key::{generate_key, generate_key_from_json, KEY_DIGEST_HEX_LEN};
pub use lru::LruTracker;
pub use stats::{hit_rate, CacheStats};
pub use store::CacheStore;
pub use ttl_cache::TtlCache;

// == Public Constants ==
/// Default maximum number of cached responses
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Default lifetime of a cached response in seconds
pub const DEFAULT_TTL_SECONDS: u64 = 60;
