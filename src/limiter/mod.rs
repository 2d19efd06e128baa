//! Limiter Module
//!
//! Token bucket admission control for calls to a rate-limited upstream.

mod bucket;

pub use bucket::{LimiterStats, TokenBucket, MAX_POLL_INTERVAL};

// == Public Constants ==
/// Default sustained rate, in requests per second
pub const DEFAULT_RATE: f64 = 3.0;

/// Default burst size
pub const DEFAULT_CAPACITY: u32 = 10;
