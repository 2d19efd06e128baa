//! Gateway Module
//!
//! The guarded call: cache lookup, limiter admission, retried fetch, cache store.

mod guarded;

pub use guarded::{Gateway, GatewayStats, DEFAULT_ADMISSION_TIMEOUT};
