//! Market Gateway - resilient access to a rate-limited broker API
//!
//! Every upstream fetch goes through a guarded call: TTL/LRU response cache,
//! token bucket admission control, and exponential backoff retries.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod limiter;
pub mod models;
pub mod retry;
pub mod tasks;

pub use api::AppState;
pub use cache::{generate_key, TtlCache};
pub use config::Config;
pub use error::{ErrorKind, GatewayError, UpstreamError};
pub use gateway::Gateway;
pub use limiter::TokenBucket;
pub use retry::{BackoffRetrier, RetryPolicy};
pub use tasks::spawn_cleanup_task;
