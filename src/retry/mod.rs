//! Retry Module
//!
//! Exponential backoff retries that tell transient failures from fatal ones.

mod policy;
mod retrier;

pub use policy::RetryPolicy;
pub use retrier::BackoffRetrier;
