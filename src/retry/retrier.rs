//! Backoff Retrier Module
//!
//! Re-executes a failing async operation with exponentially growing delays.

use std::future::Future;

use tracing::{error, info, warn};

use crate::error::UpstreamError;
use crate::retry::RetryPolicy;

// == Backoff Retrier ==
/// Strategy object applying a [`RetryPolicy`] to any operation.
///
/// Retryable failures are retried up to `max_retries` times; any other failure
/// is returned on first occurrence without consuming budget.
#[derive(Debug, Clone, Default)]
pub struct BackoffRetrier {
    policy: RetryPolicy,
}

impl BackoffRetrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `op` until it succeeds, fails fatally, or exhausts the retry budget.
    ///
    /// Only the attempting task sleeps between attempts. The returned error is
    /// always the one from the last attempt made.
    ///
    /// # Arguments
    /// * `label` - Name of the operation, used in log lines
    /// * `op` - Produces a fresh attempt each time it is called
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let total = self.policy.max_retries.saturating_add(1);
        let mut attempt: u32 = 0;

        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(op = label, attempt = attempt + 1, total, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if !self.policy.is_retryable(err.kind()) => {
                    error!(op = label, attempt = attempt + 1, error = %err, "non-retryable failure");
                    return Err(err);
                }
                Err(err) if attempt >= self.policy.max_retries => {
                    error!(op = label, attempts = total, error = %err, "failed after all retries");
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        op = label,
                        attempt = attempt + 1,
                        total,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
