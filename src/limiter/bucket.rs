//! Token Bucket Module
//!
//! Admission control bounding sustained throughput to `rate` tokens per second
//! while allowing bursts up to `capacity`.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, Result};

/// Longest single sleep inside [`TokenBucket::acquire`], so a waiter re-checks
/// soon after tokens become available.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_millis(100);

// == Bucket State ==
#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
    granted: u64,
    rejected: u64,
    timeouts: u64,
}

// == Limiter Stats ==
/// Snapshot of a limiter's configuration and counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimiterStats {
    /// Tokens added per second
    pub rate: f64,
    /// Burst size
    pub capacity: u32,
    /// Whole tokens available right now
    pub available: u32,
    /// Successful acquisitions
    pub granted: u64,
    /// Non-blocking acquisitions refused
    pub rejected: u64,
    /// Blocking acquisitions that gave up at their timeout
    pub timeouts: u64,
}

// == Token Bucket ==
/// Thread-safe token bucket rate limiter.
///
/// One instance is typically shared (via `Arc`) by every caller of an upstream
/// endpoint. Blocked callers in [`acquire`](Self::acquire) are not queued: whoever
/// observes enough tokens first after waking wins, so fairness is best-effort.
#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    capacity: u32,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    // == Constructor ==
    /// Creates a full bucket.
    ///
    /// # Arguments
    /// * `rate` - Tokens added per second (requests per second)
    /// * `capacity` - Maximum tokens in the bucket (burst size)
    ///
    /// # Errors
    /// `InvalidArgument` if `rate` is not a positive finite number or `capacity` is zero.
    pub fn new(rate: f64, capacity: u32) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(GatewayError::InvalidArgument(format!(
                "rate must be positive, got {}",
                rate
            )));
        }
        if capacity == 0 {
            return Err(GatewayError::InvalidArgument(
                "capacity must be positive".to_string(),
            ));
        }

        info!(rate, capacity, "TokenBucket initialized");
        Ok(Self {
            rate,
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity as f64,
                last_refill: Instant::now(),
                granted: 0,
                rejected: 0,
                timeouts: 0,
            }),
        })
    }

    // == Try Acquire ==
    /// Takes `n` tokens if available right now, without waiting.
    ///
    /// Returns `Ok(false)` and leaves the bucket untouched when there are not enough tokens.
    pub fn try_acquire(&self, n: u32) -> Result<bool> {
        self.validate(n)?;

        let mut state = self.lock();
        if self.take(&mut state, n) {
            debug!(n, remaining = state.tokens, "acquired tokens (non-blocking)");
            Ok(true)
        } else {
            state.rejected += 1;
            debug!(n, available = state.tokens, "not enough tokens");
            Ok(false)
        }
    }

    // == Acquire ==
    /// Takes `n` tokens, suspending the calling task until they are available.
    ///
    /// Sleeps in slices of at most [`MAX_POLL_INTERVAL`]. Returns `Ok(false)` if
    /// `timeout` elapses first; `None` waits indefinitely.
    pub async fn acquire(&self, n: u32, timeout: Option<Duration>) -> Result<bool> {
        self.validate(n)?;
        let started = Instant::now();

        loop {
            let wait = {
                let mut state = self.lock();
                if self.take(&mut state, n) {
                    debug!(n, remaining = state.tokens, "acquired tokens");
                    return Ok(true);
                }
                let deficit = n as f64 - state.tokens;
                // A tiny rate can push the refill time past what Duration holds
                Duration::try_from_secs_f64(deficit / self.rate)
                    .unwrap_or(MAX_POLL_INTERVAL)
                    .min(MAX_POLL_INTERVAL)
            };

            let wait = match timeout {
                Some(limit) => {
                    let elapsed = started.elapsed();
                    if elapsed >= limit {
                        self.lock().timeouts += 1;
                        warn!(n, waited_ms = elapsed.as_millis() as u64, "token acquisition timed out");
                        return Ok(false);
                    }
                    wait.min(limit - elapsed)
                }
                None => wait,
            };

            // Never spin on a zero-length sleep
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

    // == Available ==
    /// Refills and returns the number of whole tokens currently available.
    pub fn available(&self) -> u32 {
        let mut state = self.lock();
        self.refill(&mut state);
        state.tokens.floor() as u32
    }

    /// Snapshot of configuration and counters, taken under the bucket lock.
    pub fn stats(&self) -> LimiterStats {
        let mut state = self.lock();
        self.refill(&mut state);
        LimiterStats {
            rate: self.rate,
            capacity: self.capacity,
            available: state.tokens.floor() as u32,
            granted: state.granted,
            rejected: state.rejected,
            timeouts: state.timeouts,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    fn validate(&self, n: u32) -> Result<()> {
        if n == 0 {
            return Err(GatewayError::InvalidArgument(
                "token count must be positive".to_string(),
            ));
        }
        if n > self.capacity {
            return Err(GatewayError::InvalidArgument(format!(
                "requested tokens ({}) exceed capacity ({})",
                n, self.capacity
            )));
        }
        Ok(())
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity as f64);
        state.last_refill = now;
    }

    fn take(&self, state: &mut BucketState, n: u32) -> bool {
        self.refill(state);
        if state.tokens >= n as f64 {
            state.tokens -= n as f64;
            state.granted += 1;
            true
        } else {
            false
        }
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        // Bucket state is plain numbers updated in place; a poisoned guard is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use tokio::time::advance;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_new_rejects_bad_arguments() {
        assert_err!(TokenBucket::new(0.0, 10));
        assert_err!(TokenBucket::new(-1.0, 10));
        assert_err!(TokenBucket::new(f64::NAN, 10));
        assert_err!(TokenBucket::new(f64::INFINITY, 10));
        assert_err!(TokenBucket::new(1.0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_reject() {
        let bucket = TokenBucket::new(3.0, 10).unwrap();

        for _ in 0..10 {
            assert!(assert_ok!(bucket.try_acquire(1)));
        }
        assert!(!assert_ok!(bucket.try_acquire(1)));
        assert_eq!(bucket.available(), 0);
    }

    #[test]
    fn test_try_acquire_rejects_invalid_counts() {
        let bucket = TokenBucket::new(3.0, 10).unwrap();

        assert!(matches!(bucket.try_acquire(0), Err(GatewayError::InvalidArgument(_))));
        assert!(matches!(bucket.try_acquire(11), Err(GatewayError::InvalidArgument(_))));
        assert_eq!(bucket.available(), 10, "rejected calls must not consume tokens");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_try_acquire_has_no_side_effects() {
        let bucket = TokenBucket::new(1.0, 5).unwrap();
        assert!(bucket.try_acquire(4).unwrap());

        assert!(!bucket.try_acquire(2).unwrap());
        assert!(bucket.try_acquire(1).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_proportional_to_elapsed_time() {
        let bucket = TokenBucket::new(4.0, 10).unwrap();
        assert!(bucket.try_acquire(10).unwrap());
        assert_eq!(bucket.available(), 0);

        advance(Duration::from_millis(500)).await;
        assert_eq!(bucket.available(), 2);

        advance(Duration::from_secs(1)).await;
        assert_eq!(bucket.available(), 6);

        advance(Duration::from_secs(60)).await;
        assert_eq!(bucket.available(), 10, "refill is capped at capacity");
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_for_refill() {
        let bucket = TokenBucket::new(2.0, 2).unwrap();
        assert!(bucket.try_acquire(2).unwrap());

        let started = Instant::now();
        assert!(bucket.acquire(1, None).await.unwrap());
        let waited = started.elapsed();

        assert!(waited >= Duration::from_millis(500), "waited {:?}", waited);
        assert!(waited < Duration::from_millis(700), "waited {:?}", waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_times_out() {
        let bucket = TokenBucket::new(0.1, 1).unwrap();
        assert!(bucket.try_acquire(1).unwrap());

        let started = Instant::now();
        let acquired = bucket.acquire(1, Some(Duration::from_millis(250))).await.unwrap();

        assert!(!acquired);
        assert!(started.elapsed() >= Duration::from_millis(250));
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(bucket.stats().timeouts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_times_out_with_tiny_rate() {
        let bucket = TokenBucket::new(1e-20, 1).unwrap();
        assert!(bucket.try_acquire(1).unwrap());

        let acquired = bucket.acquire(1, Some(Duration::from_millis(10))).await.unwrap();

        assert!(!acquired);
        assert_eq!(bucket.stats().timeouts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_zero_timeout_still_tries_once() {
        let bucket = TokenBucket::new(1.0, 1).unwrap();
        assert!(bucket.acquire(1, Some(Duration::ZERO)).await.unwrap());
        assert!(!bucket.acquire(1, Some(Duration::ZERO)).await.unwrap());
    }

    #[tokio::test]
    async fn test_acquire_rejects_unsatisfiable_request() {
        let bucket = TokenBucket::new(1.0, 3).unwrap();
        let result = bucket.acquire(4, None).await;
        assert!(matches!(result, Err(GatewayError::InvalidArgument(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_all_admitted() {
        let bucket = Arc::new(TokenBucket::new(10.0, 5).unwrap());

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let bucket = Arc::clone(&bucket);
                tokio::spawn(async move { bucket.acquire(1, Some(Duration::from_secs(5))).await })
            })
            .collect();

        let started = Instant::now();
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        // 5 burst tokens, the remaining 15 arrive at 10/s
        assert!(started.elapsed() >= Duration::from_millis(1_400));
        let stats = bucket.stats();
        assert_eq!(stats.granted, 20);
        assert_eq!(stats.timeouts, 0);
    }

    #[test]
    fn test_stats_counters() {
        let bucket = TokenBucket::new(0.5, 2).unwrap();
        bucket.try_acquire(2).unwrap();
        bucket.try_acquire(1).unwrap();

        let stats = bucket.stats();
        assert_eq!(stats.capacity, 2);
        assert_eq!(stats.granted, 1);
        assert_eq!(stats.rejected, 1);
    }

    proptest! {
        // Whatever the request sequence, the bucket stays within [0, capacity]
        #[test]
        fn prop_tokens_stay_in_bounds(
            capacity in 1u32..50,
            rate in 0.1f64..100.0,
            requests in prop::collection::vec(1u32..50, 1..100),
        ) {
            let bucket = TokenBucket::new(rate, capacity).unwrap();
            for n in requests {
                let _ = bucket.try_acquire(n);
                let available = bucket.available();
                prop_assert!(available <= capacity);
            }
            let state = bucket.lock();
            prop_assert!(state.tokens >= 0.0 && state.tokens <= capacity as f64);
        }
    }
}
