//! Retry Policy Module
//!
//! Exponential backoff parameters and the set of retryable error kinds.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::{ErrorKind, GatewayError, Result};

// == Retry Policy ==
/// Backoff configuration for one retried call.
///
/// The delay after failed attempt `i` (0-based) is
/// `min(initial_delay * exponential_base^i, max_delay)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`
    pub max_retries: u32,
    /// Delay after the first failed attempt
    pub initial_delay: Duration,
    /// Ceiling for any single delay
    pub max_delay: Duration,
    /// Growth factor between consecutive delays
    pub exponential_base: f64,
    /// Error kinds worth another attempt
    pub retryable: HashSet<ErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            exponential_base: 2.0,
            retryable: [ErrorKind::RateLimit, ErrorKind::Network].into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    /// Builds a validated policy retrying rate-limit and network errors.
    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        exponential_base: f64,
    ) -> Result<Self> {
        let policy = Self {
            max_retries,
            initial_delay,
            max_delay,
            exponential_base,
            ..Self::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Replaces the set of retryable error kinds.
    pub fn with_retryable(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.retryable = kinds.into_iter().collect();
        self
    }

    /// Checks the backoff parameters.
    pub fn validate(&self) -> Result<()> {
        if self.initial_delay.is_zero() {
            return Err(GatewayError::InvalidArgument(
                "initial_delay must be positive".to_string(),
            ));
        }
        if self.max_delay < self.initial_delay {
            return Err(GatewayError::InvalidArgument(format!(
                "max_delay ({:?}) must be at least initial_delay ({:?})",
                self.max_delay, self.initial_delay
            )));
        }
        if !self.exponential_base.is_finite() || self.exponential_base <= 1.0 {
            return Err(GatewayError::InvalidArgument(format!(
                "exponential_base must be greater than 1, got {}",
                self.exponential_base
            )));
        }
        Ok(())
    }

    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        self.retryable.contains(&kind)
    }

    /// Delay to wait after failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.exponential_base.powi(attempt.min(i32::MAX as u32) as i32);
        let secs = self.initial_delay.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Every delay a permanently failing call would incur, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_retries).map(|i| self.delay_for(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn secs(values: &[f64]) -> Vec<Duration> {
        values.iter().map(|s| Duration::from_secs_f64(*s)).collect()
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert!(policy.is_retryable(ErrorKind::RateLimit));
        assert!(policy.is_retryable(ErrorKind::Network));
        assert!(!policy.is_retryable(ErrorKind::Other));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_schedule_two_retries() {
        let policy =
            RetryPolicy::new(2, Duration::from_secs(1), Duration::from_secs(10), 2.0).unwrap();
        assert_eq!(policy.schedule(), secs(&[1.0, 2.0]));
    }

    #[test]
    fn test_schedule_is_capped() {
        let policy =
            RetryPolicy::new(6, Duration::from_secs(1), Duration::from_secs(10), 2.0).unwrap();
        assert_eq!(policy.schedule(), secs(&[1.0, 2.0, 4.0, 8.0, 10.0, 10.0]));
    }

    #[test]
    fn test_huge_attempt_saturates() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(u32::MAX), policy.max_delay);
    }

    #[test]
    fn test_invalid_policies() {
        let one = Duration::from_secs(1);
        assert!(RetryPolicy::new(1, Duration::ZERO, one, 2.0).is_err());
        assert!(RetryPolicy::new(1, Duration::from_secs(2), one, 2.0).is_err());
        assert!(RetryPolicy::new(1, one, one, 1.0).is_err());
        assert!(RetryPolicy::new(1, one, one, f64::NAN).is_err());
        assert!(RetryPolicy::new(0, one, one, 1.5).is_ok());
    }

    #[test]
    fn test_with_retryable() {
        let policy = RetryPolicy::default().with_retryable([ErrorKind::Other]);
        assert!(policy.is_retryable(ErrorKind::Other));
        assert!(!policy.is_retryable(ErrorKind::Network));
    }

    proptest! {
        // Delays never shrink and never exceed the ceiling
        #[test]
        fn prop_schedule_monotonic_and_capped(
            retries in 0u32..20,
            initial_ms in 1u64..5_000,
            extra_ms in 0u64..60_000,
            base in 1.01f64..5.0,
        ) {
            let initial = Duration::from_millis(initial_ms);
            let max = initial + Duration::from_millis(extra_ms);
            let policy = RetryPolicy::new(retries, initial, max, base).unwrap();

            let schedule = policy.schedule();
            prop_assert_eq!(schedule.len(), retries as usize);
            for pair in schedule.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
            for delay in &schedule {
                prop_assert!(*delay <= max);
            }
        }
    }
}
