//! Guarded Call Module
//!
//! Composes cache, limiter and retrier into the single contract every upstream
//! fetch goes through.
//!
//! ```text
//! LOOKUP ─ hit ──────────────────────────────────────────────▶ RETURN
//!    └ miss ─▶ ADMIT ─ denied ─────────────────────────────────▶ RateLimited
//!                 └ admitted ─▶ EXECUTE (retry loop) ─ ok ─▶ STORE ─▶ RETURN
//!                                                  └ exhausted ─▶ Transient / Fatal
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::{generate_key, CacheStats, TtlCache};
use crate::config::Config;
use crate::error::{GatewayError, Result, UpstreamError};
use crate::limiter::{LimiterStats, TokenBucket};
use crate::retry::{BackoffRetrier, RetryPolicy};

/// Default bound on how long a miss waits for limiter admission.
pub const DEFAULT_ADMISSION_TIMEOUT: Duration = Duration::from_secs(10);

// == Gateway Stats ==
/// Combined observability snapshot of a gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayStats {
    pub cache: CacheStats,
    pub limiter: LimiterStats,
    #[serde(serialize_with = "serialize_timeout")]
    pub admission_timeout: Option<Duration>,
}

fn serialize_timeout<S: Serializer>(
    timeout: &Option<Duration>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match timeout {
        Some(d) => serializer.serialize_some(&d.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}

// == Gateway ==
/// Resilient front for one class of upstream calls.
///
/// Cache and limiter are held by `Arc` and may be shared with other gateways
/// (typically one pair per upstream API). Concurrent misses on the same key are
/// not coalesced: each missing caller performs its own fetch.
#[derive(Debug, Clone)]
pub struct Gateway<V> {
    cache: Arc<TtlCache<V>>,
    limiter: Arc<TokenBucket>,
    retrier: BackoffRetrier,
    admission_timeout: Option<Duration>,
}

impl<V: Clone> Gateway<V> {
    // == Constructor ==
    /// Creates a gateway over existing (possibly shared) components.
    pub fn new(
        cache: Arc<TtlCache<V>>,
        limiter: Arc<TokenBucket>,
        retrier: BackoffRetrier,
        admission_timeout: Option<Duration>,
    ) -> Self {
        Self {
            cache,
            limiter,
            retrier,
            admission_timeout,
        }
    }

    /// Builds all components from configuration.
    ///
    /// # Errors
    /// `InvalidArgument` if any configured parameter is out of range.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = TtlCache::new(
            config.cache_max_size,
            Duration::from_secs(config.cache_ttl_seconds),
        )?;
        let limiter = TokenBucket::new(config.limiter_rate, config.limiter_capacity)?;
        let policy = RetryPolicy::new(
            config.retry_max_retries,
            config.retry_initial_delay,
            config.retry_max_delay,
            config.retry_exponential_base,
        )?
        .with_retryable(config.retryable_errors.iter().copied());

        Ok(Self::new(
            Arc::new(cache),
            Arc::new(limiter),
            BackoffRetrier::new(policy),
            config.admission_timeout,
        ))
    }

    // == Guarded Call ==
    /// Returns the cached value for `key`, or fetches, caches and returns it.
    ///
    /// A hit never touches the limiter or the retrier. A miss waits for one
    /// limiter token (bounded by the admission timeout) and then runs `fetch`
    /// under the retry policy. Failures are never cached.
    ///
    /// # Errors
    /// - `RateLimited` if admission was not granted in time (`fetch` is not called)
    /// - `Transient` if a retryable upstream error outlasted the retry budget
    /// - `Fatal` for any non-retryable upstream error
    pub async fn guarded_call<F, Fut>(&self, key: &str, fetch: F) -> Result<V>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<V, UpstreamError>>,
    {
        if let Some(value) = self.cache.get(key) {
            return Ok(value);
        }

        let started = Instant::now();
        if !self.limiter.acquire(1, self.admission_timeout).await? {
            let waited = started.elapsed();
            warn!(
                key,
                waited_ms = waited.as_millis() as u64,
                rate = self.limiter.rate(),
                capacity = self.limiter.capacity(),
                "limiter admission denied"
            );
            return Err(GatewayError::RateLimited {
                key: key.to_string(),
                waited,
            });
        }

        match self.retrier.run(key, fetch).await {
            Ok(value) => {
                self.cache.set(key, value.clone());
                debug!(key, "fetched and cached");
                Ok(value)
            }
            Err(err) if self.retrier.policy().is_retryable(err.kind()) => {
                Err(GatewayError::Transient(err))
            }
            Err(err) => Err(GatewayError::Fatal(err)),
        }
    }

    // == Guarded Fetch ==
    /// Like [`guarded_call`](Self::guarded_call), deriving the key from the
    /// operation name and its parameters.
    pub async fn guarded_fetch<I, K, P, F, Fut>(&self, operation: &str, params: I, fetch: F) -> Result<V>
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Serialize,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<V, UpstreamError>>,
    {
        let key = generate_key(operation, params)?;
        self.guarded_call(&key, fetch).await
    }

    /// Drops one cached key.
    pub fn invalidate(&self, key: &str) -> bool {
        self.cache.invalidate(key)
    }

    /// Drops every cached entry, returning how many were removed.
    pub fn clear(&self) -> usize {
        self.cache.clear()
    }

    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            cache: self.cache.stats(),
            limiter: self.limiter.stats(),
            admission_timeout: self.admission_timeout,
        }
    }

    pub fn cache(&self) -> &Arc<TtlCache<V>> {
        &self.cache
    }

    pub fn limiter(&self) -> &Arc<TokenBucket> {
        &self.limiter
    }
}
