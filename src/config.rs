//! Configuration Module
//!
//! Handles loading gateway and server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::cache::{DEFAULT_MAX_SIZE, DEFAULT_TTL_SECONDS};
use crate::error::ErrorKind;
use crate::gateway::DEFAULT_ADMISSION_TIMEOUT;
use crate::limiter::{DEFAULT_CAPACITY, DEFAULT_RATE};

/// Gateway and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Range checks happen when the components are built.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Limiter refill rate, in requests per second
    pub limiter_rate: f64,
    /// Limiter burst size
    pub limiter_capacity: u32,
    /// How long a cache miss waits for limiter admission, None = forever
    pub admission_timeout: Option<Duration>,
    /// Maximum number of cached responses
    pub cache_max_size: usize,
    /// Lifetime of a cached response in seconds
    pub cache_ttl_seconds: u64,
    /// Retries after the first attempt
    pub retry_max_retries: u32,
    /// First backoff delay
    pub retry_initial_delay: Duration,
    /// Backoff ceiling
    pub retry_max_delay: Duration,
    /// Backoff growth factor
    pub retry_exponential_base: f64,
    /// Upstream error kinds worth retrying
    pub retryable_errors: Vec<ErrorKind>,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LIMITER_RATE` - Requests per second (default: 3.0)
    /// - `LIMITER_CAPACITY` - Burst size (default: 10)
    /// - `ADMISSION_TIMEOUT_SECS` - Admission wait, negative = forever (default: 10.0)
    /// - `CACHE_MAX_SIZE` - Maximum cached responses (default: 1000)
    /// - `CACHE_TTL_SECONDS` - Response lifetime (default: 60)
    /// - `RETRY_MAX_RETRIES` - Retries after the first attempt (default: 3)
    /// - `RETRY_INITIAL_DELAY_SECS` - First backoff delay (default: 1.0)
    /// - `RETRY_MAX_DELAY_SECS` - Backoff ceiling (default: 10.0)
    /// - `RETRY_EXPONENTIAL_BASE` - Backoff factor (default: 2.0)
    /// - `RETRYABLE_ERRORS` - Comma separated kinds (default: "rate_limit,network")
    /// - `SERVER_PORT` - HTTP server port (default: 5000)
    /// - `CLEANUP_INTERVAL` - Expired entry sweep frequency in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let admission_timeout = match env_parse::<f64>("ADMISSION_TIMEOUT_SECS") {
            Some(secs) if secs < 0.0 => None,
            Some(secs) => seconds(secs).or(defaults.admission_timeout),
            None => defaults.admission_timeout,
        };

        Self {
            limiter_rate: env_parse("LIMITER_RATE").unwrap_or(defaults.limiter_rate),
            limiter_capacity: env_parse("LIMITER_CAPACITY").unwrap_or(defaults.limiter_capacity),
            admission_timeout,
            cache_max_size: env_parse("CACHE_MAX_SIZE").unwrap_or(defaults.cache_max_size),
            cache_ttl_seconds: env_parse("CACHE_TTL_SECONDS")
                .unwrap_or(defaults.cache_ttl_seconds),
            retry_max_retries: env_parse("RETRY_MAX_RETRIES")
                .unwrap_or(defaults.retry_max_retries),
            retry_initial_delay: env_parse("RETRY_INITIAL_DELAY_SECS")
                .and_then(seconds)
                .unwrap_or(defaults.retry_initial_delay),
            retry_max_delay: env_parse("RETRY_MAX_DELAY_SECS")
                .and_then(seconds)
                .unwrap_or(defaults.retry_max_delay),
            retry_exponential_base: env_parse("RETRY_EXPONENTIAL_BASE")
                .unwrap_or(defaults.retry_exponential_base),
            retryable_errors: env::var("RETRYABLE_ERRORS")
                .ok()
                .and_then(|v| parse_error_kinds(&v))
                .unwrap_or(defaults.retryable_errors),
            server_port: env_parse("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: env_parse("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limiter_rate: DEFAULT_RATE,
            limiter_capacity: DEFAULT_CAPACITY,
            admission_timeout: Some(DEFAULT_ADMISSION_TIMEOUT),
            cache_max_size: DEFAULT_MAX_SIZE,
            cache_ttl_seconds: DEFAULT_TTL_SECONDS,
            retry_max_retries: 3,
            retry_initial_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(10),
            retry_exponential_base: 2.0,
            retryable_errors: vec![ErrorKind::RateLimit, ErrorKind::Network],
            server_port: 5000,
            cleanup_interval: 30,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring unparseable environment variable");
            None
        }
    }
}

fn seconds(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs).ok()
}

/// Parses a comma separated list of error kinds; None if any item is unknown.
fn parse_error_kinds(raw: &str) -> Option<Vec<ErrorKind>> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.limiter_rate, 3.0);
        assert_eq!(config.limiter_capacity, 10);
        assert_eq!(config.admission_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.cache_max_size, 1000);
        assert_eq!(config.cache_ttl_seconds, 60);
        assert_eq!(config.retry_max_retries, 3);
        assert_eq!(config.retry_max_delay, Duration::from_secs(10));
        assert_eq!(config.server_port, 5000);
        assert_eq!(config.cleanup_interval, 30);
    }

    // Single test touches the environment to avoid races between parallel tests
    #[test]
    fn test_config_from_env() {
        let vars = [
            "LIMITER_RATE",
            "LIMITER_CAPACITY",
            "ADMISSION_TIMEOUT_SECS",
            "CACHE_MAX_SIZE",
            "CACHE_TTL_SECONDS",
            "RETRY_MAX_RETRIES",
            "RETRY_INITIAL_DELAY_SECS",
            "RETRY_MAX_DELAY_SECS",
            "RETRY_EXPONENTIAL_BASE",
            "RETRYABLE_ERRORS",
            "SERVER_PORT",
            "CLEANUP_INTERVAL",
        ];
        for var in vars {
            env::remove_var(var);
        }
        assert_eq!(Config::from_env(), Config::default());

        env::set_var("LIMITER_RATE", "5.5");
        env::set_var("CACHE_MAX_SIZE", "not-a-number");
        env::set_var("ADMISSION_TIMEOUT_SECS", "-1");
        env::set_var("RETRY_INITIAL_DELAY_SECS", "0.25");
        env::set_var("RETRYABLE_ERRORS", "network, other");

        let config = Config::from_env();
        assert_eq!(config.limiter_rate, 5.5);
        assert_eq!(config.cache_max_size, 1000);
        assert_eq!(config.admission_timeout, None);
        assert_eq!(config.retry_initial_delay, Duration::from_millis(250));
        assert_eq!(
            config.retryable_errors,
            vec![ErrorKind::Network, ErrorKind::Other]
        );

        env::set_var("RETRYABLE_ERRORS", "network,bogus");
        assert_eq!(
            Config::from_env().retryable_errors,
            Config::default().retryable_errors
        );

        for var in vars {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_error_kinds() {
        assert_eq!(
            parse_error_kinds("rate_limit"),
            Some(vec![ErrorKind::RateLimit])
        );
        assert_eq!(parse_error_kinds(""), Some(vec![]));
        assert_eq!(parse_error_kinds("nope"), None);
    }
}
