//! Error types for the gateway
//!
//! Provides unified error handling using thiserror.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

// == Error Kind ==
/// Classification of an upstream failure, used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The broker rejected the call because of its own rate limit
    RateLimit,
    /// Connection, timeout or gateway failure
    Network,
    /// Anything else (bad credentials, malformed response, ...)
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Network => "network",
            ErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

impl FromStr for ErrorKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rate_limit" | "ratelimit" => Ok(ErrorKind::RateLimit),
            "network" => Ok(ErrorKind::Network),
            "other" => Ok(ErrorKind::Other),
            other => Err(GatewayError::InvalidArgument(format!(
                "unknown error kind '{}'",
                other
            ))),
        }
    }
}

// == Upstream Error ==
/// Failure raised by an upstream fetch function.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Upstream rate limit hit
    #[error("upstream rate limit: {0}")]
    RateLimit(String),

    /// Network or transient upstream failure
    #[error("network error: {0}")]
    Network(String),

    /// Any other upstream failure
    #[error("upstream error: {0}")]
    Other(String),
}

impl UpstreamError {
    /// Returns the classification used by the retrier.
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpstreamError::RateLimit(_) => ErrorKind::RateLimit,
            UpstreamError::Network(_) => ErrorKind::Network,
            UpstreamError::Other(_) => ErrorKind::Other,
        }
    }

    /// Classifies a broker response message.
    ///
    /// Brokers report throttling inside an otherwise regular payload, so any
    /// message mentioning "rate", "limit" or "exceeded" is treated as a rate limit.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        if ["rate", "limit", "exceeded"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            UpstreamError::RateLimit(message)
        } else {
            UpstreamError::Other(message)
        }
    }

    /// Classifies a non-success HTTP status returned by the broker.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            429 => UpstreamError::RateLimit(format!("HTTP {}: {}", status, body)),
            408 | 502 | 503 | 504 => UpstreamError::Network(format!("HTTP {}: {}", status, body)),
            _ => UpstreamError::Other(format!("HTTP {}: {}", status, body)),
        }
    }
}

// == Gateway Error ==
/// Unified error type for the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Bad constructor or call parameters
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Limiter admission not granted within the timeout
    #[error("Rate limited: no admission for '{key}' within {waited:?}")]
    RateLimited { key: String, waited: Duration },

    /// Retryable upstream failure that exhausted the retry budget
    #[error("Transient failure after retries: {0}")]
    Transient(UpstreamError),

    /// Non-retryable upstream failure
    #[error("Fatal upstream failure: {0}")]
    Fatal(UpstreamError),
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Fatal(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gateway.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_message_detects_rate_limit() {
        let err = UpstreamError::from_message("Access denied because of exceeding access rate");
        assert_eq!(err.kind(), ErrorKind::RateLimit);

        let err = UpstreamError::from_message("Request LIMIT reached");
        assert_eq!(err.kind(), ErrorKind::RateLimit);
    }

    #[test]
    fn test_from_message_other() {
        let err = UpstreamError::from_message("Invalid token");
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_from_status() {
        assert_eq!(UpstreamError::from_status(429, "").kind(), ErrorKind::RateLimit);
        assert_eq!(UpstreamError::from_status(503, "").kind(), ErrorKind::Network);
        assert_eq!(UpstreamError::from_status(408, "").kind(), ErrorKind::Network);
        assert_eq!(UpstreamError::from_status(401, "nope").kind(), ErrorKind::Other);
    }

    #[test]
    fn test_error_kind_parse() {
        assert_eq!("rate_limit".parse::<ErrorKind>().unwrap(), ErrorKind::RateLimit);
        assert_eq!(" Network ".parse::<ErrorKind>().unwrap(), ErrorKind::Network);
        assert!(matches!(
            "bogus".parse::<ErrorKind>(),
            Err(GatewayError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_status_codes() {
        let resp = GatewayError::RateLimited {
            key: "k".to_string(),
            waited: Duration::from_secs(1),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let resp = GatewayError::Fatal(UpstreamError::Other("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp = GatewayError::InvalidArgument("x".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
