//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Request body for POST /cache/invalidate
///
/// Identifies a cached response by the operation and parameters it was
/// fetched with, the same way the gateway derives its keys.
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    /// Operation name, e.g. "historical_data"
    pub operation: String,
    /// Parameters of the cached call
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl InvalidateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.operation.trim().is_empty() {
            return Some("Operation cannot be empty".to_string());
        }
        if self.operation.contains(':') {
            return Some("Operation cannot contain ':'".to_string());
        }
        None
    }
}
