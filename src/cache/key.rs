//! Cache Key Module
//!
//! Deterministic, parameter-order independent cache keys.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{GatewayError, Result};

/// Number of hex digits of the SHA-256 digest kept in a key (64 bits).
pub const KEY_DIGEST_HEX_LEN: usize = 16;

// == Generate Key ==
/// Builds a cache key from an operation name and its parameters.
///
/// Parameters are sorted by name before hashing, so the same logical call
/// always maps to the same key regardless of argument order. The result has
/// the form `"{operation}:{digest}"`.
///
/// # Errors
/// `InvalidArgument` if a parameter value cannot be represented as JSON.
///
/// # Example
/// ```
/// use market_gateway::cache::generate_key;
///
/// let a = generate_key("candles", [("symbol", "RELIANCE"), ("interval", "ONE_DAY")]).unwrap();
/// let b = generate_key("candles", [("interval", "ONE_DAY"), ("symbol", "RELIANCE")]).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn generate_key<I, K, P>(operation: &str, params: I) -> Result<String>
where
    I: IntoIterator<Item = (K, P)>,
    K: Into<String>,
    P: Serialize,
{
    let mut canonical = BTreeMap::new();
    for (name, value) in params {
        let name = name.into();
        let value = serde_json::to_value(value).map_err(|e| {
            GatewayError::InvalidArgument(format!("parameter '{}' is not serializable: {}", name, e))
        })?;
        canonical.insert(name, value);
    }

    key_from_canonical(operation, &canonical)
}

/// Key for parameters already held as a JSON object (e.g. from a request body).
pub fn generate_key_from_json(
    operation: &str,
    params: &serde_json::Map<String, Value>,
) -> Result<String> {
    let canonical: BTreeMap<&String, &Value> = params.iter().collect();
    key_from_canonical(operation, &canonical)
}

fn key_from_canonical<T: Serialize>(operation: &str, canonical: &T) -> Result<String> {
    // Map keys are sorted and serde_json output is deterministic for them
    let encoded = serde_json::to_vec(canonical).map_err(|e| {
        GatewayError::InvalidArgument(format!("cannot encode parameters of '{}': {}", operation, e))
    })?;
    let digest = Sha256::digest(&encoded);
    let hex = hex::encode(digest);
    Ok(format!("{}:{}", operation, &hex[..KEY_DIGEST_HEX_LEN]))
}
