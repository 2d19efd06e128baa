//! API Handlers
//!
//! HTTP request handlers for the gateway's observability and admin endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::generate_key_from_json;
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::gateway::{Gateway, GatewayStats};
use crate::models::{ClearResponse, HealthResponse, InvalidateRequest, InvalidateResponse};

/// Application state shared across all handlers.
///
/// Holds the gateway whose cache and limiter the endpoints report on.
#[derive(Clone)]
pub struct AppState {
    /// Gateway caching raw JSON broker payloads
    pub gateway: Arc<Gateway<Value>>,
}

impl AppState {
    /// Creates a new AppState around an existing gateway.
    pub fn new(gateway: Gateway<Value>) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(Gateway::from_config(config)?))
    }
}

/// Handler for GET /stats
///
/// Returns cache and limiter statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<GatewayStats> {
    Json(state.gateway.stats())
}

/// Handler for DELETE /cache/:key
///
/// Drops one cached entry by its raw key. Missing keys are not an error.
pub async fn invalidate_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.gateway.invalidate(&key);
    Json(InvalidateResponse::new(key, removed))
}

/// Handler for POST /cache/invalidate
///
/// Drops the entry cached for an operation and its parameters.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(GatewayError::InvalidArgument(error_msg));
    }

    let key = generate_key_from_json(&req.operation, &req.params)?;
    let removed = state.gateway.invalidate(&key);
    Ok(Json(InvalidateResponse::new(key, removed)))
}

/// Handler for POST /cache/clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.gateway.clear();
    info!(removed, "cache cleared via API");
    Json(ClearResponse::new(removed))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::generate_key;
    use serde_json::json;

    fn state() -> AppState {
        AppState::from_config(&Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_stats_handler_empty() {
        let response = stats_handler(State(state())).await;
        assert_eq!(response.cache.hits, 0);
        assert_eq!(response.cache.size, 0);
        assert_eq!(response.limiter.capacity, 10);
    }

    #[tokio::test]
    async fn test_invalidate_handler_matches_generated_key() {
        let state = state();
        let key = generate_key("historical_data", [("symbol_token", "2885")]).unwrap();
        state.gateway.cache().set(key.clone(), json!([[1, 2, 3]]));

        let req: InvalidateRequest = serde_json::from_value(json!({
            "operation": "historical_data",
            "params": {"symbol_token": "2885"}
        }))
        .unwrap();
        let response = invalidate_handler(State(state.clone()), Json(req))
            .await
            .unwrap();

        assert_eq!(response.key, key);
        assert!(response.removed);
        assert!(state.gateway.cache().is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_handler_rejects_empty_operation() {
        let req: InvalidateRequest = serde_json::from_value(json!({"operation": ""})).unwrap();
        let result = invalidate_handler(State(state()), Json(req)).await;
        assert!(matches!(result, Err(GatewayError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_invalidate_key_handler_missing_key() {
        let response = invalidate_key_handler(State(state()), Path("ghost".to_string())).await;
        assert!(!response.removed);
    }

    #[tokio::test]
    async fn test_clear_handler() {
        let state = state();
        state.gateway.cache().set("a", json!(1));
        state.gateway.cache().set("b", json!(2));

        let response = clear_handler(State(state.clone())).await;
        assert_eq!(response.removed, 2);
        assert!(state.gateway.cache().is_empty());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
