//! API Routes
//!
//! Configures the Axum router with all gateway admin endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, health_handler, invalidate_handler, invalidate_key_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /stats` - Cache and limiter statistics
/// - `DELETE /cache/:key` - Invalidate one cached key
/// - `POST /cache/invalidate` - Invalidate by operation and parameters
/// - `POST /cache/clear` - Drop every cached entry
///
/// # Middleware
/// - CORS: Allows any origin, the dashboard frontend is served separately
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/cache/invalidate", post(invalidate_handler))
        .route("/cache/clear", post(clear_handler))
        .route("/cache/:key", delete(invalidate_key_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
