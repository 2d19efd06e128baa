//! API Module
//!
//! HTTP handlers and routing for the gateway's admin REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache and limiter statistics
//! - `DELETE /cache/:key` - Invalidate one cached key
//! - `POST /cache/invalidate` - Invalidate by operation and parameters
//! - `POST /cache/clear` - Drop every cached entry

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
