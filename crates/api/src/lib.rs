//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for bank accounts, the ledger, financial accounts and the sale bridge
//! - Bearer token authentication middleware and role checks
//! - Request extractors that report schema failures as 400
//! - Mapping from domain errors to HTTP responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use agencia_shared::{JwtService, LedgerConfig};
use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Ledger switches.
    pub ledger: Arc<LedgerConfig>,
    /// Upper bound for a single request.
    pub request_timeout: Duration,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let timeout = state.request_timeout;
    Router::new()
        .merge(routes::health::routes())
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
