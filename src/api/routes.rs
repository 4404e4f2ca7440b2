//! HTTP API route definitions.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{exchanges, health, metrics, opportunities, ready, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
        // Status endpoints
        .route("/api/v1/exchanges", get(exchanges))
        .route("/api/v1/opportunities", get(opportunities))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
