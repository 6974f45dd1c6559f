//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (intentionally unauthenticated for load balancers)
        .route("/v1/health", get(handlers::health_check))
        // Full upload path
        .route("/v1/upload", post(handlers::upload_file))
        // Instant-upload check
        .route("/v1/dedup", post(handlers::dedup_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
