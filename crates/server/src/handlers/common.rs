//! Shared handler helpers.

use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use depot_metadata::MetadataStore;
use serde_json::{Value, json};

/// GET /v1/health - Liveness and dependency probe.
///
/// Intentionally unauthenticated for load balancers and orchestration
/// probes.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.metadata.health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::error!(error = %e, "metadata health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded" })),
            )
        }
    }
}
