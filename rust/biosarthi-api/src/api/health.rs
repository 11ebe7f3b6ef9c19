//! Health check endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use crate::AppState;
use crate::config::missing_env_keys;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Active key-value backend.
    pub store: &'static str,
}

/// Basic health check.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        store: state.kv.backend_name(),
    })
}

/// Readiness check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    pub status: &'static str,
    /// Required environment keys that are not set.
    pub missing_keys: Vec<String>,
}

/// Ready once every required environment key is set.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let missing_keys = missing_env_keys(&state.config.health.required_env_keys);

    if missing_keys.is_empty() {
        (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                missing_keys,
            }),
        )
    } else {
        tracing::warn!(missing = ?missing_keys, "Required environment keys are missing");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "missing_keys",
                missing_keys,
            }),
        )
    }
}
