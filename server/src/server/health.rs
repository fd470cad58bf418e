//! Health check endpoints.

use super::state::{AppState, Backend};
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Health check endpoint.
///
/// Returns 200 OK if the service is running.
/// This is a simple liveness check - it doesn't verify dependencies.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"ok","version":"0.1.0"}
/// ```
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,
    /// Database connectivity (`None` when the server runs without a pool)
    pub database: Option<bool>,
}

/// Readiness check endpoint.
///
/// Returns 200 OK when Postgres answers, 503 otherwise.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/ready
/// # {"ready":true,"database":true}
/// ```
pub async fn readiness_check<B: Backend>(
    State(state): State<AppState<B>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let database = match &state.pool {
        Some(pool) => Some(match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => true,
            Err(error) => {
                tracing::warn!(%error, "Readiness check: database unreachable");
                false
            }
        }),
        None => None,
    };

    let ready = database.unwrap_or(true);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessResponse { ready, database }))
}
