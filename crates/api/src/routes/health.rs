//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
    pub integrations: IntegrationsHealth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Which optional outbound integrations are switched on.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct IntegrationsHealth {
    pub email: bool,
    pub remote_chat: bool,
    pub weather: bool,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Full health check with database latency.
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();
    let connected = persistence::db::ping(&state.pool).await.is_ok();
    let latency_ms = start.elapsed().as_millis() as u64;

    let response = HealthResponse {
        status: if connected { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        database: DatabaseHealth {
            connected,
            latency_ms: connected.then_some(latency_ms),
        },
        integrations: IntegrationsHealth {
            email: state.config.email.enabled,
            remote_chat: state.config.chat.remote_enabled,
            weather: state.config.weather.enabled,
        },
    };

    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Returns 200 while the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse { status: "alive" })
}

/// Returns 200 when the database answers.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    persistence::metrics::record_pool_metrics(&state.pool);
    match persistence::db::ping(&state.pool).await {
        Ok(()) => Ok(Json(StatusResponse { status: "ready" })),
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}
