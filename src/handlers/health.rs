use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::time::Instant;

use crate::errors::ServiceError;
use crate::handlers::AppState;

/// Component health status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

/// Individual component health details
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Full health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: String,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub database: ComponentHealth,
    pub response_time_ms: u128,
}

/// Tracks application start time for uptime calculation
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the start time (call this on application startup)
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn get_uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

/// Basic liveness probe - just checks if the service is running
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is alive")
    ),
    tag = "Health"
)]
async fn liveness_check() -> impl IntoResponse {
    Json(json!({
        "status": "up",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Readiness probe - checks if the service can reach its database
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "Database unreachable")
    ),
    tag = "Health"
)]
async fn readiness_check(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();

    let db_check_start = Instant::now();
    let db_result = crate::db::check_connection(&state.db).await;
    let db_latency = db_check_start.elapsed().as_millis() as u64;

    match db_result {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": {
                    "database": {
                        "status": "up",
                        "latency_ms": db_latency
                    }
                },
                "response_time_ms": start.elapsed().as_millis()
            })),
        )),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": {
                    "database": {
                        "status": "down",
                        "error": e.to_string()
                    }
                },
                "response_time_ms": start.elapsed().as_millis()
            })),
        )),
    }
}

/// Full health check with component details and uptime
#[utoipa::path(
    get,
    path = "/health/detailed",
    responses(
        (status = 200, description = "Component health report"),
        (status = 503, description = "A critical component is down")
    ),
    tag = "Health"
)]
async fn detailed_health_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();

    let db_check_start = Instant::now();
    let db_result = crate::db::check_connection(&state.db).await;
    let db_latency = db_check_start.elapsed().as_millis() as u64;
    let db_up = db_result.is_ok();

    let database = ComponentHealth {
        status: if db_up {
            ComponentStatus::Up
        } else {
            ComponentStatus::Down
        },
        message: db_result.map_or_else(
            |e| format!("Connection failed: {}", e),
            |_| "Connection successful".to_string(),
        ),
        latency_ms: Some(db_latency),
    };

    let status_code = if db_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if db_up {
            ComponentStatus::Up
        } else {
            ComponentStatus::Down
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_secs: get_uptime_secs(),
        database,
        response_time_ms: start.elapsed().as_millis(),
    };

    (status_code, Json(response))
}

/// Prometheus metrics in text exposition format
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Metrics in Prometheus text format", content_type = "text/plain")
    ),
    tag = "Health"
)]
pub async fn metrics_endpoint() -> Result<impl IntoResponse, ServiceError> {
    let body = crate::metrics::gather_metrics()
        .map_err(|e| ServiceError::InternalError(format!("Failed to gather metrics: {}", e)))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

/// Creates the router for health check endpoints
///
/// Endpoints:
/// - GET /         - Basic liveness probe
/// - GET /ready    - Readiness probe (checks database connectivity)
/// - GET /detailed - Full health check with component statuses
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(liveness_check))
        .route("/ready", get(readiness_check))
        .route("/detailed", get(detailed_health_check))
}
