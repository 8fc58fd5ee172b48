// handlers/public/system.rs - Service banner, health and metrics

use axum::{extract::State, response::IntoResponse};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, MetricsSnapshot};

/// GET / - Service banner
pub async fn root_get() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "public": ["/health", "/metrics", "/api/users/register", "/api/users/login"],
            "protected": ["/api/auth", "/api/pets", "/api/users"]
        }
    }))
}

/// GET /health - 200 when the store answers, 503 otherwise
pub async fn health_get(State(state): State<AppState>) -> impl IntoResponse {
    match state.health.ping().await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!("health check failed: {}", e);
            ApiError::service_unavailable("Database unavailable").into_response()
        }
    }
}

/// GET /metrics - Request counters since start
pub async fn metrics_get(State(state): State<AppState>) -> ApiResult<MetricsSnapshot> {
    Ok(ApiResponse::success(state.metrics.snapshot()))
}
