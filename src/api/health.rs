use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    forecast: ComponentHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn healthy(detail: String) -> Self {
        Self {
            status: "healthy".to_string(),
            detail: Some(detail),
            error: None,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            detail: None,
            error: Some(error),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Ready once the precomputed table has rows to chart
fn check_forecast(state: &AppState) -> ComponentHealth {
    let forecast = &state.forecast;
    if forecast.table.is_empty() {
        return ComponentHealth::unhealthy("forecast table is empty".to_string());
    }
    ComponentHealth::healthy(format!(
        "{} rows, {} predicted",
        forecast.table.len(),
        forecast.predicted_rows
    ))
}

/// GET /health/ready - Readiness probe
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let forecast = check_forecast(&state);
    let healthy = forecast.is_healthy();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now(),
        checks: HealthChecks { forecast },
    };
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    tracing::debug!(healthy, "Readiness check completed");

    (status_code, Json(response))
}

/// GET /health/live - Liveness probe
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
