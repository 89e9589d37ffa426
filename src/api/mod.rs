pub mod error;
pub mod health;
pub mod v1;

use axum::{http::StatusCode, routing::get, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{dashboard::dashboard_handler, state::AppState};

/// Dashboard page, figure/forecast API and health probes.
///
/// Public so a host process can mount the dashboard inside its own server.
pub fn router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .route("/", get(dashboard_handler))
        .nest("/api/v1", v1::router())
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .layer(ServiceBuilder::new().layer(timeout_layer(timeout)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Slow handlers are answered with 408.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}
