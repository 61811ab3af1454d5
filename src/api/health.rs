use crate::errors::AppError;
use crate::observability::{HealthChecker, HealthStatus, MetricsRecorder};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// GET /api/health - Liveness probe
pub async fn health(State(health_checker): State<Arc<HealthChecker>>) -> Json<HealthStatus> {
    Json(health_checker.liveness())
}

/// GET /api/health/ready - Readiness probe
#[tracing::instrument(skip(health_checker))]
pub async fn readiness(
    State(health_checker): State<Arc<HealthChecker>>,
) -> (StatusCode, Json<HealthStatus>) {
    let status = health_checker.readiness().await;

    let code = if status.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

/// GET /api/metrics - Prometheus metrics
pub async fn metrics() -> Result<impl IntoResponse, AppError> {
    let body = MetricsRecorder::export()
        .map_err(|e| AppError::Internal(format!("Failed to encode metrics: {}", e)))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
