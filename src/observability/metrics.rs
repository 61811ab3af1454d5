use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec, TextEncoder,
};
use std::time::Instant;

// Metrics registry
pub(crate) static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("metric can be registered")
});

static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latency in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.010, 0.050, 0.100, 0.500, 1.0, 5.0]
    )
    .expect("metric can be registered")
});

pub(crate) static RATE_LIMIT_DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rate_limit_decisions_total",
        "Rate limiter admission decisions",
        &["limiter", "decision"]
    )
    .expect("metric can be registered")
});

pub(crate) static AUTH_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "auth_events_total",
        "Authentication events by outcome",
        &["event", "outcome"]
    )
    .expect("metric can be registered")
});

pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn record_http_request(method: &str, path: &str, status: u16) {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
    }

    pub fn record_http_duration(method: &str, path: &str, duration: f64) {
        HTTP_REQUEST_DURATION
            .with_label_values(&[method, path])
            .observe(duration);
    }

    pub fn record_rate_limit_decision(limiter: &str, decision: &str) {
        RATE_LIMIT_DECISIONS_TOTAL
            .with_label_values(&[limiter, decision])
            .inc();
    }

    pub fn record_auth_event(event: &str, outcome: &str) {
        AUTH_EVENTS_TOTAL.with_label_values(&[event, outcome]).inc();
    }

    /// Export all metrics in Prometheus format
    pub fn export() -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        encoder.encode_to_string(&metric_families)
    }
}

/// Count and time every request. Labels use the route template so that
/// path parameters do not explode cardinality.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    MetricsRecorder::record_http_request(&method, &path, response.status().as_u16());
    MetricsRecorder::record_http_duration(&method, &path, started.elapsed().as_secs_f64());

    response
}
