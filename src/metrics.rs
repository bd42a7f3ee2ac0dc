/// Metrics and telemetry for the marketplace admin service
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Upstream service calls
/// - Admin actions
/// - Dispute transitions

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    /// Active HTTP requests
    pub static ref HTTP_REQUESTS_ACTIVE: IntGauge = register_int_gauge!(
        "http_requests_active",
        "Number of HTTP requests currently being processed"
    )
    .unwrap();

    // ========== Upstream Metrics ==========

    /// Upstream calls by service, operation, and outcome
    pub static ref UPSTREAM_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "upstream_calls_total",
        "Total number of calls to upstream services",
        &["service", "operation", "outcome"]
    )
    .unwrap();

    /// Upstream call duration in seconds
    pub static ref UPSTREAM_CALL_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "upstream_call_duration_seconds",
        "Upstream call latencies in seconds",
        &["service", "operation"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    // ========== Admin Metrics ==========

    /// Admin actions by action type
    pub static ref ADMIN_ACTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "admin_actions_total",
        "Total number of completed admin actions",
        &["action_type", "target_type"]
    )
    .unwrap();

    /// Dispute transitions by resulting status
    pub static ref DISPUTE_TRANSITIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "dispute_transitions_total",
        "Total number of dispute status transitions",
        &["status"]
    )
    .unwrap();

    // ========== Error Metrics ==========

    /// Errors by error type
    pub static ref ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "errors_total",
        "Total number of errors",
        &["error_type", "module"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record an upstream call
pub fn record_upstream_call(service: &str, operation: &str, outcome: &str, duration: f64) {
    UPSTREAM_CALLS_TOTAL
        .with_label_values(&[service, operation, outcome])
        .inc();
    UPSTREAM_CALL_DURATION_SECONDS
        .with_label_values(&[service, operation])
        .observe(duration);
}

/// Record a completed admin action
pub fn record_admin_action(action_type: &str, target_type: &str) {
    ADMIN_ACTIONS_TOTAL
        .with_label_values(&[action_type, target_type])
        .inc();
}

/// Record a dispute transition
pub fn record_dispute_transition(status: &str) {
    DISPUTE_TRANSITIONS_TOTAL
        .with_label_values(&[status])
        .inc();
}

/// Record an error
pub fn record_error(error_type: &str, module: &str) {
    ERRORS_TOTAL
        .with_label_values(&[error_type, module])
        .inc();
}
