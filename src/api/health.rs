/// Health check endpoints for liveness and readiness probes
///
/// Supports two types of probes:
/// - Liveness: Is the process alive and responding?
/// - Readiness: Can the service reach its database?
///
/// Upstream services are not probed; they are owned and monitored elsewhere.

use crate::{context::AppContext, db, metrics};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Health status of a component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,

    /// Status: "healthy" or "unhealthy"
    pub status: String,

    /// Response time in milliseconds
    pub response_time_ms: u64,

    /// Optional error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
        .route("/metrics", get(metrics_endpoint))
}

/// Basic health check
pub async fn health_basic() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness probe
///
/// If we can respond, we're alive.
pub async fn liveness_probe() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe
///
/// Returns 200 when the database answers, 503 otherwise.
pub async fn readiness_probe(
    State(ctx): State<AppContext>,
) -> (StatusCode, Json<serde_json::Value>) {
    let database = check_database(&ctx).await;

    let (status_code, status) = if database.status == "healthy" {
        (StatusCode::OK, "ready")
    } else {
        tracing::warn!(error = ?database.error, "readiness_probe_failed: database check failed");
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": status,
            "version": env!("CARGO_PKG_VERSION"),
            "checks": [database],
        })),
    )
}

/// Prometheus scrape endpoint
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
}

/// Check database connectivity
async fn check_database(ctx: &AppContext) -> ComponentHealth {
    let start = Instant::now();
    let result = db::test_connection(&ctx.db).await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => ComponentHealth {
            name: "database".to_string(),
            status: "healthy".to_string(),
            response_time_ms,
            error: None,
        },
        Err(e) => ComponentHealth {
            name: "database".to_string(),
            status: "unhealthy".to_string(),
            response_time_ms,
            error: Some(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_health_serialization() {
        let health = ComponentHealth {
            name: "database".to_string(),
            status: "healthy".to_string(),
            response_time_ms: 2,
            error: None,
        };

        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["name"], "database");
        assert!(json.get("error").is_none());
    }
}
