/// HTTP server setup and routing
use crate::{
    context::AppContext,
    error::{AdminError, AdminResult},
    metrics,
};
use axum::{
    extract::{MatchedPath, Request},
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{Json, Response},
    Router,
};
use serde_json::json;
use std::time::Instant;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
/// Returns Router<()> because state is already provided
pub fn build_router(ctx: AppContext) -> Router {
    // Create CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(crate::api::routes())
        .fallback(not_found)
        // Provide state - converts Router<AppContext> to Router<()>
        .with_state(ctx)
        .layer(middleware::from_fn(track_metrics))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Record request counts and latencies, labelled by route template
async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    metrics::HTTP_REQUESTS_ACTIVE.inc();
    let response = next.run(req).await;
    metrics::HTTP_REQUESTS_ACTIVE.dec();

    let status = response.status();
    metrics::record_http_request(&method, &path, status.as_u16(), start.elapsed().as_secs_f64());
    if status.is_server_error() {
        metrics::record_error(status.as_str(), "http");
    }

    response
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NotFound",
            "message": "Endpoint not found"
        })),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> AdminResult<()> {
    let addr = ctx.config.bind_address();

    info!("Marketplace admin service listening on {}", addr);
    info!("   Database: {}", ctx.config.storage.database_path.display());

    let app = build_router(ctx);

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AdminError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AdminError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
