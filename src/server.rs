//! HTTP Server
//!
//! This module implements the Prometheus exporter HTTP server.
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing `/metrics`, `/health`, and `/` endpoints
//! - **Exporter**: one [`Exporter`] built at startup and shared with every handler
//! - **Background Collectors**: started by the exporter, stopped on shutdown
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format, collected on demand
//! - `GET /health` - Health check (returns 200 if the cluster answered the last version query, 503 otherwise)
//!
//! # Error Handling
//!
//! Collection failures never fail a scrape: `/metrics` answers 200 with whatever subset of
//! samples could be produced, possibly none.

use crate::ceph::CommandGateway;
use crate::config::Config;
use crate::exporter::Exporter;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    exporter: Arc<Exporter>,
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let gateway = Arc::new(CommandGateway::new(config.ceph.clone()));
    let exporter = Arc::new(Exporter::new(gateway, &config)?);

    let app = router(exporter.clone());

    // Start the server
    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    exporter.shutdown().await;
    served?;

    Ok(())
}

/// Routes served by the exporter
pub fn router(exporter: Arc<Exporter>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(AppState { exporter })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn root_handler() -> impl IntoResponse {
    r#"<html>
<head><title>Ceph Exporter</title></head>
<body>
<h1>Ceph Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.exporter.render().await {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.exporter.is_up() {
        (axum::http::StatusCode::OK, "OK")
    } else {
        (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Ceph cluster unreachable",
        )
    }
}
