//! Health and metrics HTTP server.
//!
//! - `GET /health`, `GET /healthz` - always 200
//! - `GET /metrics`, `GET /metrics/` - Prometheus text format, only when
//!   metrics are enabled
//! - `GET /debug/pprof/...` - CPU profiling, only when enabled (unix)
//!
//! Everything else is a 404.

use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::metrics::PrometheusMetrics;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Build the router. `metrics` is `None` when the endpoint is disabled.
pub fn router(metrics: Option<PrometheusMetrics>, profiling: bool) -> Router {
    let routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health));

    let routes = match metrics {
        Some(metrics) => routes.merge(
            Router::new()
                .route("/metrics", get(render_metrics))
                .route("/metrics/", get(render_metrics))
                .with_state(metrics),
        ),
        None => routes,
    };

    #[cfg(unix)]
    let routes = if profiling {
        routes.merge(crate::profiling::router())
    } else {
        routes
    };

    if profiling && cfg!(not(unix)) {
        warn!("CPU profiling is not supported on this platform");
    }

    routes.fallback(not_found)
}

/// Serve `router` on `addr` until `cancel` fires.
pub async fn serve(
    addr: SocketAddr,
    router: Router,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP server to {addr}"))?;

    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn render_metrics(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        metrics.render(),
    )
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
