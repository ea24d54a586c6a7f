//! HTTP server for pcdocd

use crate::routes;
use anyhow::{Context, Result};
use axum::Router;
use pcdoc_common::DiagnosisEngine;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Application state shared across handlers
pub struct AppState {
    pub engine: Arc<DiagnosisEngine>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: DiagnosisEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            start_time: Instant::now(),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::knowledge_routes())
        .merge(routes::diagnosis_routes())
        .merge(routes::contribution_routes())
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until Ctrl-C
pub async fn run(state: AppState, bind: &str) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("  Listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down gracefully");
    }
}
