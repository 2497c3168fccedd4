//! HTTP surface for the runner.
//!
//! One dynamic endpoint, `POST /api/demo`, runs a job and answers with the
//! worker's payload verbatim; failures come back as
//! `{"success": false, "error": ...}` with a status code matched to the
//! failure class. `GET /api/health` is a plain liveness route.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::error::{Result, RunnerError};
use crate::runner::JobRunner;

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<JobRunner>,
}

#[derive(Deserialize)]
struct DemoRequest {
    /// Absent in the body deserializes as empty, which the runner rejects
    /// as `InvalidRequest` rather than an extractor-level 422.
    #[serde(default)]
    goal: String,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/demo", post(run_demo_handler))
        .layer(cors)
        .with_state(state)
}

/// Serve the API on `addr` until `shutdown` is cancelled, then drain
/// in-flight requests and return.
pub async fn run_server(
    addr: SocketAddr,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = router(state);

    tracing::info!(addr = %addr, "Starting runner API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RunnerError::Internal(format!("failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| RunnerError::Internal(format!("server failed: {}", e)))
}

/// Install signal handling for SIGTERM and SIGINT.
///
/// Returns a `CancellationToken` that is cancelled when either signal
/// arrives; the server monitors it and drains gracefully.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let handler_token = token.clone();

    tokio::spawn(async move {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT, initiating graceful shutdown");
            }
        }

        handler_token.cancel();
    });

    token
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn run_demo_handler(
    State(state): State<AppState>,
    Json(payload): Json<DemoRequest>,
) -> impl IntoResponse {
    match state.runner.run(&payload.goal).await {
        Ok(result) => (StatusCode::OK, Json(result)),
        Err(e) => {
            tracing::error!(error = %e, "Demo run failed");
            (
                error_status(&e),
                Json(json!({ "success": false, "error": e.to_string() })),
            )
        }
    }
}

fn error_status(error: &RunnerError) -> StatusCode {
    match error {
        RunnerError::InvalidRequest => StatusCode::BAD_REQUEST,
        RunnerError::EnvironmentUnavailable { .. } | RunnerError::ScriptNotFound { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        RunnerError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
