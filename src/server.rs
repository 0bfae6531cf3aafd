//! HTTP front end for batch processing.
//!
//! Exposes the local batch coordinator over a small JSON API:
//!
//! - `POST /process` with `{"urls": [...]}` runs a batch and returns
//!   `{"results": [...]}`; an empty batch is a 400.
//! - `GET /health` for liveness checks.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::batch::{BatchError, BatchProcessor};
use crate::pipeline::ItemResult;

/// Batch submission payload.
///
/// A missing `urls` field reads as an empty list, so it hits the same
/// validation path as an explicitly empty batch.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    /// URLs to process.
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Batch response payload.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    /// One result per submitted URL, in completion order.
    pub results: Vec<ItemResult>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Builds the application router.
pub fn router(batch: BatchProcessor) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/process", post(process))
        .with_state(batch)
}

/// Binds the listener and serves the API until shutdown.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, batch: BatchProcessor) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "listening");
    axum::serve(listener, router(batch)).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[instrument(skip_all, fields(urls = request.urls.len()))]
async fn process(
    State(batch): State<BatchProcessor>,
    Json(request): Json<ProcessRequest>,
) -> Response {
    match batch.run(&request.urls).await {
        Ok(results) => (StatusCode::OK, Json(ProcessResponse { results })).into_response(),
        Err(e @ BatchError::EmptyBatch) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
