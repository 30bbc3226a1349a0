//! HTTP request handlers for the chunking service.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::{error, info};

use crate::batch::{BatchProcessor, BatchReport};
use crate::processing::Language;
use crate::router::{ChunkingRouter, StatsSnapshot};
use crate::types::{
    ChunkBatchRequest, ChunkingConfig, ChunkingResult, ShouldChunkRequest, ShouldChunkResponse,
    SourceFile,
};

/// Application state shared across handlers.
pub struct AppState {
    pub router: Arc<ChunkingRouter>,
    pub config: ChunkingConfig,
}

impl AppState {
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            router: Arc::new(ChunkingRouter::new(&config)),
            config,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Chunk a single file.
pub async fn chunk_file(
    State(state): State<Arc<AppState>>,
    Json(file): Json<SourceFile>,
) -> Result<Json<ChunkingResult>, StatusCode> {
    info!(
        file_path = %file.file_path,
        size = file.size_bytes(),
        "Received chunk request"
    );

    let router = Arc::clone(&state.router);
    let result =
        tokio::task::spawn_blocking(move || router.process_large_file(&file.file_path, &file.content))
            .await
            .map_err(|e| {
                error!(error = %e, "Chunking task failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?;

    Ok(Json(result))
}

/// Chunk several files concurrently.
pub async fn chunk_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChunkBatchRequest>,
) -> Result<Json<BatchReport>, StatusCode> {
    info!(files = request.files.len(), "Received batch chunk request");

    let processor = BatchProcessor::new(Arc::clone(&state.router), state.config.batch_concurrency);
    processor
        .process_files(request.files)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Batch chunking failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// Evaluate the size-threshold predicate.
pub async fn should_chunk(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ShouldChunkRequest>,
) -> Json<ShouldChunkResponse> {
    let threshold = request.threshold.unwrap_or(state.config.large_file_threshold);
    Json(ShouldChunkResponse {
        should_chunk: state.router.should_chunk_size(request.size_bytes, Some(threshold)),
        threshold,
    })
}

/// Languages with structural support.
pub async fn list_languages(State(state): State<Arc<AppState>>) -> Json<Vec<Language>> {
    Json(state.router.supported_languages())
}

/// Aggregate processing statistics.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    Json(state.router.stats())
}
