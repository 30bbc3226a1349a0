//! Semantic Chunker Service - Main Entry Point
//!
//! Serves the chunking engine over HTTP.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use semantic_chunker::api::{build_router, AppState};
use semantic_chunker::types::ChunkingConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "semantic_chunker=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = ChunkingConfig::from_env();

    info!("Starting Semantic Chunker v{}", env!("CARGO_PKG_VERSION"));
    info!(
        max_chunk_size = config.max_chunk_size,
        large_file_threshold = config.large_file_threshold,
        "Chunking thresholds"
    );

    let state = Arc::new(AppState::new(config));
    info!(languages = ?state.router.supported_languages(), "Structural chunkers ready");

    let app = build_router(state);

    // Start server
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3017);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
