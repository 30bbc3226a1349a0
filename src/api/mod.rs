//! HTTP surface of the chunking service.

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use handlers::AppState;

/// Build the HTTP routes with middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Chunking
        .route("/chunk", post(handlers::chunk_file))
        .route("/chunk/batch", post(handlers::chunk_batch))
        .route("/chunk/should", post(handlers::should_chunk))
        .route("/chunk/languages", get(handlers::list_languages))
        // Statistics
        .route("/stats", get(handlers::get_stats))
        // State
        .with_state(state)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::types::ChunkingConfig;

    fn app() -> Router {
        build_router(Arc::new(AppState::new(ChunkingConfig::default())))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(), get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_chunk_python_file() {
        let request = post_json(
            "/chunk",
            json!({
                "file_path": "svc.py",
                "content": "class A:\n    pass\n\n\nclass B(A):\n    pass\n"
            }),
        );
        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["processing_method"], "structural");
        assert_eq!(body["total_chunks"], 2);
        assert_eq!(body["relations"][0]["relation_type"], "inheritance");
        assert_eq!(body["chunks"][0]["language"], "python");
    }

    #[tokio::test]
    async fn test_chunk_batch_and_stats() {
        let state = Arc::new(AppState::new(ChunkingConfig::default()));
        let request = post_json(
            "/chunk/batch",
            json!({
                "files": [
                    {"file_path": "a.py", "content": "X = 1\n"},
                    {"file_path": "b.xyz", "content": "plain\n"}
                ]
            }),
        );
        let (status, body) = send(build_router(Arc::clone(&state)), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_files"], 2);
        assert_eq!(body["files"][1]["result"]["processing_method"], "size_fallback");

        let (status, stats) = send(build_router(state), get_request("/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["files_processed"], 2);
        assert_eq!(stats["fallback_count"], 1);
    }

    #[tokio::test]
    async fn test_should_chunk() {
        let (_, body) = send(app(), post_json("/chunk/should", json!({"size_bytes": 60000}))).await;
        assert_eq!(body["should_chunk"], true);
        assert_eq!(body["threshold"], 50000);

        let request = post_json("/chunk/should", json!({"size_bytes": 60000, "threshold": 100000}));
        let (_, body) = send(app(), request).await;
        assert_eq!(body["should_chunk"], false);
    }

    #[tokio::test]
    async fn test_list_languages() {
        let (status, body) = send(app(), get_request("/chunk/languages")).await;
        assert_eq!(status, StatusCode::OK);
        let languages = body.as_array().unwrap();
        assert!(languages.contains(&json!("python")));
        assert!(languages.contains(&json!("javascript")));
    }
}
