//! Request and response definitions for the HTTP and batch surfaces.

use serde::{Deserialize, Serialize};

/// A source file to be chunked. Content is supplied already read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path used for language detection and traceability only
    pub file_path: String,

    /// Full file content
    pub content: String,
}

impl SourceFile {
    pub fn new(file_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            content: content.into(),
        }
    }

    /// Content length in bytes.
    pub fn size_bytes(&self) -> usize {
        self.content.len()
    }
}

/// Request to chunk several files in one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkBatchRequest {
    pub files: Vec<SourceFile>,
}

/// Request to evaluate the size-threshold predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShouldChunkRequest {
    /// Size of the candidate file in bytes
    pub size_bytes: u64,

    /// Threshold override; the configured `large_file_threshold` otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u64>,
}

/// Response for the size-threshold predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShouldChunkResponse {
    pub should_chunk: bool,
    pub threshold: u64,
}
