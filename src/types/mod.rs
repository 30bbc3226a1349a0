//! Core types for the chunking engine.

mod chunk;
mod config;
mod result;
mod source;

pub use chunk::{chunk_id, chunk_id_at, ChunkType, CodeChunk, DependencyRelation, Priority, RelationType};
pub use config::{ChunkingConfig, CONFIG_FILE_ENV, ENV_PREFIX};
pub use result::{processing_order, ChunkingResult, ProcessingMethod};
pub use source::{ChunkBatchRequest, ShouldChunkRequest, ShouldChunkResponse, SourceFile};
