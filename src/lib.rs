//! Semantic Chunker Library
//!
//! Splits large source files into structure-preserving chunks (module
//! preamble, classes, methods, functions, residual code) and infers the
//! dependency edges between them. Python, JavaScript and TypeScript are
//! chunked structurally; every other file falls back to size-based windows.

pub mod api;
pub mod ast_engine;
pub mod batch;
pub mod chunkers;
pub mod enrichment;
pub mod error;
pub mod processing;
pub mod router;
pub mod types;

pub use batch::{BatchProcessor, BatchReport, FileReport};
pub use chunkers::{Chunker, LineChunker, SizeChunker, StructuralChunker};
pub use enrichment::DependencyAnalyzer;
pub use error::{ChunkerError, Result};
pub use processing::{detect_language, Language};
pub use router::{ChunkingRouter, StatsDelta, StatsSnapshot};
pub use types::{
    ChunkType, ChunkingConfig, ChunkingResult, CodeChunk, DependencyRelation, ProcessingMethod,
    RelationType,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::chunkers::{Chunker, LineChunker, SizeChunker, StructuralChunker};
    pub use crate::error::{ChunkerError, Result};
    pub use crate::processing::{detect_language, Language};
    pub use crate::router::ChunkingRouter;
    pub use crate::types::*;
}

/// Default maximum class span emitted as one chunk (bytes)
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 2000;

/// Default minimum chunk size (bytes)
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 100;

/// Files above this size are worth chunking (bytes)
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 50_000;

/// Upper bound for direct reads by callers (120KB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 120 * 1024;

/// Lines scanned for module-level imports and assignments
pub const DEFAULT_MODULE_SCAN_LINES: usize = 50;

/// Default window of the size-based fallback (bytes)
pub const DEFAULT_FALLBACK_WINDOW_BYTES: usize = 2000;
