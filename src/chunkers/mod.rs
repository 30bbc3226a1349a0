//! Chunking strategies for source files.
//!
//! The structural chunker handles parseable files; the line and size
//! chunkers are fallbacks for parse failures and unsupported languages.

mod base;
mod line_chunker;
mod size_chunker;
mod structural_chunker;

pub use base::{complexity_score, Chunker};
pub use line_chunker::LineChunker;
pub use size_chunker::SizeChunker;
pub use structural_chunker::{verify_coverage, StructuralChunker};
