//! Base trait for all chunkers.

use lazy_static::lazy_static;
use regex::Regex;

use crate::enrichment::DependencyAnalyzer;
use crate::processing::Language;
use crate::types::{ChunkingResult, CodeChunk, DependencyRelation};

/// The core trait that all chunkers must implement.
///
/// A chunker splits one file into chunks. It never fails outward: problems
/// are reported through the returned [`ChunkingResult`].
pub trait Chunker: Send + Sync {
    /// Get the name of this chunker.
    fn name(&self) -> &'static str;

    /// Check if this chunker handles the given language.
    fn supports_language(&self, language: Language) -> bool;

    /// Chunk the given content.
    ///
    /// # Arguments
    /// * `content` - Full file content, already read by the caller
    /// * `file_path` - Originating path, recorded on every chunk
    fn chunk_code(&self, content: &str, file_path: &str) -> ChunkingResult;

    /// Infer dependency edges between chunks. Pure function of `chunks`.
    fn analyze_dependencies(&self, chunks: &[CodeChunk]) -> Vec<DependencyRelation> {
        DependencyAnalyzer::analyze(chunks)
    }

    /// Heuristic complexity of a piece of code.
    fn complexity_score(&self, content: &str) -> f64 {
        complexity_score(content)
    }

    /// Get the description of this chunker.
    fn description(&self) -> &'static str {
        "A source code chunker"
    }
}

lazy_static! {
    static ref COMPLEXITY_PATTERNS: Vec<(Regex, f64)> = vec![
        (Regex::new(r"\b(if|elif|else|case|switch|match)\b").unwrap(), 1.0),
        (Regex::new(r"\b(try|except|catch|finally)\b").unwrap(), 1.2),
        (Regex::new(r"\b(for|while)\b").unwrap(), 1.5),
        (Regex::new(r"\b(def|class|function)\b").unwrap(), 2.0),
    ];
}

/// Non-blank line count plus weighted keyword occurrences.
///
/// Weights are tuning constants; only the relative ordering is meaningful.
pub fn complexity_score(content: &str) -> f64 {
    let lines = content.lines().filter(|l| !l.trim().is_empty()).count() as f64;
    COMPLEXITY_PATTERNS
        .iter()
        .fold(lines, |score, (pattern, weight)| {
            score + pattern.find_iter(content).count() as f64 * weight
        })
}
