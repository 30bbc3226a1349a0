//! Line-window fallback chunker.
//!
//! Used when the structural parser rejects a file. Windows are contiguous
//! and non-overlapping; windows containing only blank lines are dropped.

use std::time::Instant;

use crate::processing::{detect_language, Language, SourceLines};
use crate::types::{ChunkType, ChunkingConfig, ChunkingResult, CodeChunk, ProcessingMethod};

use super::base::Chunker;

/// Splits content into fixed-size line windows.
pub struct LineChunker {
    window: usize,
}

impl LineChunker {
    /// Create a line chunker sized from the configuration.
    pub fn new(config: &ChunkingConfig) -> Self {
        Self::with_window(config.line_window())
    }

    /// Create a line chunker with an explicit window (in lines).
    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Split `content` into line windows tagged with `language`.
    pub fn split(&self, content: &str, file_path: &str, language: Language) -> Vec<CodeChunk> {
        let lines = SourceLines::new(content);
        let mut chunks = Vec::new();
        let mut start = 1;

        while start <= lines.len() {
            let end = (start + self.window - 1).min(lines.len());
            if (start..=end).any(|n| !lines.is_blank(n)) {
                let text = lines.slice(start, end);
                let chunk = CodeChunk::contiguous(
                    ChunkType::Mixed,
                    text.to_string(),
                    language,
                    file_path,
                    start,
                    end,
                )
                .with_complexity(self.complexity_score(text))
                .with_meta("fallback_method", "line_based")
                .with_meta("window_index", chunks.len())
                .with_meta("line_count", end - start + 1);
                chunks.push(chunk);
            }
            start = end + 1;
        }

        chunks
    }
}

impl Chunker for LineChunker {
    fn name(&self) -> &'static str {
        "line"
    }

    fn supports_language(&self, _language: Language) -> bool {
        true
    }

    fn chunk_code(&self, content: &str, file_path: &str) -> ChunkingResult {
        let started = Instant::now();
        let chunks = self.split(content, file_path, detect_language(file_path));
        let mut result = ChunkingResult::new(chunks, ProcessingMethod::LineFallback)
            .with_warning(format!("Line-based fallback used ({} lines per window)", self.window));
        if result.chunks.is_empty() {
            result = result.with_warning("Empty content, nothing to chunk");
        }
        result.with_processing_time(started.elapsed())
    }

    fn description(&self) -> &'static str {
        "Fixed line windows for sources that fail to parse"
    }
}
