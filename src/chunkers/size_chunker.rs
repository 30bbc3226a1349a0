//! Byte-window fallback chunker.
//!
//! Used for languages without a structural chunker and for engine faults.
//! Chunk contents concatenate back to the input exactly.

use std::time::Instant;

use crate::processing::{detect_language, Language, SourceLines};
use crate::types::{ChunkType, ChunkingConfig, ChunkingResult, CodeChunk, ProcessingMethod};

use super::base::Chunker;

/// A boundary is moved back to a newline only if that newline lies past
/// this fraction of the window.
const NEWLINE_SNAP_RATIO: f64 = 0.7;

/// Splits content into fixed-size byte windows.
pub struct SizeChunker {
    window: usize,
}

impl SizeChunker {
    /// Create a size chunker sized from the configuration.
    pub fn new(config: &ChunkingConfig) -> Self {
        Self::with_window(config.size_window())
    }

    /// Create a size chunker with an explicit window (in bytes).
    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Byte offsets `[start, end)` of each window.
    pub fn boundaries(&self, content: &str) -> Vec<(usize, usize)> {
        let mut bounds = Vec::new();
        let mut start = 0;

        while start < content.len() {
            let mut end = (start + self.window).min(content.len());
            while !content.is_char_boundary(end) {
                end -= 1;
            }

            if end < content.len() {
                let snap_after = (self.window as f64 * NEWLINE_SNAP_RATIO) as usize;
                if let Some(pos) = content[start..end].rfind('\n') {
                    if pos > snap_after {
                        end = start + pos + 1;
                    }
                }
            }

            // Always make progress, even on a window narrower than one char
            if end <= start {
                end = start + content[start..].chars().next().map_or(1, char::len_utf8);
            }

            bounds.push((start, end));
            start = end;
        }

        bounds
    }

    /// Split `content` into byte windows tagged with `language`.
    pub fn split(&self, content: &str, file_path: &str, language: Language) -> Vec<CodeChunk> {
        let lines = SourceLines::new(content);

        self.boundaries(content)
            .into_iter()
            .enumerate()
            .map(|(index, (start, end))| {
                let text = &content[start..end];
                let start_line = lines.line_of_byte(start);
                let end_line = lines.line_of_byte(end - 1);
                CodeChunk::contiguous(
                    ChunkType::Mixed,
                    text.to_string(),
                    language,
                    file_path,
                    start_line,
                    end_line,
                )
                .with_complexity(self.complexity_score(text))
                .with_meta("fallback_method", "size_based")
                .with_meta("window_index", index)
                .at_byte_offset(start)
            })
            .collect()
    }
}

impl Chunker for SizeChunker {
    fn name(&self) -> &'static str {
        "size"
    }

    fn supports_language(&self, _language: Language) -> bool {
        true
    }

    fn chunk_code(&self, content: &str, file_path: &str) -> ChunkingResult {
        let started = Instant::now();
        let chunks = self.split(content, file_path, detect_language(file_path));
        let mut result = ChunkingResult::new(chunks, ProcessingMethod::SizeFallback)
            .with_warning(format!("Size-based fallback used ({} bytes per window)", self.window));
        if content.is_empty() {
            result = result.with_warning("Empty content, nothing to chunk");
        }
        result.with_processing_time(started.elapsed())
    }

    fn description(&self) -> &'static str {
        "Fixed byte windows for languages without structural support"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(chunks: &[CodeChunk]) -> String {
        chunks.iter().map(|c| c.content()).collect()
    }

    #[test]
    fn test_byte_coverage_is_exact() {
        let content: String = (0..200)
            .map(|i| format!("value_{} = compute({})\n", i, i))
            .collect();
        let chunker = SizeChunker::with_window(256);
        let chunks = chunker.split(&content, "data.xyz", Language::Unknown);

        assert!(chunks.len() > 1);
        assert_eq!(concat(&chunks), content);
        for chunk in &chunks {
            assert!(chunk.size_bytes() <= 256);
            assert!(chunk.start_line <= chunk.end_line);
        }
    }

    #[test]
    fn test_boundary_snaps_to_late_newline() {
        // Newline at offset 8 of a 10-byte window: past 70%, so cut after it
        let content = "aaaaaaaa\nbbbbbbbbbbbbbbbb";
        let bounds = SizeChunker::with_window(10).boundaries(content);
        assert_eq!(bounds[0], (0, 9));
    }

    #[test]
    fn test_boundary_ignores_early_newline() {
        // Newline at offset 2 is before 70% of the window
        let content = "aa\nbbbbbbbbbbbbbbbbbbbbb";
        let bounds = SizeChunker::with_window(10).boundaries(content);
        assert_eq!(bounds[0], (0, 10));
    }

    #[test]
    fn test_multibyte_content_is_not_split_mid_char() {
        let content = "héllo wörld ünïcödé ".repeat(20);
        let chunks = SizeChunker::with_window(7).split(&content, "a.txt", Language::Unknown);
        assert_eq!(concat(&chunks), content);
    }

    #[test]
    fn test_chunk_code_reports_fallback() {
        let result = SizeChunker::with_window(2000).chunk_code("some data\n", "notes.xyz");
        assert!(result.success);
        assert_eq!(result.processing_method, ProcessingMethod::SizeFallback);
        assert!(!result.warnings.is_empty());
        assert_eq!(result.total_chunks, 1);
        assert_eq!(result.chunks[0].language, Language::Unknown);
        assert_eq!(result.chunks[0].meta_str("fallback_method"), Some("size_based"));
    }

    #[test]
    fn test_ids_unique_for_long_single_line() {
        let content = "a".repeat(10_000);
        let chunks = SizeChunker::with_window(2000).split(&content, "blob.xyz", Language::Unknown);

        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|c| c.start_line == 1));
        let ids: std::collections::BTreeSet<_> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), chunks.len());
    }

    #[test]
    fn test_empty_content() {
        let result = SizeChunker::with_window(100).chunk_code("", "empty.xyz");
        assert!(result.success);
        assert_eq!(result.total_chunks, 0);
        assert_eq!(result.warnings.len(), 2);
    }
}
