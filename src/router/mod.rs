//! Chunking strategy router.

mod stats;

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::chunkers::{Chunker, SizeChunker, StructuralChunker};
use crate::processing::{detect_language, Language};
use crate::types::{ChunkingConfig, ChunkingResult};

pub use stats::{ProcessingStats, StatsDelta, StatsSnapshot};

/// Router that selects the chunker for a file based on its language.
///
/// Languages without a registered chunker, and chunkers that fail
/// internally, are handled by the size-based fallback. Every call yields
/// a [`ChunkingResult`].
pub struct ChunkingRouter {
    /// Registered chunkers keyed by language
    chunkers: HashMap<Language, Arc<dyn Chunker>>,
    /// Fallback for unsupported languages and engine faults
    size_chunker: Arc<SizeChunker>,
    stats: ProcessingStats,
    config: ChunkingConfig,
}

impl ChunkingRouter {
    /// Create a router with a structural chunker for every supported language.
    pub fn new(config: &ChunkingConfig) -> Self {
        let mut router = Self {
            chunkers: HashMap::new(),
            size_chunker: Arc::new(SizeChunker::new(config)),
            stats: ProcessingStats::new(),
            config: config.clone(),
        };

        for language in Language::STRUCTURAL {
            match StructuralChunker::new(language, config) {
                Ok(chunker) => router.register(language, Arc::new(chunker)),
                Err(e) => {
                    error!(language = %language, error = %e, "Failed to initialize structural chunker")
                }
            }
        }

        router
    }

    /// Register (or replace) the chunker for a language.
    pub fn register(&mut self, language: Language, chunker: Arc<dyn Chunker>) {
        debug!(language = %language, chunker = chunker.name(), "Registered chunker");
        self.chunkers.insert(language, chunker);
    }

    /// Get the chunker registered for a language.
    pub fn get_chunker(&self, language: Language) -> Option<Arc<dyn Chunker>> {
        self.chunkers.get(&language).map(Arc::clone)
    }

    /// Languages with a registered chunker, sorted.
    pub fn supported_languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.chunkers.keys().copied().collect();
        languages.sort();
        languages
    }

    /// Whether the file on disk is large enough to be worth chunking.
    ///
    /// Unreadable files are never chunked.
    pub fn should_chunk_file(&self, path: impl AsRef<Path>, threshold: Option<u64>) -> bool {
        let path = path.as_ref();
        match std::fs::metadata(path) {
            Ok(meta) => self.should_chunk_size(meta.len(), threshold),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read file size");
                false
            }
        }
    }

    /// Whether content of `size_bytes` exceeds the chunking threshold.
    pub fn should_chunk_size(&self, size_bytes: u64, threshold: Option<u64>) -> bool {
        size_bytes > threshold.unwrap_or(self.config.large_file_threshold)
    }

    /// Whether content is too large for callers to read directly.
    pub fn exceeds_max_file_size(&self, size_bytes: u64) -> bool {
        size_bytes > self.config.max_file_size
    }

    /// Chunk one file without touching the aggregate counters.
    ///
    /// Returns the result together with the counter changes it implies, so
    /// callers running many files can fold them elsewhere.
    pub fn chunk_file(&self, file_path: &str, content: &str) -> (ChunkingResult, StatsDelta) {
        let language = detect_language(file_path);

        let result = match self.chunkers.get(&language) {
            Some(chunker) => {
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| chunker.chunk_code(content, file_path)));
                match outcome {
                    Ok(result) if result.success => result,
                    Ok(result) => {
                        warn!(
                            file_path = %file_path,
                            language = %language,
                            errors = ?result.errors,
                            "Structural chunking failed, using size-based fallback"
                        );
                        self.size_fallback(content, file_path, result.errors)
                    }
                    Err(_) => {
                        error!(
                            file_path = %file_path,
                            language = %language,
                            "Chunker panicked, using size-based fallback"
                        );
                        self.size_fallback(
                            content,
                            file_path,
                            vec![format!("{} chunker panicked", chunker.name())],
                        )
                    }
                }
            }
            None => {
                debug!(file_path = %file_path, language = %language, "No chunker registered");
                self.size_chunker.chunk_code(content, file_path)
            }
        };

        debug!(
            file_path = %file_path,
            method = %result.processing_method,
            chunks = result.total_chunks,
            "Chunked file"
        );

        let delta = StatsDelta::from_result(&result);
        (result, delta)
    }

    /// Chunk one file and record it in the aggregate counters.
    pub fn process_large_file(&self, file_path: &str, content: &str) -> ChunkingResult {
        let (result, delta) = self.chunk_file(file_path, content);
        self.record(delta);
        result
    }

    /// Fold externally accumulated counter changes into the totals.
    pub fn record(&self, delta: StatsDelta) {
        self.stats.record(delta);
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    fn size_fallback(&self, content: &str, file_path: &str, causes: Vec<String>) -> ChunkingResult {
        let mut result = self.size_chunker.chunk_code(content, file_path);
        result
            .warnings
            .extend(causes.into_iter().map(|cause| format!("Structural chunking failed: {}", cause)));
        result
    }
}

impl Default for ChunkingRouter {
    fn default() -> Self {
        Self::new(&ChunkingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkType, ProcessingMethod};
    use std::io::Write;

    struct PanickingChunker;

    impl Chunker for PanickingChunker {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn supports_language(&self, _language: Language) -> bool {
            true
        }

        fn chunk_code(&self, _content: &str, _file_path: &str) -> ChunkingResult {
            panic!("unexpected tree shape")
        }
    }

    struct FailingChunker;

    impl Chunker for FailingChunker {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn supports_language(&self, _language: Language) -> bool {
            true
        }

        fn chunk_code(&self, _content: &str, _file_path: &str) -> ChunkingResult {
            ChunkingResult::failed(ProcessingMethod::Structural, "line 3 is not covered")
        }
    }

    #[test]
    fn test_structural_languages_registered() {
        let router = ChunkingRouter::default();
        let languages = router.supported_languages();
        assert!(languages.contains(&Language::Python));
        assert!(languages.contains(&Language::JavaScript));
        assert!(languages.contains(&Language::TypeScript));
        assert!(router.get_chunker(Language::Go).is_none());
        assert_eq!(router.get_chunker(Language::Python).unwrap().name(), "structural");
    }

    #[test]
    fn test_python_uses_structural_chunker() {
        let router = ChunkingRouter::default();
        let code = "import os\n\n\ndef main():\n    return os.getcwd()\n";
        let result = router.process_large_file("app/main.py", code);

        assert!(result.success);
        assert_eq!(result.processing_method, ProcessingMethod::Structural);
        assert!(result.chunks.iter().any(|c| c.chunk_type == ChunkType::Function));
    }

    #[test]
    fn test_unknown_language_uses_size_fallback() {
        let router = ChunkingRouter::default();
        let content = "opaque data\n".repeat(400);
        let result = router.process_large_file("blob.xyz", &content);

        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(result.processing_method, ProcessingMethod::SizeFallback);
        assert!(result.total_chunks > 1);
        let joined: String = result.chunks.iter().map(|c| c.content()).collect();
        assert_eq!(joined, content);
    }

    #[test]
    fn test_panicking_chunker_falls_back() {
        let mut router = ChunkingRouter::default();
        router.register(Language::Python, Arc::new(PanickingChunker));

        let result = router.process_large_file("boom.py", "x = 1\n");
        assert!(result.success);
        assert_eq!(result.processing_method, ProcessingMethod::SizeFallback);
        assert!(result.warnings.iter().any(|w| w.contains("panicked")));
    }

    #[test]
    fn test_failed_result_falls_back() {
        let mut router = ChunkingRouter::default();
        router.register(Language::Python, Arc::new(FailingChunker));

        let result = router.process_large_file("gap.py", "x = 1\n");
        assert!(result.success);
        assert_eq!(result.processing_method, ProcessingMethod::SizeFallback);
        assert!(result.warnings.iter().any(|w| w.contains("line 3 is not covered")));
    }

    #[test]
    fn test_stats_are_recorded() {
        let router = ChunkingRouter::default();
        router.process_large_file("a.py", "def a():\n    return 1\n");
        router.process_large_file("b.xyz", "plain text\n");

        let stats = router.stats();
        assert_eq!(stats.files_processed, 2);
        assert_eq!(stats.fallback_count, 1);
        assert!(stats.chunks_created >= 2);
    }

    #[test]
    fn test_chunk_file_leaves_stats_untouched() {
        let router = ChunkingRouter::default();
        let (result, delta) = router.chunk_file("c.py", "VALUE = 1\n");
        assert_eq!(delta.files_processed, 1);
        assert_eq!(delta.chunks_created, result.total_chunks as u64);
        assert_eq!(router.stats().files_processed, 0);
    }

    #[test]
    fn test_should_chunk_thresholds() {
        let router = ChunkingRouter::default();
        assert!(!router.should_chunk_size(50_000, None));
        assert!(router.should_chunk_size(50_001, None));
        assert!(router.should_chunk_size(11, Some(10)));
        assert!(router.exceeds_max_file_size(122_881));
        assert!(!router.exceeds_max_file_size(122_880));
    }

    #[test]
    fn test_should_chunk_file_reads_size() {
        let router = ChunkingRouter::default();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'x'; 64]).unwrap();
        file.flush().unwrap();

        assert!(router.should_chunk_file(file.path(), Some(32)));
        assert!(!router.should_chunk_file(file.path(), Some(64)));
        assert!(!router.should_chunk_file("/nonexistent/file.py", Some(0)));
    }
}
