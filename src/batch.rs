//! Batch processing across many files.
//!
//! Files are chunked on the blocking pool, `concurrency` at a time. Each
//! call hands its [`StatsDelta`] to a single aggregator task, which folds
//! them and records the total in the router once the batch is done.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::router::{ChunkingRouter, StatsDelta};
use crate::types::{ChunkingResult, SourceFile};

/// Outcome for one file of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub file_path: String,
    pub result: ChunkingResult,
}

/// Result of batch processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_files: usize,
    pub total_chunks: usize,
    /// Files that ended up in a fallback chunker
    pub fallback_files: usize,
    /// Per-file results, in input order
    pub files: Vec<FileReport>,
}

/// Batch processor for chunking many files concurrently.
pub struct BatchProcessor {
    router: Arc<ChunkingRouter>,
    concurrency: usize,
}

impl BatchProcessor {
    /// Create a new batch processor.
    pub fn new(router: Arc<ChunkingRouter>, concurrency: usize) -> Self {
        Self {
            router,
            concurrency: concurrency.max(1),
        }
    }

    /// Create a batch processor using the router's configured concurrency.
    pub fn from_router(router: Arc<ChunkingRouter>) -> Self {
        let concurrency = router.config().batch_concurrency;
        Self::new(router, concurrency)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Chunk every file and fold the statistics into the router.
    pub async fn process_files(&self, files: Vec<SourceFile>) -> Result<BatchReport> {
        let started_at = Utc::now();
        let total_files = files.len();
        info!(total_files, concurrency = self.concurrency, "Starting batch processing");

        let (sender, mut receiver) = mpsc::channel::<StatsDelta>(self.concurrency * 2);
        let router = Arc::clone(&self.router);
        let aggregator = tokio::spawn(async move {
            let mut total = StatsDelta::default();
            while let Some(delta) = receiver.recv().await {
                total += delta;
            }
            router.record(total);
            total
        });

        let mut reports = Vec::with_capacity(total_files);
        for batch in files.chunks(self.concurrency) {
            let handles: Vec<_> = batch
                .iter()
                .cloned()
                .map(|file| {
                    let router = Arc::clone(&self.router);
                    let sender = sender.clone();
                    tokio::task::spawn_blocking(move || {
                        let (result, delta) = router.chunk_file(&file.file_path, &file.content);
                        if sender.blocking_send(delta).is_err() {
                            warn!(file_path = %file.file_path, "Stats aggregator gone, delta dropped");
                        }
                        FileReport {
                            file_path: file.file_path,
                            result,
                        }
                    })
                })
                .collect();

            for outcome in join_all(handles).await {
                reports.push(outcome.context("chunking task failed")?);
            }
        }

        drop(sender);
        let totals = aggregator.await.context("stats aggregator failed")?;

        let report = BatchReport {
            started_at,
            finished_at: Utc::now(),
            total_files,
            total_chunks: totals.chunks_created as usize,
            fallback_files: totals.fallback_count as usize,
            files: reports,
        };

        info!(
            files = report.total_files,
            chunks = report.total_chunks,
            fallbacks = report.fallback_files,
            "Batch processing complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkingConfig, ProcessingMethod};

    fn processor(concurrency: usize) -> BatchProcessor {
        BatchProcessor::new(Arc::new(ChunkingRouter::default()), concurrency)
    }

    fn files() -> Vec<SourceFile> {
        vec![
            SourceFile::new("a.py", "def a():\n    return 1\n"),
            SourceFile::new("b.js", "function b() {\n  return 2;\n}\n"),
            SourceFile::new("c.xyz", "opaque\n"),
            SourceFile::new("d.py", "def broken(:\n    pass\n"),
        ]
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let report = processor(3).process_files(files()).await.unwrap();

        let paths: Vec<_> = report.files.iter().map(|f| f.file_path.as_str()).collect();
        assert_eq!(paths, vec!["a.py", "b.js", "c.xyz", "d.py"]);
        assert_eq!(report.total_files, 4);
        assert!(report.finished_at >= report.started_at);

        let methods: Vec<_> = report
            .files
            .iter()
            .map(|f| f.result.processing_method)
            .collect();
        assert_eq!(
            methods,
            vec![
                ProcessingMethod::Structural,
                ProcessingMethod::Structural,
                ProcessingMethod::SizeFallback,
                ProcessingMethod::LineFallback,
            ]
        );
        assert_eq!(report.fallback_files, 2);
    }

    #[tokio::test]
    async fn test_stats_are_folded_into_router() {
        let router = Arc::new(ChunkingRouter::new(&ChunkingConfig::default()));
        let processor = BatchProcessor::from_router(Arc::clone(&router));
        let report = processor.process_files(files()).await.unwrap();

        let stats = router.stats();
        assert_eq!(stats.files_processed, 4);
        assert_eq!(stats.chunks_created as usize, report.total_chunks);
        let chunk_sum: usize = report.files.iter().map(|f| f.result.total_chunks).sum();
        assert_eq!(chunk_sum, report.total_chunks);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = processor(2).process_files(Vec::new()).await.unwrap();
        assert_eq!(report.total_files, 0);
        assert_eq!(report.total_chunks, 0);
        assert!(report.files.is_empty());
    }

    #[test]
    fn test_concurrency_floor() {
        assert_eq!(processor(0).concurrency(), 1);
    }
}
