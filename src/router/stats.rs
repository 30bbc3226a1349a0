//! Aggregate processing statistics.
//!
//! Chunking itself never touches shared state: each call produces a
//! [`StatsDelta`] and the owner of the counters folds it in.

use std::ops::AddAssign;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::ChunkingResult;

/// Counter changes produced by one or more chunking calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsDelta {
    pub files_processed: u64,
    pub chunks_created: u64,
    pub fallback_count: u64,
    pub processing_time: Duration,
}

impl StatsDelta {
    /// Delta for a single processed file.
    pub fn from_result(result: &ChunkingResult) -> Self {
        Self {
            files_processed: 1,
            chunks_created: result.total_chunks as u64,
            fallback_count: u64::from(result.processing_method.is_fallback()),
            processing_time: result.processing_time,
        }
    }
}

impl AddAssign for StatsDelta {
    fn add_assign(&mut self, other: Self) {
        self.files_processed += other.files_processed;
        self.chunks_created += other.chunks_created;
        self.fallback_count += other.fallback_count;
        self.processing_time += other.processing_time;
    }
}

/// Lock-free running totals.
#[derive(Debug, Default)]
pub struct ProcessingStats {
    files_processed: AtomicU64,
    chunks_created: AtomicU64,
    fallback_count: AtomicU64,
    /// Accumulated in microseconds
    processing_micros: AtomicU64,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a delta into the totals.
    pub fn record(&self, delta: StatsDelta) {
        self.files_processed
            .fetch_add(delta.files_processed, Ordering::Relaxed);
        self.chunks_created
            .fetch_add(delta.chunks_created, Ordering::Relaxed);
        self.fallback_count
            .fetch_add(delta.fallback_count, Ordering::Relaxed);
        let micros = u64::try_from(delta.processing_time.as_micros()).unwrap_or(u64::MAX);
        self.processing_micros.fetch_add(micros, Ordering::Relaxed);
    }

    /// Point-in-time copy of the totals.
    pub fn snapshot(&self) -> StatsSnapshot {
        let files_processed = self.files_processed.load(Ordering::Relaxed);
        let total = Duration::from_micros(self.processing_micros.load(Ordering::Relaxed));

        let average_processing_time = if files_processed > 0 {
            total.as_secs_f64() / files_processed as f64
        } else {
            0.0
        };

        StatsSnapshot {
            files_processed,
            chunks_created: self.chunks_created.load(Ordering::Relaxed),
            fallback_count: self.fallback_count.load(Ordering::Relaxed),
            total_processing_time: total.as_secs_f64(),
            average_processing_time,
        }
    }
}

/// Serializable view of [`ProcessingStats`]. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub files_processed: u64,
    pub chunks_created: u64,
    pub fallback_count: u64,
    pub total_processing_time: f64,
    pub average_processing_time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProcessingMethod;

    #[test]
    fn test_delta_from_result() {
        let result = ChunkingResult::new(Vec::new(), ProcessingMethod::SizeFallback)
            .with_processing_time(Duration::from_millis(5));
        let delta = StatsDelta::from_result(&result);

        assert_eq!(delta.files_processed, 1);
        assert_eq!(delta.chunks_created, 0);
        assert_eq!(delta.fallback_count, 1);
        assert_eq!(delta.processing_time, Duration::from_millis(5));
    }

    #[test]
    fn test_record_and_snapshot() {
        let stats = ProcessingStats::new();
        assert_eq!(stats.snapshot().average_processing_time, 0.0);

        let mut delta = StatsDelta {
            files_processed: 1,
            chunks_created: 3,
            fallback_count: 0,
            processing_time: Duration::from_millis(200),
        };
        delta += StatsDelta {
            files_processed: 1,
            chunks_created: 1,
            fallback_count: 1,
            processing_time: Duration::from_millis(600),
        };
        stats.record(delta);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.files_processed, 2);
        assert_eq!(snapshot.chunks_created, 4);
        assert_eq!(snapshot.fallback_count, 1);
        assert!((snapshot.total_processing_time - 0.8).abs() < 1e-9);
        assert!((snapshot.average_processing_time - 0.4).abs() < 1e-9);
    }
}
