//! Result of one chunking operation.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::chunk::{CodeChunk, DependencyRelation};

/// Strategy that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMethod {
    /// Syntax-tree based splitting
    Structural,
    /// Fixed line windows after a parse failure
    LineFallback,
    /// Fixed byte windows for unsupported languages or engine faults
    SizeFallback,
}

impl ProcessingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMethod::Structural => "structural",
            ProcessingMethod::LineFallback => "line_fallback",
            ProcessingMethod::SizeFallback => "size_fallback",
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, ProcessingMethod::Structural)
    }
}

impl fmt::Display for ProcessingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one chunking operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingResult {
    pub chunks: Vec<CodeChunk>,
    pub processing_method: ProcessingMethod,
    pub success: bool,
    pub total_chunks: usize,
    /// Sum of chunk sizes in bytes
    pub total_size: usize,
    /// Wall-clock duration, serialized as fractional seconds
    #[serde(with = "duration_secs")]
    pub processing_time: Duration,
    /// Edges produced by dependency analysis
    pub relations: Vec<DependencyRelation>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ChunkingResult {
    /// Create a successful result; totals are derived from `chunks`.
    pub fn new(chunks: Vec<CodeChunk>, processing_method: ProcessingMethod) -> Self {
        let total_chunks = chunks.len();
        let total_size = chunks.iter().map(|c| c.size_bytes()).sum();
        Self {
            chunks,
            processing_method,
            success: true,
            total_chunks,
            total_size,
            processing_time: Duration::ZERO,
            relations: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Create a failed result carrying an unrecoverable error.
    pub fn failed(processing_method: ProcessingMethod, error: impl Into<String>) -> Self {
        let mut result = Self::new(Vec::new(), processing_method);
        result.success = false;
        result.errors.push(error.into());
        result
    }

    pub fn with_relations(mut self, relations: Vec<DependencyRelation>) -> Self {
        self.relations = relations;
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_processing_time(mut self, elapsed: Duration) -> Self {
        self.processing_time = elapsed;
        self
    }

    /// Chunks in consumer processing order.
    pub fn ordered_chunks(&self) -> Vec<&CodeChunk> {
        processing_order(&self.chunks)
    }
}

/// Sort chunks into the deterministic order consumers emit them in:
/// module-level content first, then classes and functions by ascending start
/// line, residual content last.
pub fn processing_order(chunks: &[CodeChunk]) -> Vec<&CodeChunk> {
    let mut ordered: Vec<&CodeChunk> = chunks.iter().collect();
    ordered.sort_by(|a, b| {
        a.chunk_type
            .processing_rank()
            .cmp(&b.chunk_type.processing_rank())
            .then(a.start_line.cmp(&b.start_line))
            .then(a.id.cmp(&b.id))
    });
    ordered
}

mod duration_secs {
    use std::time::Duration;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
