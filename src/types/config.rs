//! Configuration types for chunking.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ChunkerError, Result};
use crate::{
    DEFAULT_FALLBACK_WINDOW_BYTES, DEFAULT_LARGE_FILE_THRESHOLD, DEFAULT_MAX_CHUNK_SIZE,
    DEFAULT_MAX_FILE_SIZE, DEFAULT_MIN_CHUNK_SIZE, DEFAULT_MODULE_SCAN_LINES,
};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "CHUNKER";

/// Environment variable naming an optional configuration file.
pub const CONFIG_FILE_ENV: &str = "CHUNKER_CONFIG";

/// Thresholds and tuning knobs for the chunking engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum class span (bytes) emitted as a single chunk
    pub max_chunk_size: usize,

    /// Floor for fallback window sizes (bytes)
    pub min_chunk_size: usize,

    /// Files larger than this (bytes) are worth chunking at all
    pub large_file_threshold: u64,

    /// Upper bound callers apply before reading a file directly
    pub max_file_size: u64,

    /// Imports/assignments starting within this many lines count as module setup
    pub module_scan_lines: usize,

    /// Window size of the size-based fallback (bytes)
    pub fallback_window_bytes: usize,

    /// Line-based fallback window is `max_chunk_size / line_window_divisor` lines
    pub line_window_divisor: usize,

    /// Files chunked concurrently by the batch processor
    pub batch_concurrency: usize,

    /// Deadline applied by the HTTP layer
    pub request_timeout_secs: u64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            module_scan_lines: DEFAULT_MODULE_SCAN_LINES,
            fallback_window_bytes: DEFAULT_FALLBACK_WINDOW_BYTES,
            line_window_divisor: 50,
            batch_concurrency: 4,
            request_timeout_secs: 30,
        }
    }
}

impl ChunkingConfig {
    /// Load configuration: defaults, then an optional file, then
    /// `CHUNKER_*` environment variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the environment, honouring `CHUNKER_CONFIG`
    /// as an optional file path. Falls back to defaults on error.
    pub fn from_env() -> Self {
        let file = std::env::var(CONFIG_FILE_ENV).ok();
        match Self::load(file.as_deref().map(Path::new)) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Invalid chunking configuration, using defaults");
                Self::default()
            }
        }
    }

    /// Check the thresholds are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(ChunkerError::invalid_config("max_chunk_size must be positive"));
        }
        if self.min_chunk_size > self.max_chunk_size {
            return Err(ChunkerError::invalid_config(format!(
                "min_chunk_size ({}) exceeds max_chunk_size ({})",
                self.min_chunk_size, self.max_chunk_size
            )));
        }
        if self.fallback_window_bytes == 0 {
            return Err(ChunkerError::invalid_config("fallback_window_bytes must be positive"));
        }
        if self.line_window_divisor == 0 {
            return Err(ChunkerError::invalid_config("line_window_divisor must be positive"));
        }
        if self.batch_concurrency == 0 {
            return Err(ChunkerError::invalid_config("batch_concurrency must be positive"));
        }
        Ok(())
    }

    /// Set the maximum chunk size.
    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size;
        self
    }

    /// Set the size-based fallback window.
    pub fn with_fallback_window(mut self, bytes: usize) -> Self {
        self.fallback_window_bytes = bytes;
        self
    }

    /// Lines per window for the line-based fallback.
    pub fn line_window(&self) -> usize {
        (self.max_chunk_size / self.line_window_divisor.max(1)).max(1)
    }

    /// Bytes per window for the size-based fallback.
    pub fn size_window(&self) -> usize {
        self.fallback_window_bytes.max(self.min_chunk_size).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ChunkingConfig::default();
        assert_eq!(config.max_chunk_size, 2000);
        assert_eq!(config.min_chunk_size, 100);
        assert_eq!(config.large_file_threshold, 50_000);
        assert_eq!(config.max_file_size, 122_880);
        assert_eq!(config.line_window(), 40);
        assert_eq!(config.size_window(), 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_sizes() {
        let config = ChunkingConfig {
            min_chunk_size: 5000,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ChunkerError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = ChunkingConfig::default().with_fallback_window(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_size_window_respects_min_chunk_size() {
        let config = ChunkingConfig::default().with_fallback_window(10);
        assert_eq!(config.size_window(), 100);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "max_chunk_size = 4000").unwrap();
        writeln!(file, "module_scan_lines = 80").unwrap();

        let config = ChunkingConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_chunk_size, 4000);
        assert_eq!(config.module_scan_lines, 80);
        // Untouched keys keep their defaults
        assert_eq!(config.min_chunk_size, 100);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "max_chunk_size = 50").unwrap();

        assert!(ChunkingConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = ChunkingConfig::load(Some(Path::new("/nonexistent/chunker.toml")));
        assert!(matches!(result, Err(ChunkerError::Config(_))));
    }
}
