//! Enrichment of chunked output.
//!
//! This module provides:
//! - Cross-chunk dependency resolution (references, imports, method calls, inheritance)

pub mod dependency_analyzer;

pub use dependency_analyzer::DependencyAnalyzer;
