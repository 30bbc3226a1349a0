//! Processing module for source preparation.
//!
//! This module provides:
//! - Language detection from file extensions
//! - Line indexing over borrowed source text

pub mod language;
pub mod lines;

pub use language::{detect_language, Language};
pub use lines::SourceLines;
