//! Error types for the chunking engine.
//!
//! Errors never cross the public chunking boundary: parse failures and
//! internal faults are converted into fallback results by the chunkers and
//! the router. These types are what flows between the internal stages.

use thiserror::Error;

/// Result type for chunker operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur inside the chunking engine.
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// The source could not be parsed into a clean syntax tree.
    #[error("Parse error at line {line}, column {column}: {reason}")]
    Parse {
        line: usize,
        column: usize,
        reason: String,
    },

    /// No grammar is available for the language.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Tree-sitter refused the grammar or produced no tree.
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    /// Produced chunks violated a structural invariant.
    #[error("Invalid chunk layout: {0}")]
    InvalidLayout(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration source could not be read or deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ChunkerError {
    /// Create a parse error
    pub fn parse(line: usize, column: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            reason: reason.into(),
        }
    }

    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitter(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether this error means the input itself is unparsable, as opposed
    /// to an engine fault.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ChunkerError::parse(3, 7, "unexpected token");
        assert_eq!(
            err.to_string(),
            "Parse error at line 3, column 7: unexpected token"
        );
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_non_parse_errors() {
        assert!(!ChunkerError::unsupported_language("cobol").is_parse_failure());
        assert!(!ChunkerError::invalid_config("zero").is_parse_failure());
    }
}
