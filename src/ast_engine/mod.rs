//! AST Engine module for code parsing and symbol collection.
//!
//! This module provides:
//! - Tree-sitter based parsing for the structurally supported languages
//! - Per-grammar adapters lowering concrete trees to a shared node model
//! - Definition and reference collection for dependency analysis

pub mod languages;
pub mod parser;
pub mod symbols;
pub mod syntax;

pub use languages::{adapter_for, EcmaAdapter, GrammarAdapter, PythonAdapter};
pub use parser::AstParser;
pub use syntax::{NodeDetails, NodeKind, Span, SyntaxNode, SyntaxTree};
