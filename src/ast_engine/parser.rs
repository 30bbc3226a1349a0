//! Tree-sitter based AST parser.
//!
//! Parses source with the grammar of one adapter and lowers the concrete
//! tree into a [`SyntaxTree`]. Any error or missing node fails the parse so
//! callers can route to a fallback instead of splitting a broken tree.

use std::sync::Arc;

use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::ast_engine::languages::{adapter_for, node_text, GrammarAdapter};
use crate::ast_engine::syntax::{NodeKind, Span, SyntaxNode, SyntaxTree};
use crate::error::{ChunkerError, Result};
use crate::processing::{Language, SourceLines};

/// Tree-sitter based AST parser for a single language.
#[derive(Clone)]
pub struct AstParser {
    adapter: Arc<dyn GrammarAdapter>,
}

impl std::fmt::Debug for AstParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AstParser")
            .field("language", &self.adapter.language())
            .finish()
    }
}

impl AstParser {
    /// Create a parser for the given language.
    pub fn for_language(language: Language) -> Result<Self> {
        let adapter =
            adapter_for(language).ok_or_else(|| ChunkerError::unsupported_language(language.as_str()))?;
        debug!(language = %language, "Loaded tree-sitter grammar");
        Ok(Self { adapter })
    }

    pub fn language(&self) -> Language {
        self.adapter.language()
    }

    /// Parse source code into a language-agnostic tree.
    pub fn parse(&self, content: &str) -> Result<SyntaxTree> {
        // We need to create a new parser since Parser is not thread-safe
        let mut parser = Parser::new();
        parser
            .set_language(&self.adapter.grammar())
            .map_err(|e| ChunkerError::tree_sitter(e.to_string()))?;

        let tree = parser
            .parse(content.as_bytes(), None)
            .ok_or_else(|| ChunkerError::tree_sitter("Failed to parse content"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(describe_error(root));
        }

        let line_count = SourceLines::new(content).len();
        let lowering = Lowering {
            adapter: self.adapter.as_ref(),
            source: content,
            line_count,
        };

        Ok(SyntaxTree {
            language: self.adapter.language(),
            root: lowering.lower(root, false),
            line_count,
        })
    }
}

/// Build a parse error from the first error or missing node.
fn describe_error(root: Node<'_>) -> ChunkerError {
    match first_error(root) {
        Some(node) => {
            let pos = node.start_position();
            let reason = if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "unexpected syntax".to_string()
            };
            ChunkerError::parse(pos.row + 1, pos.column, reason)
        }
        None => ChunkerError::parse(1, 0, "syntax error"),
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            if let Some(found) = first_error(child) {
                return Some(found);
            }
        }
    }
    None
}

/// Lowers tree-sitter nodes through a grammar adapter.
struct Lowering<'a> {
    adapter: &'a dyn GrammarAdapter,
    source: &'a str,
    line_count: usize,
}

impl Lowering<'_> {
    fn lower(&self, node: Node<'_>, binding: bool) -> SyntaxNode {
        if let Some(inner) = self.adapter.unwrap(node) {
            return self.lower_wrapper(node, inner, binding);
        }

        let role = self.adapter.classify(node, self.source);
        let name = match role {
            NodeKind::Decorator => Some(
                node_text(node, self.source)
                    .trim_start_matches('@')
                    .trim()
                    .to_string(),
            ),
            _ => self.adapter.name(node, role, self.source),
        };
        let kind = match role {
            NodeKind::Identifier | NodeKind::Attribute if binding => NodeKind::Binding,
            _ => role,
        };

        let mut children = Vec::new();
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                let child = cursor.node();
                let field = cursor.field_name();
                if child.is_named() && !self.adapter.skips_field(role, field) {
                    let child_binding = self
                        .adapter
                        .binding_context(node.kind(), field)
                        .unwrap_or(binding);
                    children.push(self.lower(child, child_binding));
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }

        let mut details = self.adapter.details(node, role, self.source);
        details.decorators = decorator_names(&children);

        SyntaxNode {
            kind,
            grammar_kind: node.kind(),
            name,
            span: self.span(node),
            children,
            details,
        }
    }

    /// Lower a decorated definition or export to its inner declaration,
    /// keeping the wrapper's extent and decorators.
    fn lower_wrapper(&self, wrapper: Node<'_>, inner: Node<'_>, binding: bool) -> SyntaxNode {
        let mut lowered = self.lower(inner, binding);

        let mut decorators = Vec::new();
        let mut cursor = wrapper.walk();
        for child in wrapper.named_children(&mut cursor) {
            if self.adapter.classify(child, self.source) == NodeKind::Decorator {
                decorators.push(self.lower(child, false));
            }
        }

        decorators.append(&mut lowered.children);
        lowered.children = decorators;
        lowered.details.decorators = decorator_names(&lowered.children);
        lowered.span = self.span(wrapper);
        lowered
    }

    fn span(&self, node: Node<'_>) -> Span {
        let start = node.start_position();
        let end = node.end_position();
        let last_line = self.line_count.max(1);

        let start_line = (start.row + 1).min(last_line);
        let mut end_line = end.row + 1;
        // A node ending at column 0 stops before that line begins
        if end.column == 0 && end.row > start.row {
            end_line -= 1;
        }
        let end_line = end_line.min(last_line).max(start_line);

        Span {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line,
            end_line,
        }
    }
}

fn decorator_names(children: &[SyntaxNode]) -> Vec<String> {
    children
        .iter()
        .filter(|c| c.kind == NodeKind::Decorator)
        .filter_map(|c| c.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_python(code: &str) -> SyntaxTree {
        AstParser::for_language(Language::Python)
            .unwrap()
            .parse(code)
            .unwrap()
    }

    fn find<'a>(tree: &'a SyntaxTree, kind: NodeKind, name: &str) -> &'a SyntaxNode {
        tree.root
            .walk()
            .find(|n| n.kind == kind && n.name.as_deref() == Some(name))
            .unwrap_or_else(|| panic!("no {:?} named {}", kind, name))
    }

    #[test]
    fn test_parse_python() {
        let code = r#"
def hello(name: str) -> str:
    """Say hello."""
    return f"Hello, {name}!"

class Greeter:
    def greet(self, name: str) -> str:
        return hello(name)
"#;
        let tree = parse_python(code);

        let kinds: Vec<_> = tree.top_level().iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NodeKind::Function, NodeKind::Class]);

        let hello = find(&tree, NodeKind::Function, "hello");
        assert_eq!((hello.span.start_line, hello.span.end_line), (2, 4));
        assert_eq!(hello.details.parameter_count, Some(1));

        let greeter = find(&tree, NodeKind::Class, "Greeter");
        let members: Vec<_> = greeter.members().filter_map(|m| m.name.as_deref()).collect();
        assert_eq!(members, vec!["greet"]);
    }

    #[test]
    fn test_module_level_roles() {
        let code = "\"\"\"Module docs.\"\"\"\nimport os.path\nfrom typing import List as L, Dict\nLIMIT, other = 10, 20\nprint(LIMIT)\n";
        let tree = parse_python(code);

        let top = tree.top_level();
        assert_eq!(top[0].kind, NodeKind::DocString);
        assert_eq!(top[1].kind, NodeKind::Import);
        assert_eq!(top[1].details.bound_names, vec!["os"]);
        assert_eq!(top[2].details.bound_names, vec!["L", "Dict"]);
        assert_eq!(top[3].kind, NodeKind::Assignment);
        assert_eq!(top[3].details.bound_names, vec!["LIMIT", "other"]);
        assert_eq!(top[4].kind, NodeKind::Other);
    }

    #[test]
    fn test_decorated_definition_is_unwrapped() {
        let code = "@app.route(\"/\")\n@cached\nasync def index(request, *args):\n    return render(request)\n";
        let tree = parse_python(code);

        let func = &tree.top_level()[0];
        assert_eq!(func.kind, NodeKind::Function);
        assert_eq!(func.name.as_deref(), Some("index"));
        assert_eq!((func.span.start_line, func.span.end_line), (1, 4));
        assert_eq!(func.details.decorators, vec!["app.route(\"/\")", "cached"]);
        assert!(func.details.is_async);
        assert_eq!(func.details.parameter_count, Some(2));
    }

    #[test]
    fn test_class_bases_and_bindings() {
        let code = "class B(A, mixins.Loggable, metaclass=Meta):\n    x = helper.value\n";
        let tree = parse_python(code);

        let class = &tree.top_level()[0];
        assert_eq!(class.details.bases, vec!["A", "mixins.Loggable"]);

        // The class name is bound, not read
        assert!(class
            .walk()
            .any(|n| n.kind == NodeKind::Binding && n.name.as_deref() == Some("x")));
        assert!(class
            .walk()
            .any(|n| n.kind == NodeKind::Attribute && n.name.as_deref() == Some("helper.value")));
        assert!(!class
            .walk()
            .any(|n| n.kind == NodeKind::Identifier && n.name.as_deref() == Some("B")));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let parser = AstParser::for_language(Language::Python).unwrap();
        let err = parser.parse("def broken(:\n    pass\n").unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_parse_javascript() {
        let code = "import React, { useState as useS } from 'react';\n\nexport class View extends Base {\n  render() {\n    return this.draw(useS(0));\n  }\n}\n";
        let parser = AstParser::for_language(Language::JavaScript).unwrap();
        let tree = parser.parse(code).unwrap();

        let top = tree.top_level();
        assert_eq!(top[0].kind, NodeKind::Import);
        assert_eq!(top[0].details.bound_names, vec!["React", "useS"]);

        let class = &top[1];
        assert_eq!(class.kind, NodeKind::Class);
        assert_eq!(class.name.as_deref(), Some("View"));
        assert_eq!(class.details.bases, vec!["Base"]);
        assert_eq!((class.span.start_line, class.span.end_line), (3, 7));

        let render = class.members().next().unwrap();
        assert_eq!(render.name.as_deref(), Some("render"));
        assert!(render
            .walk()
            .any(|n| n.kind == NodeKind::Call && n.name.as_deref() == Some("this.draw")));
    }

    #[test]
    fn test_parse_typescript() {
        let code = "interface Shape { area(): number }\nabstract class Square implements Shape {\n  area(): number { return 1; }\n}\n";
        let parser = AstParser::for_language(Language::TypeScript).unwrap();
        let tree = parser.parse(code).unwrap();

        let top = tree.top_level();
        assert_eq!(top[0].kind, NodeKind::Assignment);
        assert_eq!(top[0].details.bound_names, vec!["Shape"]);
        assert_eq!(top[1].kind, NodeKind::Class);
        assert_eq!(top[1].details.bases, vec!["Shape"]);
    }

    #[test]
    fn test_unsupported_language() {
        let result = AstParser::for_language(Language::Go);
        assert!(matches!(result, Err(ChunkerError::UnsupportedLanguage(_))));
    }
}
