//! Language-agnostic syntax tree.
//!
//! Grammar adapters lower tree-sitter trees into these nodes so the
//! splitting passes never look at grammar-specific node kinds.

use crate::processing::Language;

/// Role of a node, independent of the grammar it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Root of the file
    Module,
    Import,
    /// Top-level simple assignment or declaration
    Assignment,
    /// Documentation string or leading doc comment
    DocString,
    Class,
    Function,
    Decorator,
    /// A name being read
    Identifier,
    /// A name being bound (assignment target, parameter, import alias)
    Binding,
    /// `owner.attr` access
    Attribute,
    Call,
    Comment,
    /// Body of a class or function
    Block,
    Other,
}

impl NodeKind {
    /// Whether nodes of this kind can become their own chunk.
    pub fn is_definition(&self) -> bool {
        matches!(self, NodeKind::Class | NodeKind::Function)
    }
}

/// Byte and line extent of a node. Lines are 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub end_line: usize,
}

/// Facts an adapter extracts for specific node kinds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDetails {
    /// Base classes of a class
    pub bases: Vec<String>,
    /// Names bound by an import or assignment
    pub bound_names: Vec<String>,
    /// Parameter count of a function
    pub parameter_count: Option<usize>,
    pub is_async: bool,
    /// Decorator expressions, without the leading `@`
    pub decorators: Vec<String>,
}

/// One node of the lowered tree. Only named grammar nodes are kept.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    /// Grammar node kind this was lowered from
    pub grammar_kind: &'static str,
    /// Declared name for classes and functions, text for identifiers,
    /// `owner.attr` for attributes, callee for calls
    pub name: Option<String>,
    pub span: Span,
    pub children: Vec<SyntaxNode>,
    pub details: NodeDetails,
}

impl SyntaxNode {
    /// The body block of a class or function.
    pub fn body(&self) -> Option<&SyntaxNode> {
        self.children.iter().find(|c| c.kind == NodeKind::Block)
    }

    /// Classes and functions declared directly in this node's body.
    pub fn members(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.body()
            .into_iter()
            .flat_map(|body| body.children.iter())
            .filter(|c| c.kind.is_definition())
    }

    /// Depth-first pre-order traversal.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Iterator returned by [`SyntaxNode::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A successfully parsed file.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    pub language: Language,
    pub root: SyntaxNode,
    /// Total line count of the source
    pub line_count: usize,
}

impl SyntaxTree {
    /// Top-level statements of the file.
    pub fn top_level(&self) -> &[SyntaxNode] {
        &self.root.children
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn node(kind: NodeKind, name: Option<&str>, lines: (usize, usize)) -> SyntaxNode {
        SyntaxNode {
            kind,
            grammar_kind: "test",
            name: name.map(String::from),
            span: Span {
                start_byte: 0,
                end_byte: 0,
                start_line: lines.0,
                end_line: lines.1,
            },
            children: Vec::new(),
            details: NodeDetails::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::node;
    use super::*;

    #[test]
    fn test_members_come_from_body() {
        let mut body = node(NodeKind::Block, None, (2, 9));
        body.children = vec![
            node(NodeKind::Other, None, (2, 2)),
            node(NodeKind::Function, Some("a"), (3, 5)),
            node(NodeKind::Class, Some("Inner"), (6, 9)),
        ];
        let mut class = node(NodeKind::Class, Some("Outer"), (1, 9));
        class.children = vec![node(NodeKind::Identifier, Some("Base"), (1, 1)), body];

        let names: Vec<_> = class.members().filter_map(|m| m.name.as_deref()).collect();
        assert_eq!(names, vec!["a", "Inner"]);
    }

    #[test]
    fn test_walk_is_preorder() {
        let mut call = node(NodeKind::Call, Some("f"), (1, 1));
        call.children = vec![node(NodeKind::Identifier, Some("f"), (1, 1))];
        let mut root = node(NodeKind::Module, None, (1, 2));
        root.children = vec![call, node(NodeKind::Identifier, Some("x"), (2, 2))];

        let kinds: Vec<_> = root.walk().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Module, NodeKind::Call, NodeKind::Identifier, NodeKind::Identifier]
        );
    }
}
