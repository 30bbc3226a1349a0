//! Definition and reference collection over lowered sub-trees.

use std::collections::BTreeSet;

use crate::ast_engine::syntax::{NodeKind, SyntaxNode};

/// Collect every name read inside `node`.
///
/// Identifiers yield their name, attribute accesses on a plain owner yield
/// `owner.attr`, and calls yield their callee before their arguments are
/// walked. Binding positions contribute nothing.
pub fn collect_references(node: &SyntaxNode, out: &mut BTreeSet<String>) {
    match node.kind {
        NodeKind::Binding => return,
        NodeKind::Identifier | NodeKind::Attribute | NodeKind::Call => {
            if let Some(name) = &node.name {
                out.insert(name.clone());
            }
        }
        _ => {}
    }
    for child in &node.children {
        collect_references(child, out);
    }
}

/// References of several nodes.
pub fn references<'a>(nodes: impl IntoIterator<Item = &'a SyntaxNode>) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for node in nodes {
        collect_references(node, &mut out);
    }
    out
}

/// Names bound by import and assignment statements among `nodes`.
pub fn bound_names<'a>(nodes: impl IntoIterator<Item = &'a SyntaxNode>) -> BTreeSet<String> {
    nodes
        .into_iter()
        .filter(|n| matches!(n.kind, NodeKind::Import | NodeKind::Assignment))
        .flat_map(|n| n.details.bound_names.iter().cloned())
        .collect()
}

/// Names bound by import statements among `nodes`.
pub fn imported_names<'a>(nodes: impl IntoIterator<Item = &'a SyntaxNode>) -> BTreeSet<String> {
    nodes
        .into_iter()
        .filter(|n| n.kind == NodeKind::Import)
        .flat_map(|n| n.details.bound_names.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_engine::parser::AstParser;
    use crate::processing::Language;
    use pretty_assertions::assert_eq;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn python_refs(code: &str) -> BTreeSet<String> {
        let tree = AstParser::for_language(Language::Python)
            .unwrap()
            .parse(code)
            .unwrap();
        references(tree.top_level())
    }

    #[test]
    fn test_reads_calls_and_attributes() {
        let refs = python_refs("def run(items):\n    total = compute(items)\n    return Store.save(total)\n");
        assert_eq!(
            refs,
            set(&["Store", "Store.save", "compute", "items", "total"])
        );
    }

    #[test]
    fn test_bindings_are_not_references() {
        let refs = python_refs("import os\nfor name in listing:\n    value = 1\n");
        assert_eq!(refs, set(&["listing"]));
    }

    #[test]
    fn test_default_values_are_references() {
        let refs = python_refs("def f(limit=DEFAULT_LIMIT, *, key: Key = None):\n    pass\n");
        assert_eq!(refs, set(&["DEFAULT_LIMIT", "Key"]));
    }

    #[test]
    fn test_bound_and_imported_names() {
        let tree = AstParser::for_language(Language::Python)
            .unwrap()
            .parse("import json\nfrom a import b as c\nX = 1\n")
            .unwrap();
        assert_eq!(bound_names(tree.top_level()), set(&["X", "c", "json"]));
        assert_eq!(imported_names(tree.top_level()), set(&["c", "json"]));
    }
}
