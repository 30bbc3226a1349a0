//! Grammar adapters for structural chunking.
//!
//! Each adapter maps tree-sitter node types to [`NodeKind`] roles and knows
//! where its grammar puts names, bases, parameters and binding positions.

use std::collections::HashMap;
use std::sync::Arc;

use tree_sitter::Node;

use crate::ast_engine::syntax::{NodeDetails, NodeKind};
use crate::processing::Language;

/// Lowers one tree-sitter grammar into language-agnostic roles.
pub trait GrammarAdapter: Send + Sync {
    /// Language this adapter handles.
    fn language(&self) -> Language;

    /// The tree-sitter grammar.
    fn grammar(&self) -> tree_sitter::Language;

    /// Static node type mappings.
    fn node_kinds(&self) -> &HashMap<&'static str, NodeKind>;

    /// Role of a node. Defaults to the static table; adapters override for
    /// node types whose role depends on their children.
    fn classify(&self, node: Node<'_>, source: &str) -> NodeKind {
        let _ = source;
        self.node_kinds()
            .get(node.kind())
            .copied()
            .unwrap_or(NodeKind::Other)
    }

    /// Whether a child under `field` of a `parent` node is in binding
    /// position. `None` inherits the parent's context.
    fn binding_context(&self, parent: &str, field: Option<&str>) -> Option<bool>;

    /// Inner declaration of a wrapper node (decorated definition, export).
    fn unwrap<'t>(&self, node: Node<'t>) -> Option<Node<'t>>;

    /// Whether a child under `field` is dropped from a node of `kind`.
    fn skips_field(&self, kind: NodeKind, field: Option<&str>) -> bool;

    /// Name of a class, function, identifier, attribute or call.
    fn name(&self, node: Node<'_>, kind: NodeKind, source: &str) -> Option<String>;

    /// Kind-specific facts.
    fn details(&self, node: Node<'_>, kind: NodeKind, source: &str) -> NodeDetails;
}

/// Get the grammar adapter for a language.
pub fn adapter_for(language: Language) -> Option<Arc<dyn GrammarAdapter>> {
    match language {
        Language::Python => Some(Arc::new(PythonAdapter::new())),
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            Some(Arc::new(EcmaAdapter::new(language)))
        }
        _ => None,
    }
}

/// Get the node type mappings for a language.
pub fn get_node_kinds(language: Language) -> HashMap<&'static str, NodeKind> {
    match language {
        Language::Python => python_node_kinds(),
        Language::JavaScript => javascript_node_kinds(),
        Language::TypeScript | Language::Tsx => typescript_node_kinds(),
        _ => HashMap::new(),
    }
}

/// Python node type mappings.
fn python_node_kinds() -> HashMap<&'static str, NodeKind> {
    [
        ("module", NodeKind::Module),
        ("import_statement", NodeKind::Import),
        ("import_from_statement", NodeKind::Import),
        ("future_import_statement", NodeKind::Import),
        ("class_definition", NodeKind::Class),
        ("function_definition", NodeKind::Function),
        ("decorator", NodeKind::Decorator),
        ("identifier", NodeKind::Identifier),
        ("attribute", NodeKind::Attribute),
        ("call", NodeKind::Call),
        ("comment", NodeKind::Comment),
        ("block", NodeKind::Block),
    ]
    .into_iter()
    .collect()
}

/// JavaScript node type mappings.
fn javascript_node_kinds() -> HashMap<&'static str, NodeKind> {
    [
        ("program", NodeKind::Module),
        ("import_statement", NodeKind::Import),
        ("lexical_declaration", NodeKind::Assignment),
        ("variable_declaration", NodeKind::Assignment),
        ("class_declaration", NodeKind::Class),
        ("function_declaration", NodeKind::Function),
        ("generator_function_declaration", NodeKind::Function),
        ("method_definition", NodeKind::Function),
        ("decorator", NodeKind::Decorator),
        ("identifier", NodeKind::Identifier),
        ("shorthand_property_identifier", NodeKind::Identifier),
        ("shorthand_property_identifier_pattern", NodeKind::Identifier),
        ("member_expression", NodeKind::Attribute),
        ("call_expression", NodeKind::Call),
        ("new_expression", NodeKind::Call),
        ("comment", NodeKind::Comment),
        ("class_body", NodeKind::Block),
        ("statement_block", NodeKind::Block),
    ]
    .into_iter()
    .collect()
}

/// TypeScript node type mappings (extends JavaScript).
fn typescript_node_kinds() -> HashMap<&'static str, NodeKind> {
    let mut kinds = javascript_node_kinds();
    kinds.extend([
        ("abstract_class_declaration", NodeKind::Class),
        ("interface_declaration", NodeKind::Assignment),
        ("type_alias_declaration", NodeKind::Assignment),
        ("enum_declaration", NodeKind::Assignment),
        ("type_identifier", NodeKind::Identifier),
    ]);
    kinds
}

/// Source text of a node.
pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

fn field_text(node: Node<'_>, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|child| node_text(child, source).to_string())
}

fn single_named_child(node: Node<'_>) -> Option<Node<'_>> {
    if node.named_child_count() == 1 {
        node.named_child(0)
    } else {
        None
    }
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == token);
    found
}

fn count_parameters(params: Option<Node<'_>>) -> Option<usize> {
    let params = params?;
    let mut cursor = params.walk();
    let count = params
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .count();
    Some(count)
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !name.is_empty() && !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

/// `owner.attr` when the owner is a plain name.
fn dotted_name(
    node: Node<'_>,
    object_field: &str,
    member_field: &str,
    plain_owners: &[&str],
    source: &str,
) -> Option<String> {
    let object = node.child_by_field_name(object_field)?;
    let member = node.child_by_field_name(member_field)?;
    if !plain_owners.contains(&object.kind()) {
        return None;
    }
    Some(format!(
        "{}.{}",
        node_text(object, source),
        node_text(member, source)
    ))
}

// ============================================================================
// Python
// ============================================================================

/// Adapter for tree-sitter-python.
pub struct PythonAdapter {
    kinds: HashMap<&'static str, NodeKind>,
}

impl PythonAdapter {
    pub fn new() -> Self {
        Self {
            kinds: python_node_kinds(),
        }
    }

    fn import_names(node: Node<'_>, source: &str) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = node.walk();
        for child in node.children_by_field_name("name", &mut cursor) {
            match child.kind() {
                "aliased_import" => {
                    if let Some(alias) = field_text(child, "alias", source) {
                        push_unique(&mut names, &alias);
                    }
                }
                "dotted_name" if node.kind() == "import_statement" => {
                    // `import a.b` binds `a`
                    if let Some(head) = child.named_child(0) {
                        push_unique(&mut names, node_text(head, source));
                    }
                }
                _ => push_unique(&mut names, node_text(child, source)),
            }
        }
        names
    }

    fn assignment_targets(node: Node<'_>, source: &str, out: &mut Vec<String>) {
        if let Some(left) = node.child_by_field_name("left") {
            Self::pattern_names(left, source, out);
        }
        if let Some(right) = node.child_by_field_name("right") {
            if right.kind() == "assignment" {
                Self::assignment_targets(right, source, out);
            }
        }
    }

    fn pattern_names(node: Node<'_>, source: &str, out: &mut Vec<String>) {
        match node.kind() {
            "identifier" => push_unique(out, node_text(node, source)),
            "pattern_list" | "tuple_pattern" | "list_pattern" | "list_splat_pattern"
            | "parenthesized_expression" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    Self::pattern_names(child, source, out);
                }
            }
            _ => {}
        }
    }
}

impl Default for PythonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarAdapter for PythonAdapter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_python::language()
    }

    fn node_kinds(&self) -> &HashMap<&'static str, NodeKind> {
        &self.kinds
    }

    fn classify(&self, node: Node<'_>, _source: &str) -> NodeKind {
        match node.kind() {
            "expression_statement" => match single_named_child(node).map(|c| c.kind()) {
                Some("assignment") => NodeKind::Assignment,
                Some("string") | Some("concatenated_string") => NodeKind::DocString,
                _ => NodeKind::Other,
            },
            kind => self.kinds.get(kind).copied().unwrap_or(NodeKind::Other),
        }
    }

    fn binding_context(&self, parent: &str, field: Option<&str>) -> Option<bool> {
        match (parent, field) {
            (
                "assignment" | "augmented_assignment" | "for_statement" | "for_in_clause",
                Some("left"),
            ) => Some(true),
            ("as_pattern", Some("alias")) => Some(true),
            (_, Some("name" | "parameters")) => Some(true),
            (
                _,
                Some(
                    "value" | "default" | "type" | "right" | "superclasses" | "body"
                    | "return_type" | "arguments" | "subscript" | "function" | "object"
                    | "condition",
                ),
            ) => Some(false),
            (
                "import_statement" | "import_from_statement" | "future_import_statement"
                | "global_statement" | "nonlocal_statement",
                _,
            ) => Some(true),
            _ => None,
        }
    }

    fn unwrap<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        match node.kind() {
            "decorated_definition" => node.child_by_field_name("definition"),
            _ => None,
        }
    }

    fn skips_field(&self, kind: NodeKind, field: Option<&str>) -> bool {
        matches!(kind, NodeKind::Attribute) && field == Some("attribute")
    }

    fn name(&self, node: Node<'_>, kind: NodeKind, source: &str) -> Option<String> {
        match kind {
            NodeKind::Class | NodeKind::Function => field_text(node, "name", source),
            NodeKind::Identifier => Some(node_text(node, source).to_string()),
            NodeKind::Attribute => dotted_name(node, "object", "attribute", &["identifier"], source),
            NodeKind::Call => {
                let callee = node.child_by_field_name("function")?;
                match callee.kind() {
                    "identifier" => Some(node_text(callee, source).to_string()),
                    "attribute" => {
                        dotted_name(callee, "object", "attribute", &["identifier"], source)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn details(&self, node: Node<'_>, kind: NodeKind, source: &str) -> NodeDetails {
        let mut details = NodeDetails::default();
        match kind {
            NodeKind::Class => {
                if let Some(supers) = node.child_by_field_name("superclasses") {
                    let mut cursor = supers.walk();
                    for base in supers.named_children(&mut cursor) {
                        if matches!(base.kind(), "identifier" | "attribute") {
                            push_unique(&mut details.bases, node_text(base, source));
                        }
                    }
                }
            }
            NodeKind::Function => {
                details.parameter_count = count_parameters(node.child_by_field_name("parameters"));
                details.is_async = has_token(node, "async");
            }
            NodeKind::Import => {
                details.bound_names = Self::import_names(node, source);
            }
            NodeKind::Assignment => {
                if let Some(assignment) = single_named_child(node) {
                    Self::assignment_targets(assignment, source, &mut details.bound_names);
                }
            }
            _ => {}
        }
        details
    }
}

// ============================================================================
// JavaScript / TypeScript
// ============================================================================

/// Adapter for tree-sitter-javascript and tree-sitter-typescript.
pub struct EcmaAdapter {
    language: Language,
    kinds: HashMap<&'static str, NodeKind>,
}

impl EcmaAdapter {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            kinds: get_node_kinds(language),
        }
    }

    fn import_names(node: Node<'_>, source: &str, out: &mut Vec<String>) {
        match node.kind() {
            "identifier" => push_unique(out, node_text(node, source)),
            "import_specifier" => {
                let bound = node
                    .child_by_field_name("alias")
                    .or_else(|| node.child_by_field_name("name"));
                if let Some(bound) = bound {
                    push_unique(out, node_text(bound, source));
                }
            }
            "string" => {}
            _ => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    Self::import_names(child, source, out);
                }
            }
        }
    }

    fn pattern_names(node: Node<'_>, source: &str, out: &mut Vec<String>) {
        match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                push_unique(out, node_text(node, source))
            }
            "pair_pattern" => {
                if let Some(value) = node.child_by_field_name("value") {
                    Self::pattern_names(value, source, out);
                }
            }
            "assignment_pattern" => {
                if let Some(left) = node.child_by_field_name("left") {
                    Self::pattern_names(left, source, out);
                }
            }
            "object_pattern" | "array_pattern" | "rest_pattern" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    Self::pattern_names(child, source, out);
                }
            }
            _ => {}
        }
    }

    fn heritage_names(node: Node<'_>, source: &str, out: &mut Vec<String>) {
        match node.kind() {
            "identifier" | "type_identifier" | "member_expression" | "nested_type_identifier" => {
                push_unique(out, node_text(node, source))
            }
            "type_arguments" | "arguments" => {}
            _ => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    Self::heritage_names(child, source, out);
                }
            }
        }
    }

    fn callee_name(callee: Node<'_>, source: &str) -> Option<String> {
        match callee.kind() {
            "identifier" => Some(node_text(callee, source).to_string()),
            "member_expression" => {
                dotted_name(callee, "object", "property", &["identifier", "this"], source)
            }
            _ => None,
        }
    }
}

impl GrammarAdapter for EcmaAdapter {
    fn language(&self) -> Language {
        self.language
    }

    fn grammar(&self) -> tree_sitter::Language {
        match self.language {
            Language::TypeScript => tree_sitter_typescript::language_typescript(),
            Language::Tsx => tree_sitter_typescript::language_tsx(),
            _ => tree_sitter_javascript::language(),
        }
    }

    fn node_kinds(&self) -> &HashMap<&'static str, NodeKind> {
        &self.kinds
    }

    fn classify(&self, node: Node<'_>, source: &str) -> NodeKind {
        match node.kind() {
            "comment" if node_text(node, source).starts_with("/**") => NodeKind::DocString,
            "expression_statement" => match single_named_child(node).map(|c| c.kind()) {
                Some("assignment_expression") => NodeKind::Assignment,
                _ => NodeKind::Other,
            },
            kind => self.kinds.get(kind).copied().unwrap_or(NodeKind::Other),
        }
    }

    fn binding_context(&self, parent: &str, field: Option<&str>) -> Option<bool> {
        match (parent, field) {
            (
                "jsx_opening_element" | "jsx_closing_element" | "jsx_self_closing_element"
                | "export_specifier",
                Some("name"),
            ) => Some(false),
            ("pair_pattern", _) => None,
            (
                "assignment_expression" | "augmented_assignment_expression" | "for_in_statement",
                Some("left"),
            ) => Some(true),
            (_, Some("name" | "parameters" | "parameter")) => Some(true),
            (
                _,
                Some(
                    "value" | "right" | "type" | "body" | "arguments" | "function" | "object"
                    | "constructor" | "condition" | "return_type" | "index" | "source",
                ),
            ) => Some(false),
            ("import_statement", _) => Some(true),
            _ => None,
        }
    }

    fn unwrap<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        match node.kind() {
            "export_statement" => node.child_by_field_name("declaration"),
            _ => None,
        }
    }

    fn skips_field(&self, kind: NodeKind, field: Option<&str>) -> bool {
        matches!(kind, NodeKind::Attribute) && field == Some("property")
    }

    fn name(&self, node: Node<'_>, kind: NodeKind, source: &str) -> Option<String> {
        match kind {
            NodeKind::Class | NodeKind::Function => field_text(node, "name", source),
            NodeKind::Identifier => Some(node_text(node, source).to_string()),
            NodeKind::Attribute => {
                dotted_name(node, "object", "property", &["identifier", "this"], source)
            }
            NodeKind::Call => {
                let callee = node
                    .child_by_field_name("function")
                    .or_else(|| node.child_by_field_name("constructor"))?;
                Self::callee_name(callee, source)
            }
            _ => None,
        }
    }

    fn details(&self, node: Node<'_>, kind: NodeKind, source: &str) -> NodeDetails {
        let mut details = NodeDetails::default();
        match kind {
            NodeKind::Class => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "class_heritage" {
                        Self::heritage_names(child, source, &mut details.bases);
                    }
                }
            }
            NodeKind::Function => {
                details.parameter_count = count_parameters(node.child_by_field_name("parameters"));
                details.is_async = has_token(node, "async");
            }
            NodeKind::Import => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "import_clause" {
                        Self::import_names(child, source, &mut details.bound_names);
                    }
                }
            }
            NodeKind::Assignment => match node.kind() {
                "lexical_declaration" | "variable_declaration" => {
                    let mut cursor = node.walk();
                    for declarator in node.named_children(&mut cursor) {
                        if let Some(name) = declarator.child_by_field_name("name") {
                            Self::pattern_names(name, source, &mut details.bound_names);
                        }
                    }
                }
                "expression_statement" => {
                    if let Some(left) = single_named_child(node)
                        .and_then(|assign| assign.child_by_field_name("left"))
                    {
                        Self::pattern_names(left, source, &mut details.bound_names);
                    }
                }
                _ => {
                    if let Some(name) = field_text(node, "name", source) {
                        push_unique(&mut details.bound_names, &name);
                    }
                }
            },
            _ => {}
        }
        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_mappings() {
        let kinds = get_node_kinds(Language::Python);
        assert_eq!(kinds.get("function_definition"), Some(&NodeKind::Function));
        assert_eq!(kinds.get("class_definition"), Some(&NodeKind::Class));
        assert_eq!(kinds.get("import_statement"), Some(&NodeKind::Import));
    }

    #[test]
    fn test_typescript_extends_javascript() {
        let kinds = get_node_kinds(Language::TypeScript);
        // Should have JavaScript types
        assert_eq!(kinds.get("function_declaration"), Some(&NodeKind::Function));
        // Plus TypeScript-specific
        assert_eq!(kinds.get("abstract_class_declaration"), Some(&NodeKind::Class));
        assert_eq!(kinds.get("type_identifier"), Some(&NodeKind::Identifier));
    }

    #[test]
    fn test_unknown_language() {
        assert!(get_node_kinds(Language::Go).is_empty());
        assert!(adapter_for(Language::Go).is_none());
        assert!(adapter_for(Language::Unknown).is_none());
    }

    #[test]
    fn test_adapters_for_structural_languages() {
        for language in Language::STRUCTURAL {
            let adapter = adapter_for(language).unwrap();
            assert_eq!(adapter.language(), language);
        }
    }

    #[test]
    fn test_python_binding_positions() {
        let adapter = PythonAdapter::new();
        assert_eq!(adapter.binding_context("assignment", Some("left")), Some(true));
        assert_eq!(adapter.binding_context("assignment", Some("right")), Some(false));
        assert_eq!(adapter.binding_context("default_parameter", Some("value")), Some(false));
        assert_eq!(adapter.binding_context("import_from_statement", None), Some(true));
        assert_eq!(adapter.binding_context("binary_operator", Some("left")), None);
    }

    #[test]
    fn test_jsx_element_names_are_reads() {
        let adapter = EcmaAdapter::new(Language::Tsx);
        assert_eq!(
            adapter.binding_context("jsx_self_closing_element", Some("name")),
            Some(false)
        );
        assert_eq!(adapter.binding_context("variable_declarator", Some("name")), Some(true));
    }
}
