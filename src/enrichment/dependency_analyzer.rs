//! Dependency analyzer for chunks of one file.
//!
//! Resolves the names each chunk references against the names other chunks
//! define and turns every match into a typed edge. At most one edge is kept
//! per ordered chunk pair; the strongest relation wins.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{ChunkType, CodeChunk, DependencyRelation, RelationType};

/// Receivers that refer to the enclosing class instance.
const SELF_RECEIVERS: &[&str] = &["self", "cls", "this"];

/// Builds dependency edges between chunks.
pub struct DependencyAnalyzer;

/// Lookup tables built once per analysis.
struct Index<'a> {
    /// Defined name -> ids of chunks defining it
    owners: BTreeMap<&'a str, BTreeSet<&'a str>>,
    /// Same, restricted to class chunks
    class_owners: BTreeMap<&'a str, BTreeSet<&'a str>>,
    /// Chunk id -> names that chunk brings in through imports
    imported: BTreeMap<&'a str, BTreeSet<&'a str>>,
}

impl<'a> Index<'a> {
    fn build(chunks: &'a [CodeChunk]) -> Self {
        let mut owners: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut class_owners: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut imported = BTreeMap::new();

        for chunk in chunks {
            for name in &chunk.definitions {
                owners.entry(name.as_str()).or_default().insert(chunk.id.as_str());
                if chunk.chunk_type == ChunkType::Class {
                    class_owners.entry(name.as_str()).or_default().insert(chunk.id.as_str());
                }
            }
            let names: BTreeSet<&str> = chunk.meta_list("imported_names").into_iter().collect();
            if !names.is_empty() {
                imported.insert(chunk.id.as_str(), names);
            }
        }

        Self {
            owners,
            class_owners,
            imported,
        }
    }

    /// Import when the target pulled `name` in from elsewhere, plain reference otherwise.
    fn name_relation(&self, target: &str, name: &str) -> RelationType {
        match self.imported.get(target) {
            Some(names) if names.contains(name) => RelationType::Import,
            _ => RelationType::Reference,
        }
    }

    /// Resolve one referenced name of `chunk` to `(target, relation)` pairs.
    fn resolve(&self, chunk: &CodeChunk, name: &str, out: &mut Vec<(&'a str, RelationType)>) {
        let Some((head, tail)) = name.split_once('.') else {
            if let Some(targets) = self.owners.get(name) {
                for &target in targets {
                    out.push((target, self.name_relation(target, name)));
                }
            }
            return;
        };

        if SELF_RECEIVERS.contains(&head) {
            if let Some(class_name) = chunk.meta_str("class_name") {
                let member = member_name(class_name, tail);
                if let Some(targets) = self.owners.get(member.as_str()) {
                    out.extend(targets.iter().map(|&t| (t, RelationType::MethodCall)));
                }
            }
            return;
        }

        if let Some(classes) = self.class_owners.get(head) {
            let member = member_name(head, tail);
            let targets = self.owners.get(member.as_str()).unwrap_or(classes);
            out.extend(targets.iter().map(|&t| (t, RelationType::MethodCall)));
        } else if let Some(targets) = self.owners.get(head) {
            for &target in targets {
                out.push((target, self.name_relation(target, head)));
            }
        }
    }
}

/// `Class.member`, using only the first segment of a dotted attribute chain.
fn member_name(class_name: &str, tail: &str) -> String {
    let member = tail.split('.').next().unwrap_or(tail);
    format!("{}.{}", class_name, member)
}

impl DependencyAnalyzer {
    /// Compute the dependency edges of `chunks`.
    ///
    /// Output is sorted by `(source, target)`, contains no self-edges and at
    /// most one edge per ordered pair.
    pub fn analyze(chunks: &[CodeChunk]) -> Vec<DependencyRelation> {
        let index = Index::build(chunks);
        let mut edges: BTreeMap<(&str, &str), RelationType> = BTreeMap::new();
        let mut found = Vec::new();

        for chunk in chunks {
            found.clear();
            for name in &chunk.references {
                index.resolve(chunk, name, &mut found);
            }

            if chunk.chunk_type == ChunkType::Class {
                for base in chunk.meta_list("base_classes") {
                    let targets = index
                        .class_owners
                        .get(base)
                        .or_else(|| index.owners.get(base));
                    if let Some(targets) = targets {
                        found.extend(targets.iter().map(|&t| (t, RelationType::Inheritance)));
                    }
                }
            }

            for &(target, relation) in &found {
                if target == chunk.id {
                    continue;
                }
                edges
                    .entry((chunk.id.as_str(), target))
                    .and_modify(|existing| {
                        if relation.precedence() > existing.precedence() {
                            *existing = relation;
                        }
                    })
                    .or_insert(relation);
            }
        }

        edges
            .into_iter()
            .map(|((source, target), relation)| DependencyRelation::new(source, target, relation))
            .collect()
    }

    /// Record each edge's target in its source chunk's dependency set.
    pub fn attach(chunks: &mut [CodeChunk], relations: &[DependencyRelation]) {
        for chunk in chunks.iter_mut() {
            chunk.dependencies.extend(
                relations
                    .iter()
                    .filter(|r| r.source_chunk_id == chunk.id)
                    .map(|r| r.target_chunk_id.clone()),
            );
        }
    }
}
