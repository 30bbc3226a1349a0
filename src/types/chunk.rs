//! Chunk and dependency edge definitions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::processing::Language;

/// Length of the hex digest prefix embedded in chunk IDs.
const ID_HASH_LEN: usize = 12;

/// Structural category of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Module,
    Class,
    Function,
    /// Residual or fallback content
    Mixed,
    Import,
    Comment,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Module => "module",
            ChunkType::Class => "class",
            ChunkType::Function => "function",
            ChunkType::Mixed => "mixed",
            ChunkType::Import => "import",
            ChunkType::Comment => "comment",
        }
    }

    /// Default priority for chunks of this type.
    pub fn default_priority(&self) -> Priority {
        match self {
            ChunkType::Module | ChunkType::Import => Priority::High,
            ChunkType::Class | ChunkType::Function | ChunkType::Comment => Priority::Normal,
            ChunkType::Mixed => Priority::Low,
        }
    }

    /// Position of this type in consumer processing order (lower first).
    pub fn processing_rank(&self) -> u8 {
        match self {
            ChunkType::Module | ChunkType::Import => 0,
            ChunkType::Class | ChunkType::Function | ChunkType::Comment => 1,
            ChunkType::Mixed => 2,
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing priority hint for consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Normal,
    Low,
}

/// One segment of a source file.
///
/// Chunks are immutable values handed to the caller. The ID is derived from
/// the chunk type, start line and a SHA-256 of the content, so re-chunking
/// identical input yields identical IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeChunk {
    /// Content-addressed identifier
    pub id: String,

    /// Exact source text of the segment
    content: String,

    pub chunk_type: ChunkType,

    pub language: Language,

    /// First line covered (1-based, inclusive)
    pub start_line: usize,

    /// Last line covered (1-based, inclusive)
    pub end_line: usize,

    /// Disjoint inclusive line ranges the content was taken from. A single
    /// range for contiguous chunks; module and residual chunks may have
    /// several.
    pub line_ranges: Vec<(usize, usize)>,

    /// Originating file, for traceability
    pub file_path: String,

    pub priority: Priority,

    /// Symbols this chunk introduces
    pub definitions: BTreeSet<String>,

    /// Symbols this chunk reads or calls
    pub references: BTreeSet<String>,

    /// IDs of chunks this chunk depends on
    pub dependencies: BTreeSet<String>,

    /// Chunk-type-specific facts
    pub metadata: BTreeMap<String, serde_json::Value>,

    /// Relative complexity heuristic
    pub complexity_score: f64,

    /// Size of `content` in bytes
    size_bytes: usize,
}

impl CodeChunk {
    /// Create a chunk covering the given line ranges.
    ///
    /// `line_ranges` must be non-empty, sorted and disjoint; the envelope
    /// `start_line..=end_line` is derived from it.
    pub fn new(
        chunk_type: ChunkType,
        content: String,
        language: Language,
        file_path: &str,
        line_ranges: Vec<(usize, usize)>,
    ) -> Self {
        debug_assert!(!line_ranges.is_empty(), "chunk without line ranges");
        let start_line = line_ranges.first().map(|r| r.0).unwrap_or(1).max(1);
        let end_line = line_ranges
            .last()
            .map(|r| r.1)
            .unwrap_or(start_line)
            .max(start_line);

        Self {
            id: chunk_id(chunk_type, start_line, &content),
            size_bytes: content.len(),
            content,
            chunk_type,
            language,
            start_line,
            end_line,
            line_ranges,
            file_path: file_path.to_string(),
            priority: chunk_type.default_priority(),
            definitions: BTreeSet::new(),
            references: BTreeSet::new(),
            dependencies: BTreeSet::new(),
            metadata: BTreeMap::new(),
            complexity_score: 0.0,
        }
    }

    /// Create a chunk covering one contiguous line range.
    pub fn contiguous(
        chunk_type: ChunkType,
        content: String,
        language: Language,
        file_path: &str,
        start_line: usize,
        end_line: usize,
    ) -> Self {
        Self::new(
            chunk_type,
            content,
            language,
            file_path,
            vec![(start_line, end_line)],
        )
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Record the byte offset of the content within its file.
    ///
    /// The offset becomes part of the ID, so windows that share a start line
    /// and content (one very long line, say) stay distinct.
    pub fn at_byte_offset(mut self, byte_offset: usize) -> Self {
        self.id = chunk_id_at(self.chunk_type, self.start_line, byte_offset, &self.content);
        self.metadata
            .insert("byte_offset".to_string(), byte_offset.into());
        self
    }

    /// Number of lines in the envelope.
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    /// Iterate every line number this chunk actually covers.
    pub fn covered_lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.line_ranges.iter().flat_map(|&(start, end)| start..=end)
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_definitions(mut self, definitions: BTreeSet<String>) -> Self {
        self.definitions = definitions;
        self
    }

    pub fn with_references(mut self, references: BTreeSet<String>) -> Self {
        self.references = references;
        self
    }

    pub fn with_complexity(mut self, score: f64) -> Self {
        self.complexity_score = score;
        self
    }

    /// Attach one metadata entry.
    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Read a boolean metadata flag, defaulting to false.
    pub fn meta_flag(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Read a string metadata entry.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    /// Read a string-list metadata entry; missing keys yield an empty list.
    pub fn meta_list(&self, key: &str) -> Vec<&str> {
        self.metadata
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Compute the content-addressed ID for a chunk.
pub fn chunk_id(chunk_type: ChunkType, start_line: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}_{}_{}", chunk_type, start_line, &digest[..ID_HASH_LEN])
}

/// Like [`chunk_id`], with the byte offset of the content mixed into the hash.
pub fn chunk_id_at(chunk_type: ChunkType, start_line: usize, byte_offset: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(byte_offset.to_le_bytes());
    hasher.update(content.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}_{}_{}", chunk_type, start_line, &digest[..ID_HASH_LEN])
}

/// Kind of dependency between two chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Reference,
    MethodCall,
    Inheritance,
    Import,
}

impl RelationType {
    /// Confidence weight assigned to inferred edges of this type.
    pub fn default_strength(&self) -> f32 {
        match self {
            RelationType::Inheritance => 1.0,
            RelationType::MethodCall => 0.9,
            RelationType::Reference => 0.8,
            RelationType::Import => 0.7,
        }
    }

    /// Precedence when several rules connect the same pair of chunks.
    pub fn precedence(&self) -> u8 {
        match self {
            RelationType::Inheritance => 3,
            RelationType::MethodCall => 2,
            RelationType::Reference => 1,
            RelationType::Import => 0,
        }
    }
}

/// Directed edge between two chunks. Never a self-edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRelation {
    pub source_chunk_id: String,
    pub target_chunk_id: String,
    pub relation_type: RelationType,
    pub strength: f32,
}

impl DependencyRelation {
    /// Create an edge with the default strength for its type.
    pub fn new(source: &str, target: &str, relation_type: RelationType) -> Self {
        Self {
            source_chunk_id: source.to_string(),
            target_chunk_id: target.to_string(),
            relation_type,
            strength: relation_type.default_strength(),
        }
    }
}
