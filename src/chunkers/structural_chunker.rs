//! Syntax-tree based chunker.
//!
//! Splits a parsed file in four passes, each claiming a disjoint set of
//! lines: module preamble, classes (oversized ones split per method),
//! top-level functions, and a residual chunk for whatever is left.

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::{debug, error, warn};

use crate::ast_engine::symbols::{bound_names, imported_names, references};
use crate::ast_engine::{AstParser, NodeKind, Span, SyntaxNode, SyntaxTree};
use crate::enrichment::DependencyAnalyzer;
use crate::error::{ChunkerError, Result};
use crate::processing::{Language, SourceLines};
use crate::types::{ChunkType, ChunkingConfig, ChunkingResult, CodeChunk, ProcessingMethod};

use super::base::Chunker;
use super::line_chunker::LineChunker;

/// Structural chunker for one language.
pub struct StructuralChunker {
    language: Language,
    parser: AstParser,
    config: ChunkingConfig,
    line_chunker: LineChunker,
}

impl StructuralChunker {
    /// Create a structural chunker; fails if no grammar exists for `language`.
    pub fn new(language: Language, config: &ChunkingConfig) -> Result<Self> {
        Ok(Self {
            language,
            parser: AstParser::for_language(language)?,
            config: config.clone(),
            line_chunker: LineChunker::new(config),
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Run the four splitting passes over a parsed tree.
    pub fn split_tree(&self, tree: &SyntaxTree, content: &str, file_path: &str) -> Vec<CodeChunk> {
        let mut splitter = Splitter::new(self, content, file_path);
        let top = tree.top_level();
        let mut consumed = vec![false; top.len()];

        splitter.module_pass(top, &mut consumed);
        splitter.class_pass(top, &mut consumed);
        splitter.function_pass(top, &mut consumed);

        let leftovers = top
            .iter()
            .zip(consumed.iter())
            .filter(|(_, used)| !**used)
            .map(|(node, _)| node);
        splitter.residual.extend(leftovers);
        splitter.residual_pass();

        splitter.chunks
    }
}

/// Check every non-blank line is covered by exactly one chunk.
pub fn verify_coverage(chunks: &[CodeChunk], lines: &SourceLines<'_>) -> Result<()> {
    let mut counts = vec![0usize; lines.len() + 1];
    for chunk in chunks {
        for line in chunk.covered_lines() {
            if line == 0 || line > lines.len() {
                return Err(ChunkerError::InvalidLayout(format!(
                    "chunk {} covers line {} outside 1..={}",
                    chunk.id,
                    line,
                    lines.len()
                )));
            }
            counts[line] += 1;
        }
    }

    for line in lines.non_blank_lines() {
        match counts[line] {
            1 => {}
            0 => {
                return Err(ChunkerError::InvalidLayout(format!(
                    "line {} is not covered by any chunk",
                    line
                )))
            }
            n => {
                return Err(ChunkerError::InvalidLayout(format!(
                    "line {} is covered by {} chunks",
                    line, n
                )))
            }
        }
    }
    Ok(())
}

/// Group sorted, de-duplicated line numbers into inclusive runs.
fn runs_of(lines: impl IntoIterator<Item = usize>) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for line in lines {
        if let Some(last) = runs.last_mut() {
            if last.1 + 1 == line {
                last.1 = line;
                continue;
            }
        }
        runs.push((line, line));
    }
    runs
}

fn is_special_name(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

fn is_private_name(name: &str) -> bool {
    name.starts_with('#') || (name.starts_with('_') && !is_special_name(name))
}

/// Per-file state of one split.
struct Splitter<'a> {
    chunker: &'a StructuralChunker,
    lines: SourceLines<'a>,
    file_path: &'a str,
    /// Indexed by line number; index 0 unused
    claimed: Vec<bool>,
    chunks: Vec<CodeChunk>,
    /// Nodes whose text ends up in the residual chunk
    residual: Vec<&'a SyntaxNode>,
}

impl<'a> Splitter<'a> {
    fn new(chunker: &'a StructuralChunker, content: &'a str, file_path: &'a str) -> Self {
        let lines = SourceLines::new(content);
        Self {
            chunker,
            claimed: vec![false; lines.len() + 1],
            lines,
            file_path,
            chunks: Vec::new(),
            residual: Vec::new(),
        }
    }

    fn is_free(&self, span: &Span) -> bool {
        (span.start_line..=span.end_line).all(|line| !self.claimed[line])
    }

    fn claim(&mut self, start: usize, end: usize) {
        for line in start..=end {
            self.claimed[line] = true;
        }
    }

    fn contiguous(&self, chunk_type: ChunkType, start: usize, end: usize) -> CodeChunk {
        let text = self.lines.slice(start, end);
        CodeChunk::contiguous(
            chunk_type,
            text.to_string(),
            self.chunker.language,
            self.file_path,
            start,
            end,
        )
        .with_complexity(self.chunker.complexity_score(text))
        .with_meta("line_count", end - start + 1)
    }

    fn fragmented(&self, chunk_type: ChunkType, runs: Vec<(usize, usize)>) -> CodeChunk {
        let text = runs
            .iter()
            .map(|&(start, end)| self.lines.slice(start, end))
            .collect::<Vec<_>>()
            .join(self.lines.line_ending());
        let line_count: usize = runs.iter().map(|(start, end)| end - start + 1).sum();
        let complexity = self.chunker.complexity_score(&text);
        CodeChunk::new(chunk_type, text, self.chunker.language, self.file_path, runs)
            .with_complexity(complexity)
            .with_meta("line_count", line_count)
    }

    /// Pass 1: imports, early assignments and the leading docstring.
    fn module_pass(&mut self, top: &'a [SyntaxNode], consumed: &mut [bool]) {
        let mut definition_lines = vec![false; self.claimed.len()];
        for node in top.iter().filter(|n| n.kind.is_definition()) {
            for line in node.span.start_line..=node.span.end_line {
                definition_lines[line] = true;
            }
        }
        let clear_of_definitions =
            |span: &Span| (span.start_line..=span.end_line).all(|line| !definition_lines[line]);

        let docstring = top
            .iter()
            .position(|n| n.kind != NodeKind::Comment)
            .filter(|&i| top[i].kind == NodeKind::DocString);

        let scan_lines = self.chunker.config.module_scan_lines;
        let selected: Vec<usize> = top
            .iter()
            .enumerate()
            .filter(|(i, node)| {
                let is_setup = matches!(node.kind, NodeKind::Import | NodeKind::Assignment)
                    && node.span.start_line <= scan_lines;
                (is_setup || Some(*i) == docstring) && clear_of_definitions(&node.span)
            })
            .map(|(i, _)| i)
            .collect();

        if selected.is_empty() {
            return;
        }

        let nodes: Vec<&SyntaxNode> = selected.iter().map(|&i| &top[i]).collect();
        let covered: BTreeSet<usize> = nodes
            .iter()
            .flat_map(|n| n.span.start_line..=n.span.end_line)
            .collect();
        let runs = runs_of(covered);

        let imports = imported_names(nodes.iter().copied());
        let import_count = nodes.iter().filter(|n| n.kind == NodeKind::Import).count();
        let assignment_count = nodes.iter().filter(|n| n.kind == NodeKind::Assignment).count();

        let chunk = self
            .fragmented(ChunkType::Module, runs.clone())
            .with_definitions(bound_names(nodes.iter().copied()))
            .with_references(references(nodes.iter().copied()))
            .with_meta("imported_names", imports.into_iter().collect::<Vec<_>>())
            .with_meta("import_count", import_count)
            .with_meta("assignment_count", assignment_count)
            .with_meta("has_docstring", docstring.is_some_and(|i| selected.contains(&i)));

        for (start, end) in runs {
            self.claim(start, end);
        }
        for i in selected {
            consumed[i] = true;
        }
        self.chunks.push(chunk);
    }

    /// Pass 2: top-level classes.
    fn class_pass(&mut self, top: &'a [SyntaxNode], consumed: &mut [bool]) {
        for (i, node) in top.iter().enumerate() {
            if node.kind == NodeKind::Class && !consumed[i] && self.is_free(&node.span) {
                self.split_class(node, None);
                consumed[i] = true;
            }
        }
    }

    /// Pass 3: functions outside any class.
    fn function_pass(&mut self, top: &'a [SyntaxNode], consumed: &mut [bool]) {
        for (i, node) in top.iter().enumerate() {
            if node.kind == NodeKind::Function && !consumed[i] && self.is_free(&node.span) {
                let name = node.name.clone().unwrap_or_default();
                let chunk = self
                    .contiguous(ChunkType::Function, node.span.start_line, node.span.end_line)
                    .with_definitions(BTreeSet::from([name.clone()]))
                    .with_references(references([node]))
                    .with_meta("is_module_function", true)
                    .with_meta("function_name", name)
                    .with_meta("parameter_count", node.details.parameter_count)
                    .with_meta("is_async", node.details.is_async)
                    .with_meta("decorators", node.details.decorators.clone());
                self.claim(node.span.start_line, node.span.end_line);
                self.chunks.push(chunk);
                consumed[i] = true;
            }
        }
    }

    /// Emit a class whole when it fits, otherwise a header plus one chunk
    /// per member. Nested classes are split the same way under a qualified
    /// name.
    fn split_class(&mut self, node: &'a SyntaxNode, qualifier: Option<&str>) {
        let bare = node.name.as_deref().unwrap_or("<anonymous>");
        let name = match qualifier {
            Some(outer) => format!("{}.{}", outer, bare),
            None => bare.to_string(),
        };
        let span = node.span;
        let members: Vec<&SyntaxNode> = node.members().collect();
        let methods: Vec<String> = members
            .iter()
            .filter(|m| m.kind == NodeKind::Function)
            .filter_map(|m| m.name.clone())
            .collect();

        let size = self.lines.slice(span.start_line, span.end_line).len();
        let first_member = members.first().map(|m| m.span.start_line);
        let splittable = first_member.is_some_and(|first| first > span.start_line);

        if size <= self.chunker.config.max_chunk_size || !splittable {
            let mut chunk = self
                .contiguous(ChunkType::Class, span.start_line, span.end_line)
                .with_definitions(BTreeSet::from([name.clone()]))
                .with_references(references([node]))
                .with_meta("class_name", name)
                .with_meta("base_classes", node.details.bases.clone())
                .with_meta("method_count", methods.len())
                .with_meta("methods", methods)
                .with_meta("decorators", node.details.decorators.clone());
            if size > self.chunker.config.max_chunk_size {
                warn!(
                    file_path = %self.file_path,
                    class = bare,
                    size,
                    "Oversized class has no member boundary to split on"
                );
                chunk = chunk.with_meta("exceeds_max_size", true);
            }
            self.claim(span.start_line, span.end_line);
            self.chunks.push(chunk);
            return;
        }

        let first = first_member.unwrap_or(span.start_line);
        let header_end = (span.start_line..first)
            .rev()
            .find(|&line| !self.lines.is_blank(line))
            .unwrap_or(span.start_line);

        // Header references: signature parts plus body statements before the
        // first member. Later statements fall through to the residual chunk.
        let mut header_nodes: Vec<&SyntaxNode> = node
            .children
            .iter()
            .filter(|c| c.kind != NodeKind::Block)
            .collect();
        if let Some(body) = node.body() {
            for stmt in &body.children {
                if stmt.kind.is_definition() {
                    continue;
                }
                if stmt.span.end_line < first {
                    header_nodes.push(stmt);
                } else {
                    self.residual.push(stmt);
                }
            }
        }

        let mut header = self
            .contiguous(ChunkType::Class, span.start_line, header_end)
            .with_definitions(BTreeSet::from([name.clone()]))
            .with_references(references(header_nodes))
            .with_meta("is_class_header", true)
            .with_meta("class_name", name.clone())
            .with_meta("base_classes", node.details.bases.clone())
            .with_meta("method_count", methods.len())
            .with_meta("methods", methods)
            .with_meta("decorators", node.details.decorators.clone());
        if header.size_bytes() > self.chunker.config.max_chunk_size {
            warn!(
                file_path = %self.file_path,
                class = %name,
                size = header.size_bytes(),
                "Class header alone exceeds the size limit"
            );
            header = header.with_meta("exceeds_max_size", true);
        }
        self.claim(span.start_line, header_end);
        self.chunks.push(header);

        debug!(
            file_path = %self.file_path,
            class = %name,
            size,
            members = members.len(),
            "Splitting oversized class"
        );

        for member in members {
            if !self.is_free(&member.span) {
                self.residual.push(member);
                continue;
            }
            match member.kind {
                NodeKind::Class => self.split_class(member, Some(&name)),
                _ => self.emit_method(member, &name),
            }
        }
    }

    fn emit_method(&mut self, node: &'a SyntaxNode, class_name: &str) {
        let method = node.name.clone().unwrap_or_default();
        let chunk = self
            .contiguous(ChunkType::Function, node.span.start_line, node.span.end_line)
            .with_definitions(BTreeSet::from([format!("{}.{}", class_name, method)]))
            .with_references(references([node]))
            .with_meta("is_method", true)
            .with_meta("class_name", class_name)
            .with_meta("method_name", method.as_str())
            .with_meta("is_private", is_private_name(&method))
            .with_meta("is_special", is_special_name(&method))
            .with_meta("parameter_count", node.details.parameter_count)
            .with_meta("is_async", node.details.is_async)
            .with_meta("decorators", node.details.decorators.clone());
        self.claim(node.span.start_line, node.span.end_line);
        self.chunks.push(chunk);
    }

    /// Pass 4: every unclaimed non-blank line goes into one mixed chunk.
    fn residual_pass(&mut self) {
        let mut runs: Vec<(usize, usize)> = Vec::new();
        let mut open = false;
        for line in 1..self.claimed.len() {
            if self.claimed[line] {
                open = false;
                continue;
            }
            if self.lines.is_blank(line) {
                continue;
            }
            if open {
                if let Some(last) = runs.last_mut() {
                    last.1 = line;
                }
            } else {
                runs.push((line, line));
            }
            open = true;
        }

        if runs.is_empty() {
            return;
        }

        let nodes = std::mem::take(&mut self.residual);
        let imports: Vec<String> = imported_names(nodes.iter().copied()).into_iter().collect();
        let fragment_count = runs.len();

        let mut chunk = self
            .fragmented(ChunkType::Mixed, runs.clone())
            .with_definitions(bound_names(nodes.iter().copied()))
            .with_references(references(nodes.iter().copied()))
            .with_meta("is_residual", true)
            .with_meta("fragment_count", fragment_count);
        if !imports.is_empty() {
            chunk = chunk.with_meta("imported_names", imports);
        }

        for (start, end) in runs {
            self.claim(start, end);
        }
        self.chunks.push(chunk);
    }
}

impl Chunker for StructuralChunker {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn supports_language(&self, language: Language) -> bool {
        language == self.language
    }

    fn chunk_code(&self, content: &str, file_path: &str) -> ChunkingResult {
        let started = Instant::now();

        if content.trim().is_empty() {
            return ChunkingResult::new(Vec::new(), ProcessingMethod::Structural)
                .with_warning("Empty content, nothing to chunk")
                .with_processing_time(started.elapsed());
        }

        let tree = match self.parser.parse(content) {
            Ok(tree) => tree,
            Err(e) if e.is_parse_failure() => {
                warn!(
                    file_path = %file_path,
                    language = %self.language,
                    error = %e,
                    "Structural parse failed, using line-based fallback"
                );
                let chunks = self.line_chunker.split(content, file_path, self.language);
                return ChunkingResult::new(chunks, ProcessingMethod::LineFallback)
                    .with_warning(format!(
                        "Structural parsing failed ({}); line-based fallback used",
                        e
                    ))
                    .with_processing_time(started.elapsed());
            }
            Err(e) => {
                error!(file_path = %file_path, error = %e, "Parser unavailable");
                return ChunkingResult::failed(ProcessingMethod::Structural, e.to_string())
                    .with_processing_time(started.elapsed());
            }
        };

        let mut chunks = self.split_tree(&tree, content, file_path);

        if let Err(e) = verify_coverage(&chunks, &SourceLines::new(content)) {
            error!(file_path = %file_path, error = %e, "Structural split violated line coverage");
            return ChunkingResult::failed(ProcessingMethod::Structural, e.to_string())
                .with_processing_time(started.elapsed());
        }

        let relations = self.analyze_dependencies(&chunks);
        DependencyAnalyzer::attach(&mut chunks, &relations);

        debug!(
            file_path = %file_path,
            language = %self.language,
            chunks = chunks.len(),
            relations = relations.len(),
            "Structural chunking complete"
        );

        ChunkingResult::new(chunks, ProcessingMethod::Structural)
            .with_relations(relations)
            .with_processing_time(started.elapsed())
    }

    fn description(&self) -> &'static str {
        "Splits source along module, class and function boundaries"
    }
}
