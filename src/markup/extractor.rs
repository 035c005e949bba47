//! Chunk extraction from markup filings.

use super::sections::SectionTracker;
use super::tree::{decode_markup, MarkupTree, NodeId};
use crate::chunk::{Chunk, ChunkIdSequence, ChunkMetadata, ChunkSource, ChunkType};
use crate::config::MarkupConfig;
use crate::error::{Error, Result};
use crate::text::normalize_whitespace;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use sha1::{Digest, Sha1};
use std::collections::HashSet;
use std::path::Path;

/// Leading characters inspected for footnote keywords.
const FOOTNOTE_LEAD_CHARS: usize = 200;

const HEADING_TAGS: &[&str] = &["title", "h1", "h2", "h3", "h4", "h5", "h6"];
const TABLE_TAGS: &[&str] = &["table"];
const LIST_TAGS: &[&str] = &["ul", "ol", "list"];
const LIST_ITEM_TAGS: &[&str] = &["li", "item"];
const FOOTNOTE_TAGS: &[&str] = &["footnote", "fn", "note", "endnote"];
const FIGURE_TAGS: &[&str] = &["figure", "img", "image", "picture"];
const CAPTION_TAGS: &[&str] = &["caption", "figcaption"];
const PARAGRAPH_TAGS: &[&str] = &["p", "para", "paragraph", "pre", "blockquote"];
const CELL_TAGS: &[&str] = &["td", "th", "te", "tu"];
/// Non-content elements dropped with their subtree.
const SKIP_TAGS: &[&str] = &["script", "style", "head", "meta", "link", "noscript"];
/// Document-level containers never treated as footnotes.
const DOCUMENT_CONTAINERS: &[&str] = &["document", "html", "body", "body-text", "root"];

const LIST_BULLET: &str = "• ";

lazy_static! {
    static ref RE_FOOTNOTE_KEYWORD: Regex = Regex::new(
        r"(?i)^\s*(?:\(?주\s*\d{0,3}\s*\)|※|\*|†|‡|\[\d{1,3}\]|\(\d{1,3}\)|\d{1,3}\)|footnote|note\s*\d*\s*[:.)])"
    )
    .unwrap();
    static ref RE_SECTION_LEVEL: Regex = Regex::new(r"^section-(\d+)$").unwrap();
}

/// Outcome of classifying one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Heading at the given structural level
    Heading(usize),
    /// Table, consumed whole
    Table,
    /// Bulleted or numbered list, consumed whole
    List,
    /// Short note, consumed whole
    Footnote,
    /// Figure or image, consumed whole
    Figure,
    /// Paragraph text, appended to the pending buffer
    Paragraph,
    /// Anything else; children are visited
    Container,
    /// Script, style or document head; dropped with its subtree
    Skip,
}

fn is_one_of(name: &str, set: &[&str]) -> bool {
    set.contains(&name)
}

/// Classify element `id`. The first matching role wins.
pub fn classify_node(tree: &MarkupTree, id: NodeId, config: &MarkupConfig) -> NodeRole {
    let Some(name) = tree.name(id) else {
        return NodeRole::Container;
    };
    if id == MarkupTree::ROOT {
        return NodeRole::Container;
    }

    if is_one_of(name, SKIP_TAGS) {
        return NodeRole::Skip;
    }
    if is_one_of(name, HEADING_TAGS) {
        return NodeRole::Heading(structural_heading_level(tree, id, name));
    }
    if is_one_of(name, TABLE_TAGS) {
        return NodeRole::Table;
    }
    if is_one_of(name, LIST_TAGS) {
        return NodeRole::List;
    }
    if is_footnote(tree, id, name, config) {
        return NodeRole::Footnote;
    }
    if is_one_of(name, FIGURE_TAGS) {
        return NodeRole::Figure;
    }
    if is_one_of(name, PARAGRAPH_TAGS) || is_text_leaf(tree, id, name) {
        return NodeRole::Paragraph;
    }
    NodeRole::Container
}

fn structural_heading_level(tree: &MarkupTree, id: NodeId, name: &str) -> usize {
    if let Some(n) = name.strip_prefix('h').and_then(|n| n.parse::<usize>().ok()) {
        return n;
    }
    let mut current = tree.parent(id);
    while let Some(parent) = current {
        if let Some(caps) = tree.name(parent).and_then(|n| RE_SECTION_LEVEL.captures(n)) {
            return caps[1].parse().unwrap_or(1);
        }
        current = tree.parent(parent);
    }
    1
}

fn is_footnote(tree: &MarkupTree, id: NodeId, name: &str, config: &MarkupConfig) -> bool {
    if is_one_of(name, DOCUMENT_CONTAINERS) || tree.parent(id) == Some(MarkupTree::ROOT) {
        return false;
    }
    let Some(text) = tree.text_within(id, config.max_footnote_chars) else {
        return false;
    };
    if text.is_empty() || has_structural_descendant(tree, id) {
        return false;
    }
    if is_one_of(name, FOOTNOTE_TAGS) {
        return true;
    }
    let marked = ["class", "usermark"].iter().any(|key| {
        tree.attribute(id, key)
            .is_some_and(|v| v.to_lowercase().contains("footnote"))
    });
    if marked {
        return true;
    }
    let lead: String = text.chars().take(FOOTNOTE_LEAD_CHARS).collect();
    RE_FOOTNOTE_KEYWORD.is_match(&lead)
}

fn has_structural_descendant(tree: &MarkupTree, id: NodeId) -> bool {
    HEADING_TAGS
        .iter()
        .chain(TABLE_TAGS)
        .chain(LIST_TAGS)
        .any(|tag| !tree.descendants_named(id, tag).is_empty())
}

/// An element with text but no element children.
fn is_text_leaf(tree: &MarkupTree, id: NodeId, name: &str) -> bool {
    !is_one_of(name, DOCUMENT_CONTAINERS)
        && tree.element_children(id).next().is_none()
        && !tree.children(id).is_empty()
}

#[derive(Debug, Default)]
struct ParagraphBuffer {
    texts: Vec<String>,
    first_node: Option<NodeId>,
    len: usize,
}

impl ParagraphBuffer {
    fn push(&mut self, node: NodeId, text: String) {
        if text.is_empty() {
            return;
        }
        if self.first_node.is_none() {
            self.first_node = Some(node);
        }
        if !self.texts.is_empty() {
            self.len += 1;
        }
        self.len += text.chars().count();
        self.texts.push(text);
    }

    fn take(&mut self) -> Option<(NodeId, String)> {
        let buffer = std::mem::take(self);
        let node = buffer.first_node?;
        Some((node, buffer.texts.join("\n")))
    }
}

/// Per-document extraction state.
struct DocumentWalk<'a> {
    tree: &'a MarkupTree,
    config: &'a MarkupConfig,
    file: &'a str,
    ids: ChunkIdSequence,
    sections: SectionTracker,
    seen: HashSet<String>,
    buffer: ParagraphBuffer,
    chunks: Vec<Chunk>,
    duplicates: usize,
}

impl<'a> DocumentWalk<'a> {
    fn new(tree: &'a MarkupTree, config: &'a MarkupConfig, file: &'a str) -> Self {
        let stem = Path::new(file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "xml".to_string());
        Self {
            tree,
            config,
            file,
            ids: ChunkIdSequence::new(stem),
            sections: SectionTracker::new(),
            seen: HashSet::new(),
            buffer: ParagraphBuffer::default(),
            chunks: Vec::new(),
            duplicates: 0,
        }
    }

    fn run(mut self) -> Vec<Chunk> {
        let roots = self.tree.children(MarkupTree::ROOT);
        let mut stack: Vec<NodeId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(text) = self.tree.raw_text(id) {
                // loose text directly under a container
                let parent = self.tree.parent(id).unwrap_or(MarkupTree::ROOT);
                self.append_paragraph(parent, normalize_whitespace(text));
                continue;
            }

            match classify_node(self.tree, id, self.config) {
                NodeRole::Heading(structural) => {
                    self.flush();
                    let title = self.tree.text(id);
                    if !title.is_empty() {
                        let level = self.sections.enter(&title, structural);
                        log::trace!("Heading level {}: {}", level, title);
                    }
                },
                NodeRole::Table => {
                    self.flush();
                    self.emit_table(id);
                },
                NodeRole::List => {
                    self.flush();
                    self.emit_list(id);
                },
                NodeRole::Footnote => {
                    self.flush();
                    let text = self.tree.text(id);
                    self.emit(ChunkType::Footnote, &text, id, ChunkMetadata::new());
                },
                NodeRole::Figure => {
                    self.flush();
                    let caption = figure_caption(self.tree, id);
                    self.emit(ChunkType::Figure, &caption, id, ChunkMetadata::new());
                },
                NodeRole::Paragraph => {
                    let text = self.tree.text(id);
                    self.append_paragraph(id, text);
                },
                NodeRole::Container => {
                    stack.extend(self.tree.children(id).iter().rev());
                },
                NodeRole::Skip => {
                    log::trace!("Skipping <{}>", self.tree.name(id).unwrap_or_default());
                },
            }
        }
        self.flush();

        if self.duplicates > 0 {
            log::debug!("Dropped {} duplicate chunks in {}", self.duplicates, self.file);
        }
        self.chunks
    }

    fn append_paragraph(&mut self, node: NodeId, text: String) {
        self.buffer.push(node, text);
        if self.buffer.len >= self.config.min_paragraph_chars {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if let Some((node, text)) = self.buffer.take() {
            self.emit(ChunkType::Text, &text, node, ChunkMetadata::new());
        }
    }

    fn emit_table(&mut self, id: NodeId) {
        let mut rows: Vec<Vec<String>> = self
            .tree
            .descendants_named(id, "tr")
            .into_iter()
            .map(|row| {
                self.tree
                    .element_children(row)
                    .filter(|&c| self.tree.name(c).is_some_and(|n| is_one_of(n, CELL_TAGS)))
                    .map(|c| self.tree.text(c))
                    .collect::<Vec<_>>()
            })
            .filter(|row| row.iter().any(|c| !c.is_empty()))
            .collect();
        if rows.is_empty() {
            let text = self.tree.text(id);
            if !text.is_empty() {
                rows.push(vec![text]);
            }
        }

        let content = rows
            .iter()
            .map(|row| row.join(" | "))
            .collect::<Vec<_>>()
            .join("\n");
        let mut extra = ChunkMetadata::new();
        extra.insert("rows".into(), json!(rows));
        self.emit(ChunkType::Table, &content, id, extra);
    }

    fn emit_list(&mut self, id: NodeId) {
        let mut items: Vec<String> = LIST_ITEM_TAGS
            .iter()
            .flat_map(|tag| self.tree.descendants_named(id, tag))
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .map(|item| self.tree.text(item))
            .filter(|t| !t.is_empty())
            .collect();
        if items.is_empty() {
            items = self
                .tree
                .children(id)
                .iter()
                .map(|&c| match self.tree.raw_text(c) {
                    Some(t) => normalize_whitespace(t),
                    None => self.tree.text(c),
                })
                .filter(|t| !t.is_empty())
                .collect();
        }

        let content = items
            .iter()
            .map(|item| format!("{}{}", LIST_BULLET, item))
            .collect::<Vec<_>>()
            .join("\n");
        if content.chars().count() < self.config.min_list_chars {
            log::debug!("Dropping short list at {}", self.tree.structural_path(id));
            return;
        }
        self.emit(ChunkType::List, &content, id, ChunkMetadata::new());
    }

    fn emit(&mut self, chunk_type: ChunkType, content: &str, node: NodeId, extra: ChunkMetadata) {
        let normalized = normalize_whitespace(content);
        if normalized.is_empty() {
            return;
        }
        let key = format!("{}:{}", chunk_type, normalized);
        if !self.seen.insert(format!("{:x}", Sha1::digest(key.as_bytes()))) {
            self.duplicates += 1;
            return;
        }

        let mut metadata = ChunkMetadata::new();
        metadata.insert("file".into(), json!(self.file));
        metadata.insert("tag".into(), json!(self.tree.name(node).unwrap_or_default()));
        metadata.insert(
            "attributes".into(),
            json!(self.tree.attributes(node).cloned().unwrap_or_default()),
        );
        metadata.insert("path".into(), json!(self.tree.structural_path(node)));
        let section = self.sections.path();
        if let Some(path) = &section {
            metadata.insert("section_path".into(), json!(path));
        }
        if let Some(title) = self.sections.title() {
            metadata.insert("section_title".into(), json!(title));
        }
        metadata.extend(extra);

        let id = self.ids.next_id();
        if let Some(chunk) = Chunk::new(id, chunk_type, content, ChunkSource::Xml, Some(metadata)) {
            self.chunks.push(chunk.with_section(section));
        }
    }
}

/// Caption text of a figure, falling back to its image source.
fn figure_caption(tree: &MarkupTree, id: NodeId) -> String {
    for tag in CAPTION_TAGS {
        if let Some(&caption) = tree.descendants_named(id, tag).first() {
            let text = tree.text(caption);
            if !text.is_empty() {
                return text;
            }
        }
    }
    let text = tree.text(id);
    if !text.is_empty() {
        return text;
    }
    for key in ["alt", "title"] {
        let value = tree.attribute(id, key).map(str::trim).unwrap_or_default();
        if !value.is_empty() {
            return value.to_string();
        }
    }

    let source = std::iter::once(id)
        .chain(tree.descendants_named(id, "img"))
        .find_map(|node| tree.attribute(node, "src").or_else(|| tree.attribute(node, "href")));
    match source {
        Some(src) => {
            let name = src.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(src);
            format!("Figure: {}", name)
        },
        None => "Figure".to_string(),
    }
}

/// Chunker for markup filings.
///
/// # Examples
///
/// ```
/// use filing_extract::markup::MarkupExtractor;
///
/// let xml = "<DOCUMENT><BODY><TITLE>제1장 총칙</TITLE>\
///            <P>이 회사는 전자부품의 제조 및 판매를 주요 사업으로 영위하고 있습니다.</P>\
///            </BODY></DOCUMENT>";
/// let extractor = MarkupExtractor::default();
/// let chunks = extractor.extract_bytes("report.xml", xml.as_bytes()).unwrap();
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].id, "report-000001");
/// assert_eq!(chunks[0].section.as_deref(), Some("제1장 총칙"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MarkupExtractor {
    config: MarkupConfig,
}

impl MarkupExtractor {
    /// Create an extractor with the given thresholds.
    pub fn new(config: MarkupConfig) -> Self {
        Self { config }
    }

    /// Thresholds in use.
    pub fn config(&self) -> &MarkupConfig {
        &self.config
    }

    /// Extract every file in order, skipping files that are missing or fail to parse.
    pub fn extract_files<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut skipped = 0usize;
        for path in paths {
            let path = path.as_ref();
            match self.extract_file(path) {
                Ok(found) => chunks.extend(found),
                Err(Error::NotFound(missing)) => {
                    log::warn!("Skipping missing markup file {}", missing.display());
                    skipped += 1;
                },
                Err(e) => {
                    log::error!("Skipping markup file {}: {}", path.display(), e);
                    skipped += 1;
                },
            }
        }
        log::info!(
            "Extracted {} chunks from {} markup files ({} skipped)",
            chunks.len(),
            paths.len(),
            skipped
        );
        chunks
    }

    /// Extract one file.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when `path` does not exist, [`Error::Io`] when it
    /// cannot be read and [`Error::Markup`] when it cannot be parsed.
    pub fn extract_file(&self, path: impl AsRef<Path>) -> Result<Vec<Chunk>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        self.extract_bytes(&path.to_string_lossy(), &bytes)
    }

    /// Extract markup held in memory; `name` stands in for the file path.
    pub fn extract_bytes(&self, name: &str, bytes: &[u8]) -> Result<Vec<Chunk>> {
        let text = decode_markup(bytes);
        let tree = MarkupTree::parse(&text).map_err(|e| Error::Markup {
            path: name.into(),
            reason: e.to_string(),
        })?;
        let chunks = DocumentWalk::new(&tree, &self.config, name).run();
        log::debug!("{}: {} nodes, {} chunks", name, tree.len(), chunks.len());
        Ok(chunks)
    }
}
