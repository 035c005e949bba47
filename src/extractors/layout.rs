//! Fixed-layout chunking.
//!
//! Walks the structural blocks of every page and turns them into
//! offset-addressed, hashed [`Chunk`]s:
//!
//! - wrapped paragraphs split across blocks are merged back together
//! - marked lines in the bottom band of the page become footnote chunks
//! - image blocks become figure chunks with a synthetic caption
//! - tables found by the engine's locator become `header: value` text chunks
//!   carrying the structured table as metadata
//!
//! Per-page state lives in two explicit accumulators, [`PendingParagraph`]
//! and [`CharCursor`], so each transition can be tested on its own.

use crate::backend::{BlockKind, LayoutBackend, LayoutDocument, LocatedTable, TextLine};
use crate::chunk::{sentence_hash, Chunk, ChunkIdSequence, ChunkMetadata, ChunkSource, ChunkType};
use crate::config::LayoutChunkerConfig;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::tables::{analyze_table, TableExtractionResult};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use std::path::Path;

lazy_static! {
    /// Leading footnote markers: 1) (1) [1] ¹ * † ‡ ※ 주1) (주1) 주)
    static ref RE_FOOTNOTE_MARKER: Regex = Regex::new(
        r"^\s*(?:\(?\d{1,3}\)|\[\d{1,3}\]|[¹²³⁴⁵⁶⁷⁸⁹]|[*†‡※]|\(?주\s*\d{0,3}\s*\))"
    )
    .unwrap();
}

/// Whether `text` starts with a footnote marker.
///
/// # Examples
///
/// ```
/// use filing_extract::extractors::layout::has_footnote_marker;
///
/// assert!(has_footnote_marker("1) 연결재무제표 기준입니다."));
/// assert!(has_footnote_marker("(주2) 보통주 기준"));
/// assert!(has_footnote_marker("※ 단위: 백만원"));
/// assert!(!has_footnote_marker("2023년 매출은 증가하였습니다."));
/// ```
pub fn has_footnote_marker(text: &str) -> bool {
    RE_FOOTNOTE_MARKER.is_match(text)
}

/// Monotonic character cursor for one page.
///
/// Every allocation reserves `len(content)` characters and advances one extra
/// position as a separator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CharCursor {
    next: usize,
}

impl CharCursor {
    /// Fresh cursor at offset 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a span for `content`, returning `(char_start, char_end)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use filing_extract::extractors::layout::CharCursor;
    ///
    /// let mut cursor = CharCursor::new();
    /// assert_eq!(cursor.allocate("abc"), (0, 3));
    /// assert_eq!(cursor.allocate("가나"), (4, 6));
    /// ```
    pub fn allocate(&mut self, content: &str) -> (usize, usize) {
        let start = self.next;
        let end = start + content.chars().count();
        self.next = end + 1;
        (start, end)
    }

    /// Offset the next allocation starts at.
    pub fn position(&self) -> usize {
        self.next
    }
}

/// A flushed paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    /// Joined body text
    pub text: String,
    /// Union of contributing block boxes
    pub bbox: Rect,
    /// Indices of contributing blocks on the page
    pub block_indices: Vec<usize>,
}

/// Paragraph being accumulated from consecutive blocks.
#[derive(Debug, Default, Clone)]
pub struct PendingParagraph {
    lines: Vec<String>,
    bbox: Option<Rect>,
    last_block: Option<Rect>,
    block_indices: Vec<usize>,
    text_len: usize,
}

impl PendingParagraph {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no block has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.block_indices.is_empty()
    }

    /// Characters accumulated so far, line separators included.
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    /// Whether a block at `bbox` continues the pending paragraph.
    ///
    /// True when the block sits at most `merge_tolerance` below the previous
    /// block with its left edge within the same tolerance, or when the pending
    /// text is still shorter than `min_paragraph_chars`.
    pub fn accepts(&self, bbox: &Rect, config: &LayoutChunkerConfig) -> bool {
        let Some(prev) = self.last_block else {
            return true;
        };
        let gap = bbox.top() - prev.bottom();
        let shift = (bbox.left() - prev.left()).abs();
        let continues =
            (0.0..=config.merge_tolerance).contains(&gap) && shift <= config.merge_tolerance;
        continues || self.text_len < config.min_paragraph_chars
    }

    /// Append the body lines of block `index`.
    pub fn push(&mut self, index: usize, bbox: Rect, lines: Vec<String>) {
        for line in lines {
            if !self.lines.is_empty() {
                self.text_len += 1;
            }
            self.text_len += line.chars().count();
            self.lines.push(line);
        }
        self.bbox = Some(self.bbox.map_or(bbox, |b| b.union(&bbox)));
        self.last_block = Some(bbox);
        self.block_indices.push(index);
    }

    /// Take the accumulated paragraph, leaving the accumulator empty.
    pub fn take(&mut self) -> Option<Paragraph> {
        let pending = std::mem::take(self);
        let bbox = pending.bbox?;
        Some(Paragraph {
            text: pending.lines.join("\n"),
            bbox,
            block_indices: pending.block_indices,
        })
    }
}

/// Builds chunks for one page, assigning ids, offsets and position metadata.
struct PageEmitter<'a> {
    page_number: u32,
    width: f32,
    height: f32,
    cursor: CharCursor,
    ids: &'a mut ChunkIdSequence,
    chunks: Vec<Chunk>,
}

impl<'a> PageEmitter<'a> {
    fn new(page_number: u32, width: f32, height: f32, ids: &'a mut ChunkIdSequence) -> Self {
        Self {
            page_number,
            width,
            height,
            cursor: CharCursor::new(),
            ids,
            chunks: Vec::new(),
        }
    }

    fn emit(&mut self, chunk_type: ChunkType, content: &str, bbox: Rect, extra: ChunkMetadata) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        let (char_start, char_end) = self.cursor.allocate(content);
        let [x_start, y_start, x_end, y_end] = bbox.page_percentages(self.width, self.height);

        let mut metadata = ChunkMetadata::new();
        metadata.insert("bbox".into(), json!(bbox.to_array()));
        metadata.insert("page_width".into(), json!(self.width));
        metadata.insert("page_height".into(), json!(self.height));
        metadata.insert("x_start_pct".into(), json!(x_start));
        metadata.insert("y_start_pct".into(), json!(y_start));
        metadata.insert("x_end_pct".into(), json!(x_end));
        metadata.insert("y_end_pct".into(), json!(y_end));
        metadata.insert("char_start".into(), json!(char_start));
        metadata.insert("char_end".into(), json!(char_end));
        if let Some(hash) = sentence_hash(content) {
            metadata.insert("sentence_hash".into(), json!(hash));
        }
        metadata.extend(extra);

        let id = self.ids.next_id();
        if let Some(chunk) = Chunk::new(id, chunk_type, content, ChunkSource::Pdf, Some(metadata)) {
            log::trace!(
                "page {} {} chunk [{}..{})",
                self.page_number,
                chunk_type,
                char_start,
                char_end
            );
            self.chunks.push(chunk.with_page(self.page_number));
        }
    }

    fn flush(&mut self, pending: &mut PendingParagraph) {
        if let Some(paragraph) = pending.take() {
            let mut extra = ChunkMetadata::new();
            extra.insert("block_indices".into(), json!(paragraph.block_indices));
            self.emit(ChunkType::Text, &paragraph.text, paragraph.bbox, extra);
        }
    }
}

/// Render a table as one `header: value` line per body row.
///
/// Header paths are joined with ` / `; columns without a header path are
/// labelled `col{n}`. A header-only table renders its header rows.
pub fn render_key_value(table: &TableExtractionResult) -> String {
    let label = |col: usize| -> String {
        match table.header_paths.get(col) {
            Some(path) if !path.is_empty() => path.join(" / "),
            _ => format!("col{}", col + 1),
        }
    };

    if table.body_rows.is_empty() {
        return table
            .header_rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|c| !c.is_empty())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
    }

    table
        .body_rows
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .filter(|(_, value)| !value.is_empty())
                .map(|(col, value)| format!("{}: {}", label(col), value))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Chunker for fixed-layout documents.
///
/// # Examples
///
/// ```ignore
/// use filing_extract::backend::LayoutDumpBackend;
/// use filing_extract::extractors::LayoutChunker;
///
/// let chunks = LayoutChunker::default().extract(&LayoutDumpBackend::new(), "annual_report.json")?;
/// for chunk in &chunks {
///     println!("p{:?} {} {}", chunk.page_number, chunk.chunk_type, chunk.content);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayoutChunker {
    config: LayoutChunkerConfig,
}

impl LayoutChunker {
    /// Create a chunker with the given configuration.
    pub fn new(config: LayoutChunkerConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &LayoutChunkerConfig {
        &self.config
    }

    /// Chunk every page of the document at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] before anything is opened when `path` does not
    /// exist. Engine failures while opening or reading pages are returned
    /// unchanged. Unreadable table cell geometry is logged and skipped.
    pub fn extract<B: LayoutBackend>(
        &self,
        backend: &B,
        path: impl AsRef<Path>,
    ) -> Result<Vec<Chunk>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let mut doc = backend.open(path)?;
        let mut ids = ChunkIdSequence::new("pdf");
        let mut chunks = Vec::new();
        for page in 0..doc.page_count() {
            chunks.extend(self.chunk_page(&mut doc, page, &mut ids)?);
        }

        log::info!(
            "Chunked {} pages of {} into {} chunks",
            doc.page_count(),
            path.display(),
            chunks.len()
        );
        Ok(chunks)
    }

    /// Chunk one zero-based page, drawing ids from `ids`.
    pub fn chunk_page<D: LayoutDocument>(
        &self,
        doc: &mut D,
        page: usize,
        ids: &mut ChunkIdSequence,
    ) -> Result<Vec<Chunk>> {
        let (width, height) = doc.page_size(page)?;
        let page_number = page as u32 + 1;
        let blocks = doc.text_blocks(page)?;

        let mut emitter = PageEmitter::new(page_number, width, height, ids);
        let mut pending = PendingParagraph::new();
        let mut figures = 0usize;

        for (index, block) in blocks.iter().enumerate() {
            match &block.kind {
                BlockKind::Image { name } => {
                    emitter.flush(&mut pending);
                    figures += 1;
                    let caption = match name {
                        Some(name) => {
                            format!("Figure {} on page {}: {}", figures, page_number, name)
                        },
                        None => format!("Figure {} on page {}", figures, page_number),
                    };
                    let mut extra = ChunkMetadata::new();
                    if let Some(name) = name {
                        extra.insert("image_name".into(), json!(name));
                    }
                    emitter.emit(ChunkType::Figure, &caption, block.bbox, extra);
                },
                BlockKind::Text { lines } => {
                    let body = self.split_footnotes(lines, height, &mut emitter);
                    if body.is_empty() {
                        emitter.flush(&mut pending);
                        continue;
                    }
                    if !pending.accepts(&block.bbox, &self.config) {
                        emitter.flush(&mut pending);
                    }
                    pending.push(index, block.bbox, body);
                },
            }
        }
        emitter.flush(&mut pending);

        for (index, table) in doc.find_tables(page)?.iter().enumerate() {
            self.emit_table(&mut emitter, table, index)?;
        }

        log::debug!(
            "Page {}: {} chunks from {} blocks",
            page_number,
            emitter.chunks.len(),
            blocks.len()
        );
        Ok(emitter.chunks)
    }

    /// Emit footnote lines of a block and return its remaining body lines.
    fn split_footnotes(
        &self,
        lines: &[TextLine],
        page_height: f32,
        emitter: &mut PageEmitter<'_>,
    ) -> Vec<String> {
        let band_top = page_height * (1.0 - self.config.footnote_band);
        let mut body = Vec::new();
        for line in lines {
            let text = line.text.trim();
            if text.is_empty() {
                continue;
            }
            if line.bbox.top() >= band_top && has_footnote_marker(text) {
                emitter.emit(ChunkType::Footnote, text, line.bbox, ChunkMetadata::new());
            } else {
                body.push(text.to_string());
            }
        }
        body
    }

    fn emit_table<T: LocatedTable>(
        &self,
        emitter: &mut PageEmitter<'_>,
        table: &T,
        index: usize,
    ) -> Result<()> {
        let bbox = table.bbox();
        let raw = table.extract()?;
        let Some(analysis) = analyze_table(&raw, bbox, emitter.page_number, index)? else {
            return Ok(());
        };

        let cell_bboxes = match table.cells() {
            Ok(cells) => Some(cells),
            Err(e) => {
                log::warn!(
                    "Skipping cell geometry for table {} on page {}: {}",
                    index,
                    emitter.page_number,
                    e
                );
                None
            },
        };

        let mut extra = ChunkMetadata::new();
        extra.insert("table_index".into(), json!(index));
        extra.insert(
            "table".into(),
            json!({
                "header_rows": analysis.header_rows,
                "body_rows": analysis.body_rows,
                "header_paths": analysis.header_paths,
                "table_type": analysis.table_type,
                "confidence": analysis.confidence,
                "bbox": bbox,
                "cell_bboxes": cell_bboxes,
            }),
        );
        emitter.emit(ChunkType::Table, &render_key_value(&analysis), bbox, extra);
        Ok(())
    }
}

/// Convenience wrapper: chunk `path` with default settings.
pub fn extract_layout_chunks<B: LayoutBackend>(
    backend: &B,
    path: impl AsRef<Path>,
) -> Result<Vec<Chunk>> {
    LayoutChunker::default().extract(backend, path)
}
