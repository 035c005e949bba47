//! Page-engine capability interface.
//!
//! The extraction algorithms never talk to a concrete document engine. They
//! ask a [`LayoutBackend`] to open a document and then read pages through the
//! narrow [`LayoutDocument`] / [`LocatedTable`] capabilities:
//!
//! - text blocks of a page, each with its lines and bounding box
//! - the engine's native table locator for a page
//! - per table: bounding box, raw cell matrix, per-cell geometry
//!
//! [`dump::LayoutDumpBackend`] reads a JSON layout export; tests plug in fakes.

pub mod dump;

use crate::error::Result;
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use dump::LayoutDumpBackend;

/// A single line inside a text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Bounding box of the line
    pub bbox: Rect,
    /// Line text as reported by the engine
    pub text: String,
}

impl TextLine {
    /// Create a new line.
    pub fn new(bbox: Rect, text: impl Into<String>) -> Self {
        Self {
            bbox,
            text: text.into(),
        }
    }
}

/// What a structural block holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    /// Text lines
    Text {
        /// Lines in reading order
        #[serde(default)]
        lines: Vec<TextLine>,
    },
    /// Raster or vector image
    Image {
        /// Engine-reported image name or source, if any
        #[serde(default)]
        name: Option<String>,
    },
}

/// A structural block on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Bounding box of the whole block
    pub bbox: Rect,
    /// Block payload
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl TextBlock {
    /// Create a text block.
    pub fn text(bbox: Rect, lines: Vec<TextLine>) -> Self {
        Self {
            bbox,
            kind: BlockKind::Text { lines },
        }
    }

    /// Create an image block.
    pub fn image(bbox: Rect, name: Option<String>) -> Self {
        Self {
            bbox,
            kind: BlockKind::Image { name },
        }
    }

    /// Lines of a text block; empty for images.
    pub fn lines(&self) -> &[TextLine] {
        match &self.kind {
            BlockKind::Text { lines } => lines,
            BlockKind::Image { .. } => &[],
        }
    }

    /// Whether this block carries an image.
    pub fn is_image(&self) -> bool {
        matches!(self.kind, BlockKind::Image { .. })
    }
}

/// Raw cell matrix as returned by a table locator; `None` marks a missing cell.
pub type RawTable = Vec<Vec<Option<String>>>;

/// A table found by the engine's table locator.
pub trait LocatedTable {
    /// Bounding box of the table.
    fn bbox(&self) -> Rect;

    /// Raw cell text, row-major. Rows may be ragged.
    fn extract(&self) -> Result<RawTable>;

    /// Per-cell bounding boxes, row-major; `None` for cells without geometry.
    fn cells(&self) -> Result<Vec<Option<Rect>>>;
}

/// An open fixed-layout document.
pub trait LayoutDocument {
    /// Table handle returned by [`LayoutDocument::find_tables`].
    type Table: LocatedTable;

    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Page width and height in points for a zero-based page index.
    fn page_size(&mut self, page: usize) -> Result<(f32, f32)>;

    /// Structural blocks of a page in reading order.
    fn text_blocks(&mut self, page: usize) -> Result<Vec<TextBlock>>;

    /// Tables located on a page.
    fn find_tables(&mut self, page: usize) -> Result<Vec<Self::Table>>;
}

/// Opens documents for extraction.
pub trait LayoutBackend {
    /// Document handle produced by [`LayoutBackend::open`].
    type Document: LayoutDocument;

    /// Open the document at `path`.
    fn open(&self, path: &Path) -> Result<Self::Document>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_kind_from_json() {
        let block: TextBlock = serde_json::from_str(
            r#"{"type":"text","bbox":[0,0,10,10],"lines":[{"bbox":[0,0,10,5],"text":"hi"}]}"#,
        )
        .unwrap();
        assert!(!block.is_image());
        assert_eq!(block.lines().len(), 1);
        assert_eq!(block.lines()[0].text, "hi");

        let json = r#"{"type":"image","bbox":[0,0,10,10],"name":"logo.png"}"#;
        let image: TextBlock = serde_json::from_str(json).unwrap();
        assert!(image.is_image());
        assert!(image.lines().is_empty());
    }
}
