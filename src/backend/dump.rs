//! JSON page-layout dump engine.
//!
//! Reads the block/table export a page-layout engine writes for a document:
//!
//! ```text
//! {"pages": [{"width": 595, "height": 842,
//!             "blocks": [{"type": "text", "bbox": [x0,y0,x1,y1],
//!                         "lines": [{"bbox": [..], "text": ".."}]},
//!                        {"type": "image", "bbox": [..], "name": "chart.png"}],
//!             "tables": [{"bbox": [..], "rows": [["a", null]],
//!                         "cells": [[x0,y0,x1,y1], null]}]}]}
//! ```
//!
//! Cell geometry is decoded lazily so that one malformed `cells` entry only
//! costs that table its coordinates.

use super::{LayoutBackend, LayoutDocument, LocatedTable, RawTable, TextBlock};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use serde::Deserialize;
use std::path::Path;

/// Opens layout dump files.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutDumpBackend;

impl LayoutDumpBackend {
    /// Create a new backend.
    pub fn new() -> Self {
        Self
    }
}

impl LayoutBackend for LayoutDumpBackend {
    type Document = LayoutDumpDocument;

    fn open(&self, path: &Path) -> Result<LayoutDumpDocument> {
        let bytes = std::fs::read(path)?;
        let doc = LayoutDumpDocument::from_slice(&bytes)?;
        log::debug!("Opened layout dump {} ({} pages)", path.display(), doc.pages.len());
        Ok(doc)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DumpPage {
    width: f32,
    height: f32,
    #[serde(default)]
    blocks: Vec<TextBlock>,
    #[serde(default)]
    tables: Vec<DumpTable>,
}

/// A parsed layout dump.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutDumpDocument {
    pages: Vec<DumpPage>,
}

impl LayoutDumpDocument {
    /// Parse a dump from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn page(&self, page: usize) -> Result<&DumpPage> {
        self.pages.get(page).ok_or(Error::PageOutOfRange {
            page,
            count: self.pages.len(),
        })
    }
}

impl LayoutDocument for LayoutDumpDocument {
    type Table = DumpTable;

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&mut self, page: usize) -> Result<(f32, f32)> {
        let p = self.page(page)?;
        Ok((p.width, p.height))
    }

    fn text_blocks(&mut self, page: usize) -> Result<Vec<TextBlock>> {
        Ok(self.page(page)?.blocks.clone())
    }

    fn find_tables(&mut self, page: usize) -> Result<Vec<DumpTable>> {
        Ok(self.page(page)?.tables.clone())
    }
}

/// A table entry of a layout dump.
#[derive(Debug, Clone, Deserialize)]
pub struct DumpTable {
    bbox: Rect,
    #[serde(default)]
    rows: RawTable,
    #[serde(default)]
    cells: Option<serde_json::Value>,
}

impl LocatedTable for DumpTable {
    fn bbox(&self) -> Rect {
        self.bbox
    }

    fn extract(&self) -> Result<RawTable> {
        Ok(self.rows.clone())
    }

    fn cells(&self) -> Result<Vec<Option<Rect>>> {
        match &self.cells {
            None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| Error::CellGeometry(e.to_string())),
        }
    }
}
