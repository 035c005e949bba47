//! Structured table extraction.
//!
//! Turns the raw cell matrices returned by a page engine's table locator into
//! typed, scored [`TableExtractionResult`]s:
//!
//! 1. rectangularize the matrix ([`header::rectangularize`])
//! 2. detect the header span and build per-column header paths ([`header`])
//! 3. type and score every body cell ([`cells`])
//! 4. classify the disclosure type from keywords ([`classify`])
//! 5. render HTML, CSV and the canonical JSON payload plus its checksum ([`render`])
//!
//! [`TableExtractor`] drives this over a whole document under page, table and
//! wall-clock limits.

pub mod cells;
pub mod classify;
pub mod extractor;
pub mod header;
pub mod render;

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use cells::classify_value;
pub use classify::{classify_table, Classification};
pub use extractor::{analyze_table, TableExtractor};
pub use header::{detect_header_rows, header_paths, rectangularize};

/// Disclosure category of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    /// Dividend disclosures
    Dividend,
    /// Treasury stock acquisition/disposal
    Treasury,
    /// Convertible bonds and bonds with warrants
    CbBw,
    /// Financial statement summaries
    Financials,
    /// Nothing matched
    Unknown,
}

impl TableType {
    /// Snake-case name used in payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableType::Dividend => "dividend",
            TableType::Treasury => "treasury",
            TableType::CbBw => "cb_bw",
            TableType::Financials => "financials",
            TableType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value type of a body cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Blank cell
    Empty,
    /// Parsed as a number
    Number,
    /// Looks like a date or period
    Date,
    /// Yes/no style marker
    Flag,
    /// Anything else
    Text,
}

/// Quality metrics for one table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStats {
    /// Total rows, header included
    pub row_count: usize,
    /// Columns after rectangularization
    pub column_count: usize,
    /// Detected header rows
    pub header_rows: usize,
    /// Non-empty body cells
    pub non_empty_cells: usize,
    /// Non-empty body cells / body cells
    pub non_empty_ratio: f32,
    /// Columns with a non-empty header path / columns
    pub header_coverage: f32,
    /// Numeric body cells / non-empty body cells
    pub numeric_ratio: f32,
}

/// One typed body cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCellPayload {
    /// Body-relative row index
    pub row_index: usize,
    /// Column index
    pub column_index: usize,
    /// Header labels of the cell's column
    pub header_path: Vec<String>,
    /// Cell text as extracted
    pub raw_value: String,
    /// Glyph-folded, whitespace-normalized text
    pub normalized_value: String,
    /// Parsed number, if the cell is numeric
    pub numeric_value: Option<f64>,
    /// Value classification
    pub value_type: ValueType,
    /// Cell confidence in `[0, 1]`
    pub confidence: f32,
}

/// Everything extracted for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableExtractionResult {
    /// 1-based page number
    pub page_number: u32,
    /// Index of the table on its page
    pub table_index: usize,
    /// Table bounding box
    pub bbox: Rect,
    /// Header rows after rectangularization
    pub header_rows: Vec<Vec<String>>,
    /// Body rows after rectangularization
    pub body_rows: Vec<Vec<String>>,
    /// Per-column ordered header labels
    pub header_paths: Vec<Vec<String>>,
    /// Classified type
    pub table_type: TableType,
    /// Keywords that drove the classification
    pub matched_keywords: Vec<String>,
    /// Overall confidence in `[0, 1]`
    pub confidence: f32,
    /// Quality metrics
    pub stats: TableStats,
    /// Escaped HTML rendering
    pub html: String,
    /// Quoted CSV rendering
    pub csv: String,
    /// Canonical JSON payload
    pub json_payload: serde_json::Value,
    /// Typed body cells
    pub cells: Vec<TableCellPayload>,
    /// SHA-256 hex of the canonical payload text
    pub checksum: String,
    /// Per-cell geometry; `None` when the engine could not provide it
    pub cell_bboxes: Option<Vec<Option<Rect>>>,
    /// Seconds spent on this table
    pub duration: f64,
}
