//! Configuration for the extractors.
//!
//! Every knob is an explicit field; nothing is read from the environment.

use crate::tables::TableType;
use std::time::Duration;

/// Settings for the fixed-layout chunker.
#[derive(Debug, Clone)]
pub struct LayoutChunkerConfig {
    /// Maximum vertical gap and x0 shift (points) for two blocks to merge.
    pub merge_tolerance: f32,

    /// A pending paragraph shorter than this (chars) absorbs the next block unconditionally.
    pub min_paragraph_chars: usize,

    /// Fraction of the page height, measured from the bottom, in which marked lines are footnotes.
    pub footnote_band: f32,
}

impl Default for LayoutChunkerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutChunkerConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            merge_tolerance: 12.0,
            min_paragraph_chars: 40,
            footnote_band: 0.2,
        }
    }

    /// Set the merge tolerance in points.
    pub fn with_merge_tolerance(mut self, tolerance: f32) -> Self {
        self.merge_tolerance = tolerance;
        self
    }

    /// Set the minimum paragraph length.
    pub fn with_min_paragraph_chars(mut self, chars: usize) -> Self {
        self.min_paragraph_chars = chars;
        self
    }

    /// Set the footnote band (clamped to `[0, 1]`).
    pub fn with_footnote_band(mut self, band: f32) -> Self {
        self.footnote_band = band.clamp(0.0, 1.0);
        self
    }
}

/// Settings for structured table extraction.
#[derive(Debug, Clone, Default)]
pub struct TableExtractionConfig {
    /// Keep only tables classified as one of these types. `None` keeps all.
    pub target_types: Option<Vec<TableType>>,

    /// Scan at most this many pages.
    pub max_pages: Option<usize>,

    /// Stop once this many tables are collected.
    pub max_tables: Option<usize>,

    /// Wall-clock ceiling for one document, checked between pages.
    pub time_budget: Option<Duration>,
}

impl TableExtractionConfig {
    /// Create new configuration with defaults (everything unlimited).
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict output to the given table types.
    pub fn with_target_types(mut self, types: impl IntoIterator<Item = TableType>) -> Self {
        self.target_types = Some(types.into_iter().collect());
        self
    }

    /// Limit the number of scanned pages.
    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = Some(pages);
        self
    }

    /// Limit the number of returned tables.
    pub fn with_max_tables(mut self, tables: usize) -> Self {
        self.max_tables = Some(tables);
        self
    }

    /// Set the time budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Set the time budget in seconds. Negative or non-finite values mean zero.
    pub fn with_time_budget_secs(self, seconds: f64) -> Self {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self.with_time_budget(Duration::from_secs_f64(seconds))
    }

    /// Whether a table of `table_type` passes the allow-list.
    pub fn accepts(&self, table_type: TableType) -> bool {
        self.target_types
            .as_ref()
            .map_or(true, |types| types.contains(&table_type))
    }
}

/// Settings for the markup extractor.
#[derive(Debug, Clone)]
pub struct MarkupConfig {
    /// Pending paragraph text is flushed once it reaches this many chars.
    pub min_paragraph_chars: usize,

    /// Lists shorter than this (chars) are dropped.
    pub min_list_chars: usize,

    /// Longest text still considered a footnote.
    pub max_footnote_chars: usize,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            min_paragraph_chars: 80,
            min_list_chars: 10,
            max_footnote_chars: 500,
        }
    }

    /// Set the paragraph flush threshold.
    pub fn with_min_paragraph_chars(mut self, chars: usize) -> Self {
        self.min_paragraph_chars = chars;
        self
    }

    /// Set the minimum list length.
    pub fn with_min_list_chars(mut self, chars: usize) -> Self {
        self.min_list_chars = chars;
        self
    }

    /// Set the maximum footnote length.
    pub fn with_max_footnote_chars(mut self, chars: usize) -> Self {
        self.max_footnote_chars = chars;
        self
    }
}
