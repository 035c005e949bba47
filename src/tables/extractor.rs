//! Document-level table extraction driver.

use super::cells::{cell_payloads, table_stats};
use super::classify::{classify_table, table_confidence};
use super::header::{detect_header_rows, header_paths, rectangularize};
use super::render::{canonical_payload, payload_checksum, render_csv, render_html};
use super::TableExtractionResult;
use crate::backend::{LayoutBackend, LayoutDocument, LocatedTable, RawTable};
use crate::config::TableExtractionConfig;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use std::path::Path;
use std::time::Instant;

/// Analyze one raw table matrix.
///
/// Returns `Ok(None)` for a table with no rows or no columns. Cell geometry is
/// left unset and `duration` is zero; [`TableExtractor`] fills both in.
pub fn analyze_table(
    raw: &RawTable,
    bbox: Rect,
    page_number: u32,
    table_index: usize,
) -> Result<Option<TableExtractionResult>> {
    let rows = rectangularize(raw);
    let column_count = rows.first().map_or(0, |r| r.len());
    if rows.is_empty() || column_count == 0 {
        return Ok(None);
    }

    let header_count = detect_header_rows(&rows).min(rows.len());
    let (header, body) = rows.split_at(header_count);
    let paths = header_paths(header);

    let cells = cell_payloads(body, &paths);
    let stats = table_stats(rows.len(), column_count, header_count, &paths, &cells);
    let classification = classify_table(header, body);
    let confidence = table_confidence(classification.score, &stats);

    let html = render_html(header, body);
    let csv = render_csv(header, body)?;
    let json_payload = canonical_payload(header, body, &paths, bbox, &stats)?;
    let checksum = payload_checksum(&json_payload)?;

    Ok(Some(TableExtractionResult {
        page_number,
        table_index,
        bbox,
        header_rows: header.to_vec(),
        body_rows: body.to_vec(),
        header_paths: paths,
        table_type: classification.table_type,
        matched_keywords: classification.matched_keywords,
        confidence,
        stats,
        html,
        csv,
        json_payload,
        cells,
        checksum,
        cell_bboxes: None,
        duration: 0.0,
    }))
}

/// Extracts structured tables from fixed-layout documents.
///
/// # Examples
///
/// ```ignore
/// use filing_extract::backend::LayoutDumpBackend;
/// use filing_extract::config::TableExtractionConfig;
/// use filing_extract::tables::{TableExtractor, TableType};
///
/// let config = TableExtractionConfig::new()
///     .with_target_types([TableType::Dividend])
///     .with_time_budget_secs(30.0);
/// let tables = TableExtractor::new(config).extract(&LayoutDumpBackend::new(), "report.json")?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableExtractor {
    config: TableExtractionConfig,
}

impl TableExtractor {
    /// Create an extractor with the given limits.
    pub fn new(config: TableExtractionConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &TableExtractionConfig {
        &self.config
    }

    /// Extract every accepted table of the document at `path`, in page order.
    ///
    /// Scanning stops early, returning what was collected so far, once the
    /// time budget is spent (checked before each page) or `max_tables`
    /// accepted tables are collected. Tables rejected by the type allow-list do
    /// not count toward `max_tables`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when `path` does not exist; [`Error::Extraction`]
    /// when the engine fails to open the document, locate tables or read a
    /// table's cells. Failing to read cell geometry is logged and leaves
    /// `cell_bboxes` unset.
    pub fn extract<B: LayoutBackend>(
        &self,
        backend: &B,
        path: impl AsRef<Path>,
    ) -> Result<Vec<TableExtractionResult>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let started = Instant::now();
        let mut doc = backend.open(path).map_err(|e| wrap(path, e))?;
        let page_count = self
            .config
            .max_pages
            .map_or(doc.page_count(), |max| max.min(doc.page_count()));

        let mut results = Vec::new();
        let mut discarded = 0usize;

        'pages: for page in 0..page_count {
            if self.config.max_tables.is_some_and(|max| results.len() >= max) {
                break;
            }
            if let Some(budget) = self.config.time_budget {
                let elapsed = started.elapsed();
                if elapsed >= budget {
                    log::warn!(
                        "{}: hit the {:.2}s time budget after {} of {} pages, returning {} tables",
                        path.display(),
                        budget.as_secs_f64(),
                        page,
                        page_count,
                        results.len()
                    );
                    break;
                }
            }

            let tables = doc.find_tables(page).map_err(|e| wrap(path, e))?;
            for (index, table) in tables.iter().enumerate() {
                let table_started = Instant::now();
                let raw = table.extract().map_err(|e| wrap(path, e))?;
                let Some(mut result) = analyze_table(&raw, table.bbox(), page as u32 + 1, index)?
                else {
                    log::debug!("Skipping empty table {} on page {}", index, page + 1);
                    continue;
                };

                if !self.config.accepts(result.table_type) {
                    log::debug!(
                        "Discarding {} table {} on page {} (not in target types)",
                        result.table_type,
                        index,
                        page + 1
                    );
                    discarded += 1;
                    continue;
                }

                result.cell_bboxes = match table.cells() {
                    Ok(cells) => Some(cells),
                    Err(e) => {
                        log::warn!(
                            "Cell geometry unavailable for table {} on page {}: {}",
                            index,
                            page + 1,
                            e
                        );
                        None
                    },
                };
                result.duration = table_started.elapsed().as_secs_f64();
                results.push(result);

                if self.config.max_tables.is_some_and(|max| results.len() >= max) {
                    log::debug!("Reached max_tables after page {}", page + 1);
                    break 'pages;
                }
            }
        }

        log::info!(
            "Extracted {} tables from {} ({} discarded, {:.3}s)",
            results.len(),
            path.display(),
            discarded,
            started.elapsed().as_secs_f64()
        );
        Ok(results)
    }
}

fn wrap(path: &Path, err: Error) -> Error {
    match err {
        Error::Extraction { .. } => err,
        other => Error::extraction(path, other),
    }
}
