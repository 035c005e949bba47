//! Body-cell typing, scoring and table metrics.

use super::{TableCellPayload, TableStats, ValueType};
use crate::text::{looks_date, normalize_glyphs, normalize_whitespace, parse_number};

/// Yes/no style markers, compared upper-cased.
const FLAG_VALUES: &[&str] = &[
    "Y", "N", "YES", "NO", "O", "X", "○", "●", "✓", "V", "예", "아니오", "해당", "미해당", "有",
    "無",
];

/// Classify one cell.
///
/// Returns the value type, the normalized text and the parsed number.
///
/// # Examples
///
/// ```
/// use filing_extract::tables::{classify_value, ValueType};
///
/// assert_eq!(classify_value("1,234").0, ValueType::Number);
/// assert_eq!(classify_value("2023-12-31").0, ValueType::Date);
/// assert_eq!(classify_value("해당").0, ValueType::Flag);
/// assert_eq!(classify_value("보통주").0, ValueType::Text);
/// assert_eq!(classify_value("  ").0, ValueType::Empty);
/// ```
pub fn classify_value(raw: &str) -> (ValueType, String, Option<f64>) {
    let normalized = normalize_whitespace(&normalize_glyphs(raw));
    if normalized.is_empty() {
        return (ValueType::Empty, normalized, None);
    }

    let numeric = parse_number(&normalized);
    let value_type = if numeric.is_some() {
        ValueType::Number
    } else if looks_date(&normalized) {
        ValueType::Date
    } else if FLAG_VALUES.contains(&normalized.to_uppercase().as_str()) {
        ValueType::Flag
    } else {
        ValueType::Text
    };
    (value_type, normalized, numeric)
}

/// Cell confidence: 0.25 base, +0.5 when non-empty, +0.2 when numeric, capped at 1.
pub fn cell_confidence(non_empty: bool, numeric: bool) -> f32 {
    let mut score: f32 = 0.25;
    if non_empty {
        score += 0.5;
    }
    if numeric {
        score += 0.2;
    }
    score.min(1.0)
}

/// Type and score every body cell.
pub fn cell_payloads(body: &[Vec<String>], header_paths: &[Vec<String>]) -> Vec<TableCellPayload> {
    let mut cells = Vec::with_capacity(body.iter().map(|r| r.len()).sum());
    for (row_index, row) in body.iter().enumerate() {
        for (column_index, raw) in row.iter().enumerate() {
            let (value_type, normalized_value, numeric_value) = classify_value(raw);
            let non_empty = value_type != ValueType::Empty;
            cells.push(TableCellPayload {
                row_index,
                column_index,
                header_path: header_paths.get(column_index).cloned().unwrap_or_default(),
                raw_value: raw.clone(),
                normalized_value,
                numeric_value,
                value_type,
                confidence: cell_confidence(non_empty, numeric_value.is_some()),
            });
        }
    }
    cells
}

/// Compute quality metrics from the typed cells.
pub fn table_stats(
    row_count: usize,
    column_count: usize,
    header_rows: usize,
    header_paths: &[Vec<String>],
    cells: &[TableCellPayload],
) -> TableStats {
    let non_empty_cells = cells
        .iter()
        .filter(|c| c.value_type != ValueType::Empty)
        .count();
    let numeric_cells = cells.iter().filter(|c| c.numeric_value.is_some()).count();
    let covered = header_paths.iter().filter(|p| !p.is_empty()).count();

    TableStats {
        row_count,
        column_count,
        header_rows,
        non_empty_cells,
        non_empty_ratio: ratio(non_empty_cells, cells.len()),
        header_coverage: ratio(covered, column_count),
        numeric_ratio: ratio(numeric_cells, non_empty_cells),
    }
}

fn ratio(part: usize, whole: usize) -> f32 {
    if whole == 0 {
        0.0
    } else {
        (part as f32 / whole as f32).clamp(0.0, 1.0)
    }
}
