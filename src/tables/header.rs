//! Header span detection and header-path construction.

use crate::backend::RawTable;
use crate::text::{looks_date, looks_numeric};

/// Leading rows inspected when looking for the first data row.
const HEADER_SCAN_ROWS: usize = 4;

/// Turn a ragged raw matrix into a rectangle of cleaned strings.
///
/// Missing cells become `""`, embedded line breaks become spaces, and short
/// rows are right-padded to the longest row.
///
/// # Examples
///
/// ```
/// use filing_extract::tables::rectangularize;
///
/// let raw = vec![
///     vec![Some("a".to_string())],
///     vec![Some("1".to_string()), None, Some("x\ny".to_string())],
/// ];
/// let rows = rectangularize(&raw);
/// assert_eq!(rows, vec![vec!["a", "", ""], vec!["1", "", "x y"]]);
/// ```
pub fn rectangularize(raw: &RawTable) -> Vec<Vec<String>> {
    let width = raw.iter().map(|r| r.len()).max().unwrap_or(0);
    raw.iter()
        .map(|row| {
            let mut cells: Vec<String> = row
                .iter()
                .map(|cell| clean_cell(cell.as_deref().unwrap_or("")))
                .collect();
            cells.resize(width, String::new());
            cells
        })
        .collect()
}

fn clean_cell(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().to_string()
}

/// A row is data when at least half of its non-empty cells are numeric or date-like.
pub fn row_is_data(row: &[String]) -> bool {
    let non_empty: Vec<&str> = row
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if non_empty.is_empty() {
        return false;
    }
    let data = non_empty
        .iter()
        .filter(|c| looks_numeric(c) || looks_date(c))
        .count();
    data * 2 >= non_empty.len()
}

/// Number of header rows at the top of `rows`.
///
/// The header ends at the first data row among the leading rows. At least one
/// row is always a header, so a table whose first row already looks like data
/// uses that row alone as its header. When no data row shows up in the scanned
/// prefix, only the first row is a header.
///
/// # Examples
///
/// ```
/// use filing_extract::tables::detect_header_rows;
///
/// let rows: Vec<Vec<String>> = [
///     ["구분", "제10기", "제9기"],
///     ["", "금액", "금액"],
///     ["매출액", "1,200", "1,100"],
/// ]
/// .iter()
/// .map(|r| r.iter().map(|s| s.to_string()).collect())
/// .collect();
/// assert_eq!(detect_header_rows(&rows), 2);
/// ```
pub fn detect_header_rows(rows: &[Vec<String>]) -> usize {
    if rows.is_empty() {
        return 0;
    }
    rows.iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| row_is_data(row))
        .map_or(1, |first_data| first_data.max(1))
}

/// Build per-column header paths from the header rows.
///
/// Header cells are forward-filled rightward (horizontally merged cells) and
/// then downward (vertically merged cells); each column's path is its distinct
/// non-empty labels read top to bottom.
///
/// # Examples
///
/// ```
/// use filing_extract::tables::header_paths;
///
/// let header: Vec<Vec<String>> = vec![
///     vec!["구분".into(), "2023".into(), "".into()],
///     vec!["".into(), "1Q".into(), "2Q".into()],
/// ];
/// let paths = header_paths(&header);
/// assert_eq!(paths[0], vec!["구분"]);
/// assert_eq!(paths[2], vec!["2023", "2Q"]);
/// ```
pub fn header_paths(header: &[Vec<String>]) -> Vec<Vec<String>> {
    let width = header.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut dense: Vec<Vec<String>> = Vec::with_capacity(header.len());

    for row in header {
        let mut filled = Vec::with_capacity(width);
        let mut carry = String::new();
        for col in 0..width {
            let cell = row.get(col).map(|c| c.trim()).unwrap_or("");
            if cell.is_empty() {
                filled.push(carry.clone());
            } else {
                carry = cell.to_string();
                filled.push(carry.clone());
            }
        }
        dense.push(filled);
    }

    for r in 1..dense.len() {
        for col in 0..width {
            if dense[r][col].is_empty() {
                dense[r][col] = dense[r - 1][col].clone();
            }
        }
    }

    (0..width)
        .map(|col| {
            let mut path: Vec<String> = Vec::new();
            for row in &dense {
                let label = &row[col];
                if !label.is_empty() && !path.contains(label) {
                    path.push(label.clone());
                }
            }
            path
        })
        .collect()
}
