//! HTML, CSV and canonical JSON renderings of a table.

use super::TableStats;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render header rows as `<thead>` and body rows as `<tbody>`.
///
/// # Examples
///
/// ```
/// use filing_extract::tables::render::render_html;
///
/// let html = render_html(&[vec!["A&B".to_string()]], &[vec!["<1>".to_string()]]);
/// assert!(html.contains("<th>A&amp;B</th>"));
/// assert!(html.contains("<td>&lt;1&gt;</td>"));
/// ```
pub fn render_html(header: &[Vec<String>], body: &[Vec<String>]) -> String {
    let mut html = String::from("<table>\n");
    if !header.is_empty() {
        html.push_str("<thead>\n");
        for row in header {
            push_html_row(&mut html, row, "th");
        }
        html.push_str("</thead>\n");
    }
    html.push_str("<tbody>\n");
    for row in body {
        push_html_row(&mut html, row, "td");
    }
    html.push_str("</tbody>\n</table>");
    html
}

fn push_html_row(html: &mut String, row: &[String], tag: &str) {
    html.push_str("<tr>");
    for cell in row {
        html.push('<');
        html.push_str(tag);
        html.push('>');
        html.push_str(&escape_html(cell));
        html.push_str("</");
        html.push_str(tag);
        html.push('>');
    }
    html.push_str("</tr>\n");
}

/// Render header then body rows as CSV with every field quoted.
///
/// # Examples
///
/// ```
/// use filing_extract::tables::render::render_csv;
///
/// let csv = render_csv(&[vec!["a".to_string(), "b\"c".to_string()]], &[]).unwrap();
/// assert_eq!(csv, "\"a\",\"b\"\"c\"\n");
/// ```
pub fn render_csv(header: &[Vec<String>], body: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .flexible(true)
        .from_writer(Vec::new());
    for row in header.iter().chain(body.iter()) {
        writer.write_record(row)?;
    }
    let bytes = writer.into_inner().map_err(|e| Error::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Csv(e.to_string()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalPayload<'a> {
    header_rows: &'a [Vec<String>],
    body_rows: &'a [Vec<String>],
    header_paths: &'a [Vec<String>],
    bbox: Rect,
    metrics: &'a TableStats,
}

/// Build the canonical JSON payload `{headerRows, bodyRows, headerPaths, bbox, metrics}`.
pub fn canonical_payload(
    header: &[Vec<String>],
    body: &[Vec<String>],
    header_paths: &[Vec<String>],
    bbox: Rect,
    metrics: &TableStats,
) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(CanonicalPayload {
        header_rows: header,
        body_rows: body,
        header_paths,
        bbox,
        metrics,
    })?)
}

/// SHA-256 hex digest of the payload's compact JSON text.
///
/// Anyone holding the payload can recompute this value.
pub fn payload_checksum(payload: &serde_json::Value) -> Result<String> {
    let text = serde_json::to_string(payload)?;
    Ok(format!("{:x}", Sha256::digest(text.as_bytes())))
}
