//! Text normalization shared by every extractor.
//!
//! - [`normalize_whitespace`]: the canonical form hashed into sentence hashes
//!   and deduplication keys
//! - [`numeric`]: locale-aware numeral parsing and date detection

pub mod numeric;

pub use numeric::{looks_date, looks_numeric, normalize_glyphs, parse_number};

/// Collapse every whitespace run to a single space and trim both ends.
///
/// # Examples
///
/// ```
/// use filing_extract::text::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("  a\n\tb   c "), "a b c");
/// assert_eq!(normalize_whitespace("\u{a0}\n"), "");
/// ```
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
