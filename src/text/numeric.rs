//! Numeral normalization for localized filing text.
//!
//! Korean disclosures mix full-width digits, parenthesized negatives,
//! `△`-prefixed negatives, percent values and magnitude-unit suffixes
//! (`억원`, `백만원`, ...). [`parse_number`] folds all of these into a plain
//! `f64`; anything that is not a number comes back as `None`.

use lazy_static::lazy_static;
use regex::Regex;

/// Magnitude suffixes, longest first. At most one is applied.
const UNIT_SUFFIXES: &[(&str, f64)] = &[
    ("억원", 1e8),
    ("천만원", 1e7),
    ("백만원", 1e6),
    ("천원", 1e3),
    ("원", 1.0),
];

/// Characters counted as date separators by the fallback heuristic.
const DATE_SEPARATORS: &[char] = &['-', '.', '/'];

lazy_static! {
    /// Full dates: 2023-12-31, 2023.12.31, 2023/12/31, 2023년 12월 31일
    static ref RE_DATE_YMD: Regex =
        Regex::new(r"^\d{4}\s*[-./년]\s*\d{1,2}\s*[-./월]\s*\d{1,2}\s*[.일]?$").unwrap();

    /// Two-digit-year dates: 23.12.31, 23-1-5
    static ref RE_DATE_SHORT_YEAR: Regex = Regex::new(r"^\d{2}[-./]\d{1,2}[-./]\d{1,2}$").unwrap();

    /// Quarters: 2023 Q4, 2023Q1, 2023년 3분기
    static ref RE_DATE_QUARTER: Regex =
        Regex::new(r"(?i)^(\d{4}\s*q[1-4]|\d{4}년\s*[1-4]\s*분기)$").unwrap();
}

/// Fold full-width digits and punctuation plus dash variants to ASCII.
///
/// # Examples
///
/// ```
/// use filing_extract::text::normalize_glyphs;
///
/// assert_eq!(normalize_glyphs("１２，３４５"), "12,345");
/// assert_eq!(normalize_glyphs("−5"), "-5");
/// ```
pub fn normalize_glyphs(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            '，' => ',',
            '．' => '.',
            '％' => '%',
            '（' => '(',
            '）' => ')',
            '＋' => '+',
            '／' => '/',
            '－' | '−' | '–' | '—' | '‐' | '‑' | '‒' | '﹣' => '-',
            _ => c,
        })
        .collect()
}

/// Parse localized numeral text into a number.
///
/// Steps: glyph folding, separator and whitespace stripping, one unit suffix,
/// parenthesized or `△`/`▲` negatives, then a trailing `%` scales by 0.01.
///
/// # Examples
///
/// ```
/// use filing_extract::text::parse_number;
///
/// assert_eq!(parse_number("(1,234)"), Some(-1234.0));
/// assert_eq!(parse_number("15%"), Some(0.15));
/// assert_eq!(parse_number("1억원"), Some(100_000_000.0));
/// assert_eq!(parse_number(""), None);
/// assert_eq!(parse_number("해당없음"), None);
/// ```
pub fn parse_number(text: &str) -> Option<f64> {
    let folded = normalize_glyphs(text);
    let mut s: String = folded
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if !s.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut multiplier = 1.0;
    if let Some((unit, scale)) = UNIT_SUFFIXES.iter().find(|(unit, _)| s.ends_with(unit)) {
        s.truncate(s.len() - unit.len());
        multiplier = *scale;
    }

    let mut negative = false;
    if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
        negative = true;
        s = s[1..s.len() - 1].to_string();
    }
    if let Some(rest) = s.strip_prefix('△').or_else(|| s.strip_prefix('▲')) {
        negative = !negative;
        s = rest.to_string();
    }

    let mut percent = false;
    if let Some(rest) = s.strip_suffix('%') {
        percent = true;
        s = rest.to_string();
    }

    // f64::from_str accepts "inf"/"nan"; only plain numerals are wanted here
    let plain = |c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E');
    if !s.chars().all(plain) || !s.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut value: f64 = s.parse().ok()?;
    if negative {
        value = -value;
    }
    value *= multiplier;
    if percent {
        value /= 100.0;
    }
    Some(value)
}

/// Whether [`parse_number`] recognizes `text` as a number.
pub fn looks_numeric(text: &str) -> bool {
    parse_number(text).is_some()
}

/// Heuristic date detection for table cells.
///
/// Matches common year-month-day forms, two-digit years and quarter labels;
/// otherwise falls back to "has a separator and is almost all digits".
///
/// # Examples
///
/// ```
/// use filing_extract::text::looks_date;
///
/// assert!(looks_date("2023-12-31"));
/// assert!(looks_date("2023 Q4"));
/// assert!(looks_date("2023.12"));
/// assert!(!looks_date("12.5"));
/// assert!(!looks_date("매출액"));
/// ```
pub fn looks_date(text: &str) -> bool {
    let s = normalize_glyphs(text.trim());
    if s.is_empty() {
        return false;
    }
    if RE_DATE_YMD.is_match(&s)
        || RE_DATE_SHORT_YEAR.is_match(&s)
        || RE_DATE_QUARTER.is_match(&s)
    {
        return true;
    }

    let length = s.chars().count();
    let separators = s.chars().filter(|c| DATE_SEPARATORS.contains(c)).count();
    let digits = s.chars().filter(|c| c.is_ascii_digit()).count();
    separators >= 1 && digits >= 4.max(length - separators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9 * b.abs().max(1.0))
    }

    #[test]
    fn test_parenthesized_negative() {
        assert_eq!(parse_number("(1,234)"), Some(-1234.0));
        assert_eq!(parse_number("（１，２３４）"), Some(-1234.0));
    }

    #[test]
    fn test_triangle_negative() {
        assert_eq!(parse_number("△500"), Some(-500.0));
        assert_eq!(parse_number("▲1,000"), Some(-1000.0));
    }

    #[test]
    fn test_percent() {
        assert!(approx(parse_number("15%"), 0.15));
        assert!(approx(parse_number("１５％"), 0.15));
        assert!(approx(parse_number("(2.5%)"), -0.025));
    }

    #[test]
    fn test_unit_suffixes() {
        assert_eq!(parse_number("1억원"), Some(100_000_000.0));
        assert_eq!(parse_number("3천만원"), Some(30_000_000.0));
        assert_eq!(parse_number("1,500백만원"), Some(1_500_000_000.0));
        assert_eq!(parse_number("12천원"), Some(12_000.0));
        assert_eq!(parse_number("700원"), Some(700.0));
        assert_eq!(parse_number("(1,234)백만원"), Some(-1_234_000_000.0));
    }

    #[test]
    fn test_separators_and_nbsp() {
        assert_eq!(parse_number("1\u{a0}234\u{a0}567"), Some(1_234_567.0));
        assert_eq!(parse_number(" 42 "), Some(42.0));
    }

    #[test]
    fn test_dash_variants() {
        assert_eq!(parse_number("−12"), Some(-12.0));
        assert_eq!(parse_number("–3.5"), Some(-3.5));
    }

    #[test]
    fn test_non_numeric() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("원"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("1,234주"), None);
        assert_eq!(parse_number("2023-12-31"), None);
    }

    #[test]
    fn test_looks_date_patterns() {
        assert!(looks_date("2023.12.31"));
        assert!(looks_date("2023/1/5"));
        assert!(looks_date("2023년 12월 31일"));
        assert!(looks_date("23.12.31"));
        assert!(looks_date("2023Q1"));
        assert!(looks_date("2023년 3분기"));
        assert!(looks_date("２０２３－１２－３１"));
    }

    #[test]
    fn test_looks_date_rejects() {
        assert!(!looks_date(""));
        assert!(!looks_date("1,234"));
        assert!(!looks_date("2023"));
        assert!(!looks_date("제1기"));
    }

    proptest! {
        #[test]
        fn prop_integers_round_trip(n in -1_000_000_000i64..1_000_000_000) {
            prop_assert_eq!(parse_number(&n.to_string()), Some(n as f64));
        }

        #[test]
        fn prop_parenthesized_is_negated(n in 1u32..10_000_000) {
            let text = format!("({})", n);
            prop_assert_eq!(parse_number(&text), Some(-(n as f64)));
        }

        #[test]
        fn prop_letters_only_never_numeric(s in "[a-zA-Z가-힣 ]{0,12}") {
            prop_assert!(parse_number(&s).is_none());
        }
    }
}
