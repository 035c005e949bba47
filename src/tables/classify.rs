//! Keyword-based table type classification.

use super::{TableStats, TableType};
use lazy_static::lazy_static;

/// Body rows, after the header, included in the keyword scan.
const CLASSIFY_BODY_ROWS: usize = 3;

/// Base confidence when no keyword matches.
const UNKNOWN_CONFIDENCE: f32 = 0.35;

lazy_static! {
    /// Keyword sets per table type, in tie-breaking order.
    static ref TYPE_KEYWORDS: Vec<(TableType, Vec<&'static str>)> = vec![
        (
            TableType::Dividend,
            vec!["배당", "주당배당금", "배당금", "배당성향", "시가배당률", "dividend"],
        ),
        (
            TableType::Treasury,
            vec!["자기주식", "자사주", "취득", "처분", "소각", "treasury"],
        ),
        (
            TableType::CbBw,
            vec![
                "전환사채",
                "신주인수권부사채",
                "교환사채",
                "전환가액",
                "행사가액",
                "convertible",
                "warrant",
            ],
        ),
        (
            TableType::Financials,
            vec![
                "매출액",
                "영업이익",
                "당기순이익",
                "자산총계",
                "부채총계",
                "자본총계",
                "revenue",
                "operating income",
                "net income",
                "total assets",
            ],
        ),
    ];
}

/// Outcome of keyword classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Winning type
    pub table_type: TableType,
    /// Keywords of the winning type found in the table
    pub matched_keywords: Vec<String>,
    /// Classification score in `[0, 0.95]`
    pub score: f32,
}

/// Classify a table from its header and first body rows.
///
/// Each type scores `min(0.95, 0.6 + 0.1 * matches)` over a case-insensitive
/// substring scan; the best score wins and ties go to the earlier type.
///
/// # Examples
///
/// ```
/// use filing_extract::tables::{classify_table, TableType};
///
/// let header = vec![vec!["구분".to_string(), "주당배당금(원)".to_string()]];
/// let body = vec![vec!["보통주".to_string(), "1,000".to_string()]];
/// let c = classify_table(&header, &body);
/// assert_eq!(c.table_type, TableType::Dividend);
/// assert!(c.matched_keywords.contains(&"배당".to_string()));
/// ```
pub fn classify_table(header: &[Vec<String>], body: &[Vec<String>]) -> Classification {
    let haystack = header
        .iter()
        .chain(body.iter().take(CLASSIFY_BODY_ROWS))
        .flat_map(|row| row.iter())
        .map(|cell| cell.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    let mut best = Classification {
        table_type: TableType::Unknown,
        matched_keywords: Vec::new(),
        score: UNKNOWN_CONFIDENCE,
    };

    for (table_type, keywords) in TYPE_KEYWORDS.iter() {
        let matched: Vec<String> = keywords
            .iter()
            .filter(|kw| haystack.contains(*kw))
            .map(|kw| kw.to_string())
            .collect();
        if matched.is_empty() {
            continue;
        }
        let score = (0.6 + 0.1 * matched.len() as f32).min(0.95);
        if score > best.score {
            best = Classification {
                table_type: *table_type,
                matched_keywords: matched,
                score,
            };
        }
    }

    log::trace!(
        "Classified table as {} (score {:.2}, keywords {:?})",
        best.table_type,
        best.score,
        best.matched_keywords
    );
    best
}

/// Overall table confidence from the classification score and table metrics, capped at 0.99.
pub fn table_confidence(score: f32, stats: &TableStats) -> f32 {
    let structural = 0.5
        + 0.2 * stats.header_coverage
        + 0.2 * stats.non_empty_ratio
        + 0.05 * stats.numeric_ratio;
    score.max(structural).clamp(0.0, 0.99)
}
