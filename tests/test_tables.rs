//! Integration tests for structured table extraction.

mod common;

use common::{
    existing_path, init_logging, raw, warnings_mentioning, FakeBackend, FakePage, FakeTable,
};
use filing_extract::backend::RawTable;
use filing_extract::config::TableExtractionConfig;
use filing_extract::geometry::Rect;
use filing_extract::tables::{analyze_table, ValueType};
use filing_extract::{Error, TableExtractionResult, TableExtractor, TableType};
use proptest::prelude::*;
use sha2::{Digest, Sha256};
use std::time::Duration;

fn bbox() -> Rect {
    Rect::from_points(40.0, 100.0, 560.0, 300.0)
}

fn dividend_table() -> RawTable {
    raw(&[
        &["구분", "주식의 종류", "당기", "전기"],
        &["", "", "제55기", "제54기"],
        &["주당 현금배당금(원)", "보통주", "1,444", "1,416"],
        &["현금배당수익률(%)", "보통주", "1.9%", "2.6%"],
        &["현금배당금총액(백만원)", "", "9,809,438", "9,809,438"],
    ])
}

fn financial_table() -> RawTable {
    raw(&[
        &["과목", "2023", "2022"],
        &["매출액", "258,935", "302,231"],
        &["영업이익", "6,567", "43,377"],
    ])
}

fn analyze(table: &RawTable, page_number: u32, index: usize) -> TableExtractionResult {
    analyze_table(table, bbox(), page_number, index).unwrap().unwrap()
}

fn extract(backend: &FakeBackend, config: TableExtractionConfig) -> Vec<TableExtractionResult> {
    init_logging();
    let file = existing_path();
    let extractor = TableExtractor::new(config);
    extractor.extract(backend, file.path()).unwrap()
}

#[test]
fn test_two_text_rows_then_numeric_rows_gives_two_header_rows() {
    let table = raw(&[
        &["구분", "매출", "이익"],
        &["", "금액", "금액"],
        &["국내", "1,000", "100"],
        &["해외", "2,000", "200"],
        &["합계", "3,000", "300"],
    ]);
    let result = analyze(&table, 1, 0);
    assert_eq!(result.stats.header_rows, 2);
    assert_eq!(result.header_rows.len(), 2);
    assert_eq!(result.body_rows.len(), 3);
    assert_eq!(result.header_paths[1], vec!["매출", "금액"]);
}

#[test]
fn test_dividend_table_classified() {
    let result = analyze(&dividend_table(), 12, 1);

    assert_eq!(result.table_type, TableType::Dividend);
    assert!(result.matched_keywords.iter().any(|k| k == "배당"));
    assert_eq!(result.stats.header_rows, 2);
    assert_eq!(result.stats.row_count, 5);
    assert_eq!(result.stats.column_count, 4);
    assert_eq!(result.header_paths[2], vec!["당기", "제55기"]);
    assert_eq!(result.page_number, 12);
    assert_eq!(result.table_index, 1);
    assert!(result.confidence >= 0.6 && result.confidence <= 0.99);
}

#[test]
fn test_cells_are_typed_and_normalized() {
    let result = analyze(&dividend_table(), 1, 0);

    let yield_cell = result
        .cells
        .iter()
        .find(|c| c.row_index == 1 && c.column_index == 2)
        .unwrap();
    assert_eq!(yield_cell.value_type, ValueType::Number);
    assert!((yield_cell.numeric_value.unwrap() - 0.019).abs() < 1e-9);
    assert_eq!(yield_cell.header_path, vec!["당기", "제55기"]);

    let empty = result
        .cells
        .iter()
        .find(|c| c.row_index == 2 && c.column_index == 1)
        .unwrap();
    assert_eq!(empty.value_type, ValueType::Empty);
    assert!((empty.confidence - 0.25).abs() < 1e-6);

    let label = result
        .cells
        .iter()
        .find(|c| c.row_index == 0 && c.column_index == 0)
        .unwrap();
    assert_eq!(label.value_type, ValueType::Text);
    assert!((label.confidence - 0.75).abs() < 1e-6);
}

#[test]
fn test_renderings_and_checksum() {
    let result = analyze(&financial_table(), 1, 0);

    assert!(result.html.contains("<thead>\n<tr><th>과목</th><th>2023</th><th>2022</th></tr>"));
    assert!(result.csv.starts_with("\"과목\",\"2023\",\"2022\"\n"));
    assert_eq!(result.json_payload["bodyRows"][0][1], "258,935");
    assert_eq!(result.json_payload["metrics"]["rowCount"], 3);

    let text = serde_json::to_string(&result.json_payload).unwrap();
    let expected = format!("{:x}", Sha256::digest(text.as_bytes()));
    assert_eq!(result.checksum, expected);

    let again = analyze(&financial_table(), 1, 0);
    assert_eq!(again.checksum, result.checksum);
}

#[test]
fn test_extract_collects_tables_in_page_order() {
    let backend = FakeBackend::new(vec![
        FakePage::new(vec![]).with_table(FakeTable::new(bbox(), financial_table())),
        FakePage::new(vec![])
            .with_table(FakeTable::new(bbox(), dividend_table()))
            .with_table(FakeTable::new(bbox(), raw(&[]))),
    ]);
    let results = extract(&backend, TableExtractionConfig::new());

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].page_number, 1);
    assert_eq!(results[0].table_type, TableType::Financials);
    assert_eq!(results[1].page_number, 2);
    assert_eq!(results[1].table_type, TableType::Dividend);
    assert!(results.iter().all(|r| r.cell_bboxes.is_some()));
    assert!(results.iter().all(|r| r.duration >= 0.0));
}

#[test]
fn test_target_types_filter_does_not_count_toward_max_tables() {
    let backend = FakeBackend::new(vec![
        FakePage::new(vec![])
            .with_table(FakeTable::new(bbox(), financial_table()))
            .with_table(FakeTable::new(bbox(), financial_table())),
        FakePage::new(vec![]).with_table(FakeTable::new(bbox(), dividend_table())),
    ]);
    let config = TableExtractionConfig::new()
        .with_target_types([TableType::Dividend])
        .with_max_tables(1);
    let results = extract(&backend, config);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].table_type, TableType::Dividend);
}

#[test]
fn test_max_tables_and_max_pages() {
    let page = || {
        FakePage::new(vec![])
            .with_table(FakeTable::new(bbox(), financial_table()))
            .with_table(FakeTable::new(bbox(), dividend_table()))
    };
    let backend = FakeBackend::new(vec![page(), page(), page()]);

    let config = TableExtractionConfig::new;
    assert_eq!(extract(&backend, config().with_max_tables(3)).len(), 3);
    assert_eq!(extract(&backend, config().with_max_pages(1)).len(), 2);
    assert!(extract(&backend, config().with_max_tables(0)).is_empty());
}

#[test]
fn test_time_budget_returns_partial_results() {
    let page = || FakePage::new(vec![]).with_table(FakeTable::new(bbox(), financial_table()));
    let mut backend = FakeBackend::new((0..6).map(|_| page()).collect());
    backend.document.locate_delay = Some(Duration::from_millis(40));

    init_logging();
    let file = existing_path();
    let config = TableExtractionConfig::new().with_time_budget(Duration::from_millis(100));
    let extractor = TableExtractor::new(config);
    let results = extractor.extract(&backend, file.path()).unwrap();
    assert!(results.len() < 6, "expected a partial scan, got {}", results.len());

    let warnings = warnings_mentioning(&file.path().display().to_string());
    assert_eq!(warnings.len(), 1, "expected one time budget warning, got {:?}", warnings);
    assert!(warnings[0].contains("time budget"));

    let unlimited = extract(&backend, TableExtractionConfig::new());
    assert_eq!(unlimited.len(), 6);
}

#[test]
fn test_cell_geometry_failure_keeps_table() {
    let backend = FakeBackend::new(vec![FakePage::new(vec![])
        .with_table(FakeTable::new(bbox(), financial_table()).with_broken_cells())]);
    let results = extract(&backend, TableExtractionConfig::new());
    assert_eq!(results.len(), 1);
    assert!(results[0].cell_bboxes.is_none());
    assert_eq!(results[0].body_rows.len(), 2);
}

#[test]
fn test_missing_file_is_not_found() {
    let err = TableExtractor::default()
        .extract(&FakeBackend::default(), "/nonexistent/filing.pdf")
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_engine_failures_are_wrapped() {
    let file = existing_path();

    let mut backend = FakeBackend::new(vec![FakePage::new(vec![])]);
    backend.fail_open = true;
    let extractor = TableExtractor::default();
    let err = extractor.extract(&backend, file.path()).unwrap_err();
    assert!(matches!(err, Error::Extraction { .. }));

    let mut backend = FakeBackend::new(vec![FakePage::new(vec![])]);
    backend.document.locate_fails_on = Some(0);
    let err = extractor.extract(&backend, file.path()).unwrap_err();
    match err {
        Error::Extraction { reason, .. } => assert!(reason.contains("locator crashed")),
        other => panic!("unexpected error: {other}"),
    }
}

fn cell_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        "[가-힣a-z]{1,6}".prop_map(Some),
        "\\(?[0-9]{1,3}(,[0-9]{3}){0,2}\\)?%?".prop_map(Some),
        "20[0-9]{2}-[01][0-9]-[0-3][0-9]".prop_map(Some),
    ]
}

proptest! {
    #[test]
    fn prop_ratios_and_confidence_in_unit_range(
        table in prop::collection::vec(prop::collection::vec(cell_strategy(), 0..6), 0..8)
    ) {
        if let Some(result) = analyze_table(&table, bbox(), 1, 0).unwrap() {
            let s = result.stats;
            for v in [s.header_coverage, s.non_empty_ratio, s.numeric_ratio, result.confidence] {
                prop_assert!((0.0..=1.0).contains(&v), "{} out of range", v);
            }
            prop_assert!(result.cells.iter().all(|c| (0.0..=1.0).contains(&c.confidence)));
            prop_assert!(s.header_rows >= 1);
            prop_assert_eq!(s.row_count, result.header_rows.len() + result.body_rows.len());
        }
    }
}
