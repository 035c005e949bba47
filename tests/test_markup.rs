//! Integration tests for markup filing extraction.

mod common;

use common::init_logging;
use filing_extract::config::MarkupConfig;
use filing_extract::{Chunk, ChunkSource, ChunkType, Error, MarkupExtractor};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

const FILING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<DOCUMENT>
  <DOCUMENT-NAME>사업보고서</DOCUMENT-NAME>
  <BODY>
    <SECTION-1>
      <TITLE ATOC="Y">I. 회사의 개요</TITLE>
      <SECTION-2>
        <TITLE ATOC="Y">1. 회사의 개요</TITLE>
        <P>당사는 1969년에 설립되어 전자부품의 제조 및 판매를 주요 사업으로 영위하고 있습니다.</P>
        <P>당사의 본사는 경기도 수원시에 위치하고 있습니다.</P>
        <TABLE>
          <TR><TH>구분</TH><TH>제55기</TH><TH>제54기</TH></TR>
          <TR><TD>매출액</TD><TD>258,935</TD><TD>302,231</TD></TR>
        </TABLE>
        <P USERMARK="F-FOOTNOTE">주1) 연결재무제표 기준입니다.</P>
      </SECTION-2>
      <SECTION-2>
        <TITLE ATOC="Y">2. 회사의 연혁</TITLE>
        <UL><LI>2021년 3월: 신규 공장 준공</LI><LI>2022년 7월: 해외 법인 설립</LI></UL>
        <IMG SRC="images/org_chart.jpg"/>
      </SECTION-2>
    </SECTION-1>
  </BODY>
</DOCUMENT>
"#;

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(bytes).unwrap();
    path
}

fn extract_str(name: &str, xml: &str) -> Vec<Chunk> {
    extractor().extract_bytes(name, xml.as_bytes()).unwrap()
}

fn first_of(chunks: &[Chunk], chunk_type: ChunkType) -> &Chunk {
    chunks.iter().find(|c| c.chunk_type == chunk_type).unwrap()
}

fn extractor() -> MarkupExtractor {
    MarkupExtractor::new(MarkupConfig::new().with_min_paragraph_chars(30))
}

#[test]
fn test_filing_segments_into_typed_chunks() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "20240312000736.xml", FILING.as_bytes());

    let chunks = extractor().extract_file(&path).unwrap();
    let types: Vec<ChunkType> = chunks.iter().map(|c| c.chunk_type).collect();
    assert_eq!(
        types,
        vec![
            ChunkType::Text,
            ChunkType::Text,
            ChunkType::Text,
            ChunkType::Table,
            ChunkType::Footnote,
            ChunkType::List,
            ChunkType::Figure,
        ]
    );

    // the document name precedes the first heading
    assert_eq!(chunks[0].content, "사업보고서");
    assert_eq!(chunks[0].metadata["tag"], "document-name");
    assert_eq!(chunks[0].section, None);
    assert!(chunks[1].content.starts_with("당사는 1969년에 설립되어"));
    assert_eq!(chunks[2].content, "당사의 본사는 경기도 수원시에 위치하고 있습니다.");
    assert!(chunks.iter().all(|c| c.source == ChunkSource::Xml));
    assert!(chunks.iter().all(|c| c.page_number.is_none()));
    assert_eq!(chunks[0].id, "20240312000736-000001");
    assert_eq!(chunks[6].id, "20240312000736-000007");
}

#[test]
fn test_section_paths_follow_headings() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "filing.xml", FILING.as_bytes());
    let chunks = extractor().extract_file(&path).unwrap();

    let table = first_of(&chunks, ChunkType::Table);
    assert_eq!(table.section.as_deref(), Some("I. 회사의 개요 > 1. 회사의 개요"));
    assert_eq!(table.metadata["section_title"], "1. 회사의 개요");
    assert_eq!(table.content, "구분 | 제55기 | 제54기\n매출액 | 258,935 | 302,231");
    assert_eq!(table.metadata["rows"][1][2], "302,231");
    assert_eq!(
        table.metadata["path"],
        "/document[1]/body[1]/section-1[1]/section-2[1]/table[1]"
    );

    let list = first_of(&chunks, ChunkType::List);
    assert_eq!(list.section.as_deref(), Some("I. 회사의 개요 > 2. 회사의 연혁"));
    assert_eq!(list.content, "• 2021년 3월: 신규 공장 준공\n• 2022년 7월: 해외 법인 설립");
}

#[test]
fn test_footnote_and_figure_metadata() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "filing.xml", FILING.as_bytes());
    let chunks = extractor().extract_file(&path).unwrap();

    let footnote = first_of(&chunks, ChunkType::Footnote);
    assert_eq!(footnote.content, "주1) 연결재무제표 기준입니다.");
    assert_eq!(footnote.metadata["attributes"]["usermark"], "F-FOOTNOTE");
    let file = path.to_string_lossy().into_owned();
    assert_eq!(footnote.metadata["file"], file.as_str());

    let figure = first_of(&chunks, ChunkType::Figure);
    assert_eq!(figure.content, "Figure: org_chart.jpg");
    assert_eq!(figure.metadata["tag"], "img");
}

#[test]
fn test_identical_content_from_two_nodes_emitted_once() {
    let xml = "<DOCUMENT><BODY>\
               <P>동일한 문단은 한 번만 추출되어야 합니다. 반복되는 면책 조항입니다.</P>\
               <DIV>\
               <P>동일한 문단은   한 번만 추출되어야 합니다.\n반복되는 면책 조항입니다.</P>\
               </DIV>\
               </BODY></DOCUMENT>";
    let chunks = extract_str("dup.xml", xml);
    assert_eq!(chunks.len(), 1);
}

#[test]
fn test_legacy_encoding_is_decoded() {
    // <P>가나다</P> in EUC-KR
    let mut bytes = b"<?xml version=\"1.0\" encoding=\"EUC-KR\"?><DOCUMENT><P>".to_vec();
    bytes.extend_from_slice(b"\xb0\xa1\xb3\xaa\xb4\xd9");
    bytes.extend_from_slice(b"</P></DOCUMENT>");

    let chunks = extractor().extract_bytes("euckr.xml", &bytes).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, "가나다");
}

#[test]
fn test_batch_skips_missing_and_malformed_files() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let good = write_file(&dir, "good.xml", FILING.as_bytes());
    let broken = write_file(&dir, "broken.xml", b"<DOCUMENT><P>text</P><!-- never closed");
    let missing = dir.path().join("missing.xml");

    let err = extractor().extract_file(&broken).unwrap_err();
    assert!(matches!(err, Error::Markup { .. }));

    let batch = extractor().extract_files(&[missing, broken, good.clone()]);
    let single = extractor().extract_file(&good).unwrap();
    assert_eq!(batch, single);
}

#[test]
fn test_missing_single_file_is_not_found() {
    let err = extractor().extract_file("/nonexistent/filing.xml").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_short_lists_are_dropped() {
    let xml = "<DOCUMENT><UL><LI>a</LI><LI>b</LI></UL></DOCUMENT>";
    let chunks = extract_str("list.xml", xml);
    assert!(chunks.is_empty());
}
