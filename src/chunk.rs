//! The chunk record shared by every extractor.
//!
//! A [`Chunk`] is one normalized, independently addressable unit of extracted
//! content. Both chunk extractors emit nothing but chunks, and downstream
//! storage and QA tooling read them as plain data.

use crate::text::normalize_whitespace;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;

/// Insertion-ordered metadata attached to a chunk.
pub type ChunkMetadata = IndexMap<String, serde_json::Value>;

/// Kind of content a chunk carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    /// Running body text
    Text,
    /// Table rendered as text
    Table,
    /// Footnote or note
    Footnote,
    /// Figure caption
    Figure,
    /// Bulleted or numbered list
    List,
}

impl ChunkType {
    /// Lowercase name used in payloads and dedup keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Text => "text",
            ChunkType::Table => "table",
            ChunkType::Footnote => "footnote",
            ChunkType::Figure => "figure",
            ChunkType::List => "list",
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document family a chunk was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkSource {
    /// Fixed-layout (page-oriented) document
    Pdf,
    /// Markup filing
    Xml,
}

/// One normalized content unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier, unique within one extraction run
    pub id: String,
    /// Content kind
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    /// Trimmed content, never empty
    pub content: String,
    /// Heading path the chunk sits under, if known
    pub section: Option<String>,
    /// Source document family
    pub source: ChunkSource,
    /// 1-based page number for fixed-layout documents
    pub page_number: Option<u32>,
    /// Source-specific metadata
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Build a chunk, trimming `content`.
    ///
    /// Returns `None` when nothing but whitespace remains; such content is
    /// never emitted.
    ///
    /// # Examples
    ///
    /// ```
    /// use filing_extract::chunk::{Chunk, ChunkSource, ChunkType};
    ///
    /// let chunk =
    ///     Chunk::new("pdf-000001", ChunkType::Text, "  hello ", ChunkSource::Pdf, None).unwrap();
    /// assert_eq!(chunk.content, "hello");
    ///
    /// let blank = Chunk::new("pdf-000002", ChunkType::Text, " \n\t", ChunkSource::Pdf, None);
    /// assert!(blank.is_none());
    /// ```
    pub fn new(
        id: impl Into<String>,
        chunk_type: ChunkType,
        content: &str,
        source: ChunkSource,
        metadata: Option<ChunkMetadata>,
    ) -> Option<Self> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        Some(Self {
            id: id.into(),
            chunk_type,
            content: content.to_string(),
            section: None,
            source,
            page_number: None,
            metadata: metadata.unwrap_or_default(),
        })
    }

    /// Set the page number.
    pub fn with_page(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    /// Set the section label.
    pub fn with_section(mut self, section: Option<String>) -> Self {
        self.section = section;
        self
    }

    /// Sentence hash recorded in the metadata, if any.
    pub fn sentence_hash(&self) -> Option<&str> {
        self.metadata.get("sentence_hash").and_then(|v| v.as_str())
    }
}

/// Monotonically increasing chunk identifiers for one document.
///
/// # Examples
///
/// ```
/// use filing_extract::chunk::ChunkIdSequence;
///
/// let mut ids = ChunkIdSequence::new("pdf");
/// assert_eq!(ids.next_id(), "pdf-000001");
/// assert_eq!(ids.next_id(), "pdf-000002");
/// ```
#[derive(Debug, Clone)]
pub struct ChunkIdSequence {
    prefix: String,
    issued: u64,
}

impl ChunkIdSequence {
    /// Start a sequence whose ids are `{prefix}-{n:06}`, counting from 1.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            issued: 0,
        }
    }

    /// Issue the next identifier.
    pub fn next_id(&mut self) -> String {
        self.issued += 1;
        format!("{}-{:06}", self.prefix, self.issued)
    }

    /// Number of identifiers issued so far.
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

/// SHA-1 hex digest of the whitespace-normalized `content`.
///
/// Returns `None` for content that normalizes to the empty string. An offline
/// verifier recomputes this value from chunk content, so the normalization
/// must stay [`normalize_whitespace`].
///
/// # Examples
///
/// ```
/// use filing_extract::chunk::sentence_hash;
///
/// assert_eq!(sentence_hash("a  b\n"), sentence_hash("a b"));
/// assert_eq!(sentence_hash("   "), None);
/// ```
pub fn sentence_hash(content: &str) -> Option<String> {
    let normalized = normalize_whitespace(content);
    if normalized.is_empty() {
        return None;
    }
    Some(format!("{:x}", Sha1::digest(normalized.as_bytes())))
}
