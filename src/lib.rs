// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::should_implement_trait)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # Filing Extract
//!
//! Structural extraction engine for filing documents. Turns fixed-layout
//! (page-oriented) documents and semi-structured markup filings into one
//! ordered stream of position-addressable [`Chunk`]s, plus fully analyzed
//! tables for the fixed-layout path.
//!
//! ## Core Features
//!
//! - **Fixed-layout chunking**: paragraph re-merging across wrapped blocks,
//!   bottom-band footnote detection, figure captions, per-page character
//!   offsets and percent-of-page coordinates
//! - **Table analysis**: multi-row header detection, header paths, typed and
//!   normalized cells, quality metrics, keyword type classification, HTML /
//!   CSV / canonical JSON renderings with a reproducible checksum
//! - **Locale-aware numerals**: Korean magnitude units (억원, 백만원, ...),
//!   full-width digits, parenthesized and triangle negatives, percentages
//! - **Markup filings**: lenient tag tree, heading hierarchy, paragraph /
//!   list / table / footnote / figure segmentation, per-document dedup
//! - **Integrity**: every fixed-layout chunk carries a SHA-1 `sentence_hash`
//!   of its whitespace-normalized content that an offline verifier can recompute
//!
//! ## Architecture
//!
//! The algorithms never touch a concrete document engine. Fixed-layout
//! documents are read through the narrow capability traits in [`backend`];
//! [`backend::LayoutDumpBackend`] reads a JSON page-layout export.
//!
//! ## Quick Start
//!
//! ```ignore
//! use filing_extract::backend::LayoutDumpBackend;
//! use filing_extract::config::TableExtractionConfig;
//! use filing_extract::{LayoutChunker, MarkupExtractor, TableExtractor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = LayoutDumpBackend::new();
//!
//! let chunks = LayoutChunker::default().extract(&backend, "annual_report.json")?;
//! let tables = TableExtractor::new(TableExtractionConfig::new().with_time_budget_secs(30.0))
//!     .extract(&backend, "annual_report.json")?;
//!
//! let markup_chunks =
//!     MarkupExtractor::default().extract_files(&["filing_2023.xml", "filing_2022.xml"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 (<http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license (<http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Shared data model
pub mod chunk;
pub mod geometry;
pub mod text;

// Configuration
pub mod config;

// Document engine capabilities
pub mod backend;

// Fixed-layout chunking
pub mod extractors;

// Table analysis
pub mod tables;

// Markup filings
pub mod markup;

// Re-exports
pub use chunk::{Chunk, ChunkSource, ChunkType};
pub use error::{Error, Result};
pub use extractors::LayoutChunker;
pub use markup::MarkupExtractor;
pub use tables::{TableExtractionResult, TableExtractor, TableType};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
