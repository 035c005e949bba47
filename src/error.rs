//! Error types for the extraction engine.
//!
//! Fixed-layout and table extraction treat every variant here as fatal for the
//! call. The markup batch entry point catches [`Error::Markup`] and
//! [`Error::NotFound`] per file and keeps going. Numeric parsing never produces
//! an error; it returns `None`.

use std::path::PathBuf;

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during extraction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input path does not exist
    #[error("Input not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The document engine could not open or parse the document
    #[error("Extraction failed for {}: {reason}", path.display())]
    Extraction {
        /// Document being extracted
        path: PathBuf,
        /// Reason reported by the engine
        reason: String,
    },

    /// Per-cell geometry of a table could not be read
    #[error("Cell geometry unavailable: {0}")]
    CellGeometry(String),

    /// A markup document could not be parsed
    #[error("Markup parse failed for {}: {reason}", path.display())]
    Markup {
        /// Markup file being parsed
        path: PathBuf,
        /// Parser failure
        reason: String,
    },

    /// Page index outside the document
    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange {
        /// Requested zero-based page index
        page: usize,
        /// Number of pages in the document
        count: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML tokenizer error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// CSV rendering error
    #[error("CSV error: {0}")]
    Csv(String),
}

impl Error {
    /// Wrap any engine failure as an [`Error::Extraction`] for `path`.
    pub fn extraction(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Extraction {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err.to_string())
    }
}
