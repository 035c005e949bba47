//! Chunk extraction from fixed-layout documents.

pub mod layout;

pub use layout::{extract_layout_chunks, CharCursor, LayoutChunker, PendingParagraph};
