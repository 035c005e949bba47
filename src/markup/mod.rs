//! Markup filing extraction.
//!
//! A single ordered pass over a lenient tag tree ([`tree::MarkupTree`]) tracks
//! the heading hierarchy ([`sections::SectionTracker`]) and dispatches every
//! element through [`extractor::classify_node`]:
//!
//! | Role      | Effect                                             |
//! |-----------|----------------------------------------------------|
//! | Skip      | script, style or head, subtree dropped             |
//! | Heading   | updates the section stack, never a chunk           |
//! | Table     | row/cell matrix, subtree consumed                  |
//! | List      | bullet-joined items, subtree consumed              |
//! | Footnote  | short note chunk, subtree consumed                 |
//! | Figure    | caption chunk, subtree consumed                    |
//! | Paragraph | text appended to the pending paragraph buffer      |
//! | Container | children visited                                   |
//!
//! Exact repeats of `type:content` within one document are dropped.

pub mod extractor;
pub mod sections;
pub mod tree;

pub use extractor::{classify_node, MarkupExtractor, NodeRole};
pub use sections::{heading_level, SectionTracker};
pub use tree::{decode_markup, MarkupTree, NodeId};
