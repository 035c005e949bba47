//! Heading hierarchy tracking for markup filings.

use lazy_static::lazy_static;
use regex::Regex;

/// Deepest level produced by dotted numeric outlines.
const MAX_OUTLINE_DEPTH: usize = 4;

lazy_static! {
    static ref RE_KOREAN_PART: Regex = Regex::new(r"^제?\s*\d+\s*(장|절|항)").unwrap();
    static ref RE_ITEM: Regex = Regex::new(r"(?i)^item\s+\d+[a-z]?\b").unwrap();
    static ref RE_ROMAN: Regex = Regex::new(r"^[IVXLC]+\s*[.)]\s*").unwrap();
    static ref RE_OUTLINE: Regex =
        Regex::new(r"^(?:(\d+(?:\.\d+)+)(?:[.)]|\s|$)|(\d+)[.)])").unwrap();
}

/// Outline marker found at the start of a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    /// Document part with a fixed level (`제1장`, `ITEM 7`, `II.`)
    Part(usize),
    /// Numeric outline of the given depth (`1.`, `2.1`)
    Outline(usize),
}

fn heading_marker(title: &str) -> Option<Marker> {
    let title = title.trim();
    if let Some(caps) = RE_KOREAN_PART.captures(title) {
        return Some(Marker::Part(match &caps[1] {
            "장" => 1,
            "절" => 2,
            _ => 3,
        }));
    }
    if RE_ITEM.is_match(title) || RE_ROMAN.is_match(title) {
        return Some(Marker::Part(1));
    }
    let caps = RE_OUTLINE.captures(title)?;
    let outline = caps.get(1).or_else(|| caps.get(2))?.as_str();
    Some(Marker::Outline(outline.split('.').count().min(MAX_OUTLINE_DEPTH)))
}

/// Infer a heading level from its text.
///
/// - `제1장` / `제1절` / `제1항` map to levels 1, 2 and 3
/// - `ITEM 7` and Roman-numeral outlines (`II.`) are level 1
/// - numeric outlines (`3.`, `1.2.3`) take their depth, capped at 4
///
/// A bare number needs a `.` or `)` after it to count as an outline.
///
/// # Examples
///
/// ```
/// use filing_extract::markup::sections::heading_level;
///
/// assert_eq!(heading_level("제2장 사업의 내용"), Some(1));
/// assert_eq!(heading_level("제3절 재무제표"), Some(2));
/// assert_eq!(heading_level("ITEM 7. Management's Discussion"), Some(1));
/// assert_eq!(heading_level("1.2.3 세부사항"), Some(3));
/// assert_eq!(heading_level("2023 Annual Report"), None);
/// assert_eq!(heading_level("회사의 개요"), None);
/// ```
pub fn heading_level(title: &str) -> Option<usize> {
    heading_marker(title).map(|marker| match marker {
        Marker::Part(level) | Marker::Outline(level) => level,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SectionEntry {
    level: usize,
    part: bool,
    title: String,
}

/// Stack of the headings enclosing the current position.
///
/// A new heading replaces every open heading at its level or deeper.
/// Numeric outlines nest below the innermost open document part.
///
/// # Examples
///
/// ```
/// use filing_extract::markup::sections::SectionTracker;
///
/// let mut tracker = SectionTracker::new();
/// tracker.enter("I. 회사의 개요", 1);
/// tracker.enter("1. 회사의 개요", 2);
/// tracker.enter("2. 회사의 연혁", 2);
/// assert_eq!(tracker.path().as_deref(), Some("I. 회사의 개요 > 2. 회사의 연혁"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SectionTracker {
    stack: Vec<SectionEntry>,
}

impl SectionTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a heading, returning the level it was placed at.
    ///
    /// Part markers (`제1장`, `ITEM 7`, `II.`) fix the level. Numeric
    /// outlines are offset by the innermost open part. `structural_level`
    /// comes from the markup nesting (`h2`, `section-2`) and applies only
    /// when the title carries no marker.
    pub fn enter(&mut self, title: &str, structural_level: usize) -> usize {
        let marker = heading_marker(title);
        let level = match marker {
            Some(Marker::Part(level)) => level,
            Some(Marker::Outline(depth)) => self.part_level() + depth,
            None => structural_level.max(1),
        };
        while self.stack.last().is_some_and(|top| top.level >= level) {
            self.stack.pop();
        }
        self.stack.push(SectionEntry {
            level,
            part: matches!(marker, Some(Marker::Part(_))),
            title: title.trim().to_string(),
        });
        level
    }

    fn part_level(&self) -> usize {
        let innermost = self.stack.iter().rev().find(|e| e.part);
        innermost.map_or(0, |e| e.level)
    }

    /// Number of open headings.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Innermost heading title.
    pub fn title(&self) -> Option<&str> {
        self.stack.last().map(|e| e.title.as_str())
    }

    /// Open headings joined outermost first with ` > `.
    pub fn path(&self) -> Option<String> {
        if self.stack.is_empty() {
            return None;
        }
        Some(
            self.stack
                .iter()
                .map(|e| e.title.as_str())
                .collect::<Vec<_>>()
                .join(" > "),
        )
    }
}
