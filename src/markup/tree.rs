//! Lenient arena tree over a markup document.
//!
//! Filings in the wild are rarely well-formed: stray closing tags, undeclared
//! HTML entities and legacy encodings are common. The tree builder therefore
//! never checks end names, closes elements up to the nearest matching open
//! ancestor, and keeps undecodable entity text verbatim.

use crate::error::Result;
use crate::text::normalize_whitespace;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use regex::bytes::Regex;
use std::borrow::Cow;

/// Bytes inspected for an encoding declaration.
const ENCODING_SNIFF_BYTES: usize = 200;

lazy_static! {
    static ref RE_ENCODING_DECL: Regex =
        Regex::new(r#"(?i)encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#).unwrap();
}

/// Decode raw markup bytes to text.
///
/// The declared encoding is sniffed from the first bytes of the document. An
/// unknown or missing declaration decodes as UTF-8; invalid sequences are
/// replaced rather than rejected.
///
/// # Examples
///
/// ```
/// use filing_extract::markup::tree::decode_markup;
///
/// // "가" in EUC-KR
/// let bytes = b"<?xml version=\"1.0\" encoding=\"EUC-KR\"?><P>\xb0\xa1</P>";
/// assert!(decode_markup(bytes).contains("<P>가</P>"));
/// ```
pub fn decode_markup(bytes: &[u8]) -> String {
    let head = &bytes[..bytes.len().min(ENCODING_SNIFF_BYTES)];
    let encoding = RE_ENCODING_DECL
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::debug!("Replaced malformed {} sequences while decoding markup", used.name());
    }
    text.into_owned()
}

/// Index of a node in a [`MarkupTree`].
pub type NodeId = usize;

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Element with lowercased name and attributes in document order
    Element {
        /// Lowercased tag name
        name: String,
        /// Attributes keyed by lowercased name
        attributes: IndexMap<String, String>,
    },
    /// Character data
    Text(String),
}

/// One node of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node payload
    pub kind: NodeKind,
    /// Parent node, `None` only for the synthetic root
    pub parent: Option<NodeId>,
    /// Children in document order
    pub children: Vec<NodeId>,
}

/// Arena-allocated markup tree with a synthetic root at [`MarkupTree::ROOT`].
#[derive(Debug, Clone)]
pub struct MarkupTree {
    nodes: Vec<Node>,
}

impl MarkupTree {
    /// The synthetic root holding every top-level node.
    pub const ROOT: NodeId = 0;

    /// Parse decoded markup text.
    ///
    /// # Examples
    ///
    /// ```
    /// use filing_extract::markup::tree::MarkupTree;
    ///
    /// let tree = MarkupTree::parse("<DOC><P>one</P><P>two</SPAN></P></DOC>").unwrap();
    /// let doc = tree.children(MarkupTree::ROOT)[0];
    /// assert_eq!(tree.name(doc), Some("doc"));
    /// assert_eq!(tree.text(doc), "one two");
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut tree = MarkupTree {
            nodes: vec![Node {
                kind: NodeKind::Element {
                    name: String::new(),
                    attributes: IndexMap::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
        };

        let mut reader = Reader::from_str(text);
        reader.check_end_names(false);
        reader.expand_empty_elements(false);

        let mut open: Vec<NodeId> = vec![Self::ROOT];
        loop {
            let top = open.last().copied().unwrap_or(Self::ROOT);
            match reader.read_event()? {
                Event::Start(e) => {
                    let id = tree.push_element(top, &e);
                    open.push(id);
                },
                Event::Empty(e) => {
                    tree.push_element(top, &e);
                },
                Event::End(e) => {
                    let name = lower_name(e.name().as_ref());
                    let matching = open
                        .iter()
                        .rposition(|&id| id != Self::ROOT && tree.name(id) == Some(name.as_str()));
                    match matching {
                        Some(pos) => open.truncate(pos),
                        None => log::trace!("Ignoring unmatched closing tag </{}>", name),
                    }
                },
                Event::Text(e) => {
                    let text = unescape_lenient(&e);
                    tree.push_text(top, &text);
                },
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    tree.push_text(top, &text);
                },
                Event::Eof => break,
                _ => {},
            }
        }

        Ok(tree)
    }

    fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn push_element(&mut self, parent: NodeId, start: &BytesStart<'_>) -> NodeId {
        let name = lower_name(start.name().as_ref());
        let mut attributes = IndexMap::new();
        for attr in start.attributes().with_checks(false).flatten() {
            let key = lower_name(attr.key.as_ref());
            let value = match attr.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            attributes.insert(key, value);
        }
        self.push_node(parent, NodeKind::Element { name, attributes })
    }

    fn push_text(&mut self, parent: NodeId, text: &str) {
        if !text.trim().is_empty() {
            self.push_node(parent, NodeKind::Text(text.to_string()));
        }
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document produced no nodes besides the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Children of `id` in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Lowercased element name, `None` for text nodes.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Text(_) => None,
        }
    }

    /// Attributes of an element; empty for text nodes.
    pub fn attributes(&self, id: NodeId) -> Option<&IndexMap<String, String>> {
        match &self.nodes[id].kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            NodeKind::Text(_) => None,
        }
    }

    /// Attribute value by lowercase name.
    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.attributes(id)?.get(key).map(String::as_str)
    }

    /// Raw text of a text node.
    pub fn raw_text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    /// Element children of `id`.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.name(c).is_some())
    }

    /// Descendant elements of `id` named `name`, in document order.
    pub fn descendants_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.name(node) == Some(name) {
                found.push(node);
            }
            stack.extend(self.children(node).iter().rev());
        }
        found
    }

    /// Whitespace-normalized text of the subtree, pieces joined by spaces.
    pub fn text(&self, id: NodeId) -> String {
        let mut pieces = Vec::new();
        self.collect_text(id, &mut pieces, usize::MAX);
        normalize_whitespace(&pieces.join(" "))
    }

    /// Like [`MarkupTree::text`] but gives up once more than `limit` raw
    /// characters have been gathered.
    pub fn text_within(&self, id: NodeId, limit: usize) -> Option<String> {
        let mut pieces = Vec::new();
        if !self.collect_text(id, &mut pieces, limit) {
            return None;
        }
        let text = normalize_whitespace(&pieces.join(" "));
        (text.chars().count() <= limit).then_some(text)
    }

    fn collect_text<'a>(&'a self, id: NodeId, pieces: &mut Vec<&'a str>, limit: usize) -> bool {
        let mut gathered = 0usize;
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            match &self.nodes[node].kind {
                NodeKind::Text(text) => {
                    gathered += text.trim().chars().count();
                    if gathered > limit {
                        return false;
                    }
                    pieces.push(text);
                },
                NodeKind::Element { .. } => stack.extend(self.nodes[node].children.iter().rev()),
            }
        }
        true
    }

    /// XPath-like location of `id`, e.g. `/document[1]/body[1]/p[3]`.
    ///
    /// Each step counts same-named preceding element siblings, starting at 1.
    pub fn structural_path(&self, id: NodeId) -> String {
        let mut steps = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if let Some(name) = self.name(current) {
                let position = self
                    .element_children(parent)
                    .take_while(|&sibling| sibling != current)
                    .filter(|&sibling| self.name(sibling) == Some(name))
                    .count()
                    + 1;
                steps.push(format!("{}[{}]", name, position));
            }
            current = parent;
        }
        steps.reverse();
        format!("/{}", steps.join("/"))
    }
}

fn lower_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_lowercase()
}

fn unescape_lenient(text: &BytesText<'_>) -> String {
    match text.unescape() {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => String::from_utf8_lossy(text).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_builds_nested_elements() {
        let xml = r#"<DOCUMENT><BODY><P CLASS="a">x</P><P>y</P></BODY></DOCUMENT>"#;
        let tree = MarkupTree::parse(xml).unwrap();
        let doc = tree.children(MarkupTree::ROOT)[0];
        let body = tree.children(doc)[0];
        let ps: Vec<_> = tree.element_children(body).collect();
        assert_eq!(ps.len(), 2);
        assert_eq!(tree.attribute(ps[0], "class"), Some("a"));
        assert_eq!(tree.text(body), "x y");
    }

    #[test]
    fn test_structural_path_counts_same_named_siblings() {
        let xml = "<document><body><p>a</p><table/><p>b</p><p>c</p></body></document>";
        let tree = MarkupTree::parse(xml).unwrap();
        let ps = tree.descendants_named(MarkupTree::ROOT, "p");
        assert_eq!(tree.structural_path(ps[2]), "/document[1]/body[1]/p[3]");
        let table = tree.descendants_named(MarkupTree::ROOT, "table")[0];
        assert_eq!(tree.structural_path(table), "/document[1]/body[1]/table[1]");
    }

    #[test]
    fn test_unmatched_closer_is_ignored() {
        let tree = MarkupTree::parse("<a><b>one</c></b><b>two</b></a>").unwrap();
        let a = tree.children(MarkupTree::ROOT)[0];
        assert_eq!(tree.element_children(a).count(), 2);
    }

    #[test]
    fn test_closer_pops_to_matching_ancestor() {
        // <i> is never closed; </b> closes it implicitly
        let tree = MarkupTree::parse("<a><b><i>x</b><c>y</c></a>").unwrap();
        let a = tree.children(MarkupTree::ROOT)[0];
        let names: Vec<_> = tree
            .element_children(a)
            .filter_map(|c| tree.name(c))
            .collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_unknown_entity_keeps_raw_text() {
        let tree = MarkupTree::parse("<p>a&nbsp;b &amp; c</p>").unwrap();
        let p = tree.children(MarkupTree::ROOT)[0];
        assert_eq!(tree.text(p), "a&nbsp;b &amp; c");
    }

    #[test]
    fn test_known_entities_unescaped() {
        let tree = MarkupTree::parse("<p>a &lt; b</p>").unwrap();
        let p = tree.children(MarkupTree::ROOT)[0];
        assert_eq!(tree.text(p), "a < b");
    }

    #[test]
    fn test_text_within_limit() {
        let tree = MarkupTree::parse("<p>abcdef</p>").unwrap();
        let p = tree.children(MarkupTree::ROOT)[0];
        assert_eq!(tree.text_within(p, 10).as_deref(), Some("abcdef"));
        assert_eq!(tree.text_within(p, 3), None);
    }

    #[test]
    fn test_decode_without_declaration_is_utf8() {
        assert_eq!(decode_markup("<p>한글</p>".as_bytes()), "<p>한글</p>");
        assert_eq!(decode_markup(b"<p>\xff</p>"), "<p>\u{fffd}</p>");
    }

    #[test]
    fn test_decode_unknown_label_falls_back() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"x-unknown\"?><p>ok</p>";
        assert!(decode_markup(bytes).ends_with("<p>ok</p>"));
    }
}
