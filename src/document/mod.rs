//! Arena-backed markup tree.
//!
//! Nodes are addressed by [`NodeId`] and keep a parent handle plus ordered
//! child handles, so upward lookups (language, exclusion) are indexed walks.
//! Text follows the lxml convention: `text` precedes the first child, `tail`
//! follows the element's own end tag.

use std::collections::HashMap;

use unicode_normalization::{is_nfc, UnicodeNormalization};

mod xml;

pub use xml::parse_document;

pub const XML_LANG_ATTR: &str = "xml:lang";
pub const LANG_ATTR: &str = "lang";
pub const DNA_ATTR: &str = "do-not-align";
pub const FALLBACK_LANGS_ATTR: &str = "fallback-langs";
pub const ID_ATTR: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub tail: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Same tag and attributes, no content and no links.
    pub fn shallow_clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            attributes: self.attributes.clone(),
            ..Self::default()
        }
    }

    /// The tag without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.tag
            .rsplit_once(':')
            .map_or(self.tag.as_str(), |(_, local)| local)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Own language declaration; `xml:lang` wins over `lang`.
    pub fn declared_lang(&self) -> Option<&str> {
        self.attribute(XML_LANG_ATTR)
            .or_else(|| self.attribute(LANG_ATTR))
    }

    pub fn is_do_not_align(&self) -> bool {
        matches!(
            self.attribute(DNA_ATTR),
            Some("true" | "True" | "TRUE" | "1")
        )
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Element>,
    root: NodeId,
}

impl Document {
    pub fn new(root: Element) -> Self {
        let mut root = root;
        root.parent = None;
        root.children.clear();
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn parse(markup: &str) -> Result<Self, crate::error::AlignmentError> {
        parse_document(markup)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].children.last().copied()
    }

    /// Detached elements only: the incoming handles are reset.
    pub fn append_child(&mut self, parent: NodeId, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut element = element;
        element.parent = Some(parent);
        element.children.clear();
        self.nodes.push(element);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Copy the subtree rooted at `src_id` of `src` under `parent`, verbatim.
    pub fn append_subtree(&mut self, parent: NodeId, src: &Document, src_id: NodeId) -> NodeId {
        let new_id = self.append_child(parent, src.node(src_id).clone());
        for &child in src.children(src_id) {
            self.append_subtree(new_id, src, child);
        }
        new_id
    }

    pub fn ancestors_or_self(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&cur| self.parent(cur))
    }

    /// Language of `id`, resolved through the nearest declaring ancestor.
    pub fn lang(&self, id: NodeId) -> Option<&str> {
        self.ancestors_or_self(id)
            .find_map(|cur| self.node(cur).declared_lang())
    }

    /// Fallback cascade inherited from the nearest ancestor declaring one.
    pub fn fallback_langs(&self, id: NodeId) -> Option<Vec<String>> {
        self.ancestors_or_self(id)
            .find_map(|cur| self.node(cur).attribute(FALLBACK_LANGS_ATTR))
            .map(parse_lang_list)
    }

    /// True when `id` or any ancestor carries the do-not-align flag.
    pub fn in_do_not_align(&self, id: NodeId) -> bool {
        self.ancestors_or_self(id)
            .any(|cur| self.node(cur).is_do_not_align())
    }

    /// Pre-order walk of the subtree rooted at `id`, `id` included.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    pub fn elements_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(self.root)
            .filter(move |&id| self.node(id).local_name() == tag)
    }

    pub fn find_by_id(&self, value: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .find(|&id| self.node(id).attribute(ID_ATTR) == Some(value))
    }

    /// Every `id` attribute in the document mapped to its element. On a
    /// duplicate the first element in document order wins.
    pub fn id_index(&self) -> HashMap<&str, NodeId> {
        let mut index = HashMap::new();
        for id in self.descendants(self.root) {
            if let Some(value) = self.node(id).attribute(ID_ATTR) {
                index.entry(value).or_insert(id);
            }
        }
        index
    }

    /// Text inside the element, descendants' text and tails included, own tail
    /// excluded.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        out.push_str(&node.text);
        for &child in &node.children {
            self.collect_text(child, out);
            out.push_str(&self.node(child).tail);
        }
    }

    /// Ordered `(language, text)` pieces inside `id`, in reading order.
    pub fn language_runs(&self, id: NodeId) -> Vec<(Option<String>, String)> {
        let mut runs = Vec::new();
        self.collect_runs(id, &mut runs);
        runs
    }

    fn collect_runs(&self, id: NodeId, runs: &mut Vec<(Option<String>, String)>) {
        let lang = self.lang(id).map(str::to_string);
        let node = self.node(id);
        if !node.text.is_empty() {
            runs.push((lang.clone(), node.text.clone()));
        }
        for &child in &node.children {
            self.collect_runs(child, runs);
            let tail = &self.node(child).tail;
            if !tail.is_empty() {
                runs.push((lang.clone(), tail.clone()));
            }
        }
    }

    /// Compose every text and tail to Unicode NFC so decomposed and
    /// precomposed input tokenize and convert alike. Attributes are untouched.
    pub fn normalize_unicode(&mut self) {
        for node in &mut self.nodes {
            for text in [&mut node.text, &mut node.tail] {
                if !is_nfc(text.as_str()) {
                    *text = text.as_str().nfc().collect();
                }
            }
        }
    }

    pub fn to_xml_string(&self) -> Result<String, crate::error::AlignmentError> {
        xml::write_document(self, false)
    }

    /// Write the markup to `path` with an XML declaration.
    pub fn save(&self, path: &std::path::Path) -> Result<(), crate::error::AlignmentError> {
        let mut text = xml::write_document(self, true)?;
        text.push('\n');
        std::fs::write(path, text).map_err(|e| crate::error::AlignmentError::io("write markup", e))
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Split a `fallback-langs` value on commas or colons.
pub fn parse_lang_list(value: &str) -> Vec<String> {
    value
        .split([',', ':'])
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .collect()
}
