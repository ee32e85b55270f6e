//! Wraps word-like text in unit elements.

use crate::document::{Document, Element, NodeId};
use crate::lang::LanguageRegistry;
use crate::pipeline::traits::LanguageBackend;

/// Tags copied through untouched besides the unit tag itself.
pub const RESERVED_TAGS: [&str; 2] = ["teiHeader", "head"];

/// Return an NFC-normalized copy of `doc` where every word-like run of text
/// sits in its own `unit_tag` element. Units, reserved tags and
/// do-not-align subtrees are copied verbatim. A document that already holds
/// units is only normalized.
pub fn tokenize(doc: &Document, registry: &LanguageRegistry, unit_tag: &str) -> Document {
    let mut normalized = doc.clone();
    normalized.normalize_unicode();
    let doc = normalized;

    let existing = doc.elements_with_tag(unit_tag).next();
    if let Some(existing) = existing {
        tracing::info!(
            unit_tag,
            first = ?doc.node(existing).attribute("id"),
            "units already present; skipping tokenization"
        );
        return doc;
    }
    tracing::info!(unit_tag, "tokenizing document");

    let tokenizer = XmlTokenizer {
        src: &doc,
        registry,
        unit_tag,
    };
    let root = doc.root();
    if tokenizer.is_verbatim(root) {
        return doc;
    }
    let mut out = Document::new(doc.node(root).shallow_clone());
    let out_root = out.root();
    tokenizer.fill(root, &mut out, out_root);
    out
}

struct XmlTokenizer<'a> {
    src: &'a Document,
    registry: &'a LanguageRegistry,
    unit_tag: &'a str,
}

impl XmlTokenizer<'_> {
    fn is_verbatim(&self, id: NodeId) -> bool {
        let node = self.src.node(id);
        node.local_name() == self.unit_tag
            || RESERVED_TAGS.contains(&node.local_name())
            || node.is_do_not_align()
    }

    fn fill(&self, src_id: NodeId, out: &mut Document, out_id: NodeId) {
        let backend = self.registry.for_lang(self.src.lang(src_id));
        let node = self.src.node(src_id);
        self.push_text(out, out_id, backend, &node.text);

        for &child in node.children() {
            if self.is_verbatim(child) {
                let copied = out.append_subtree(out_id, self.src, child);
                // the tail is re-tokenized below
                out.node_mut(copied).tail.clear();
            } else {
                let new_child = out.append_child(out_id, self.src.node(child).shallow_clone());
                self.fill(child, out, new_child);
            }
            self.push_text(out, out_id, backend, &self.src.node(child).tail);
        }
    }

    fn push_text(
        &self,
        out: &mut Document,
        parent: NodeId,
        backend: &dyn LanguageBackend,
        text: &str,
    ) {
        if text.is_empty() {
            return;
        }
        for unit in backend.tokenize(text) {
            if unit.is_word {
                out.append_child(parent, Element::with_text(self.unit_tag, unit.text));
                continue;
            }
            match out.last_child(parent) {
                Some(last) => out.node_mut(last).tail.push_str(&unit.text),
                None => out.node_mut(parent).text.push_str(&unit.text),
            }
        }
    }
}
