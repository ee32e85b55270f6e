//! Deterministic hierarchical ids such as `p0s2w1`.

use std::collections::{HashMap, HashSet};

use crate::document::{Document, Element, NodeId, ID_ATTR};
use crate::error::AlignmentError;

/// Subtrees under these tags get no ids.
pub const IGNORED_TAGS: [&str; 3] = ["head", "teiHeader", "script"];

const MORPH_TYPES: [&str; 6] = ["morph", "morpheme", "base", "root", "prefix", "suffix"];

/// Per-code counters; cloned on descent so a subtree only sees the counts of
/// its ancestors and of their earlier siblings.
type Counters = HashMap<String, usize>;

fn known_code(element: &Element) -> Option<&'static str> {
    let code = match element.local_name() {
        "text" => "t",
        "body" => "b",
        "div" => "d",
        "page" => "pp",
        "p" => "p",
        "u" => "u",
        "s" => "s",
        "w" => "w",
        "m" => "m",
        "seg" => match element.attribute("type") {
            Some("syll") => "y",
            Some(kind) if MORPH_TYPES.contains(&kind) => "m",
            _ => return None,
        },
        _ => return None,
    };
    Some(code)
}

/// Short code used in generated ids: a known abbreviation or the tag itself.
pub fn id_code(element: &Element) -> &str {
    known_code(element).unwrap_or(element.local_name())
}

/// Return a copy of `doc` where every eligible element has an `id`.
///
/// The root only receives an id when its tag has a known code, so wrapper
/// roots such as `<document>` or `<TEI>` stay anonymous. Do-not-align
/// subtrees get no ids and must not contain `unit_tag` elements.
pub fn assign_ids(doc: &Document, unit_tag: &str) -> Result<Document, AlignmentError> {
    let mut out = doc.clone();
    let root = out.root();
    let mut counters = Counters::new();
    let mut assigner = IdAssigner {
        doc: &mut out,
        unit_tag,
    };
    assigner.visit(root, &mut counters, "", true)?;
    check_unique(&out)?;
    Ok(out)
}

struct IdAssigner<'a> {
    doc: &'a mut Document,
    unit_tag: &'a str,
}

impl IdAssigner<'_> {
    fn visit(
        &mut self,
        id: NodeId,
        counters: &mut Counters,
        parent_id: &str,
        is_root: bool,
    ) -> Result<(), AlignmentError> {
        let node = self.doc.node(id);
        if IGNORED_TAGS.contains(&node.local_name()) {
            return Ok(());
        }
        if node.is_do_not_align() {
            return self.check_dna(id);
        }

        if !node.has_attribute(ID_ATTR) && (!is_root || known_code(node).is_some()) {
            let code = id_code(node).to_string();
            let count = counters.entry(code.clone()).or_insert(0);
            let value = format!("{parent_id}{code}{count}");
            *count += 1;
            self.doc.node_mut(id).set_attribute(ID_ATTR, value);
        }

        let full_id = self
            .doc
            .node(id)
            .attribute(ID_ATTR)
            .unwrap_or_default()
            .to_string();
        let mut child_counters = counters.clone();
        let children = self.doc.children(id).to_vec();
        for child in children {
            self.visit(child, &mut child_counters, &full_id, false)?;
        }
        Ok(())
    }

    fn check_dna(&self, id: NodeId) -> Result<(), AlignmentError> {
        if self.doc.node(id).local_name() == self.unit_tag {
            return Err(AlignmentError::structural(format!(
                "found <{}> element with do-not-align set; units cannot be excluded",
                self.unit_tag
            )));
        }
        if self
            .doc
            .descendants(id)
            .skip(1)
            .any(|inner| self.doc.node(inner).local_name() == self.unit_tag)
        {
            return Err(AlignmentError::structural(format!(
                "found <{}> nested inside a do-not-align element",
                self.unit_tag
            )));
        }
        Ok(())
    }
}

fn check_unique(doc: &Document) -> Result<(), AlignmentError> {
    let mut seen = HashSet::new();
    for id in doc.descendants(doc.root()) {
        if let Some(value) = doc.node(id).attribute(ID_ATTR) {
            if !seen.insert(value) {
                return Err(AlignmentError::structural(format!(
                    "duplicate id \"{value}\""
                )));
            }
        }
    }
    Ok(())
}
