//! Pronunciation dictionary and the linear grammar handed to the engine.

use std::path::Path;

use crate::document::{Document, NodeId, ID_ATTR};
use crate::error::AlignmentError;
use crate::text::convert::PRONUNCIATION_ATTR;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub id: String,
    pub pronunciation: String,
}

/// Units with a non-empty pronunciation, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dictionary {
    entries: Vec<DictionaryEntry>,
}

impl Dictionary {
    /// Build from every unit in the document outside do-not-align zones.
    pub fn from_document(doc: &Document, unit_tag: &str) -> Result<Self, AlignmentError> {
        let units: Vec<NodeId> = doc
            .elements_with_tag(unit_tag)
            .filter(|&id| !doc.in_do_not_align(id))
            .collect();
        Self::from_units(doc, &units)
    }

    pub fn from_units(doc: &Document, units: &[NodeId]) -> Result<Self, AlignmentError> {
        let mut entries = Vec::with_capacity(units.len());
        for &unit in units {
            let node = doc.node(unit);
            let pronunciation = node.attribute(PRONUNCIATION_ATTR).unwrap_or_default().trim();
            if pronunciation.is_empty() {
                continue;
            }
            let id = node.attribute(ID_ATTR).ok_or_else(|| {
                AlignmentError::structural(format!(
                    "<{}> element \"{}\" has no id",
                    node.tag,
                    doc.text_content(unit)
                ))
            })?;
            entries.push(DictionaryEntry {
                id: id.to_string(),
                pronunciation: pronunciation.to_string(),
            });
        }
        if entries.is_empty() {
            return Err(AlignmentError::NoWordsToAlign);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.pronunciation.as_str())
    }

    /// `id<TAB>phones` per line.
    pub fn to_dict_string(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("{}\t{}\n", entry.id, entry.pronunciation))
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<(), AlignmentError> {
        std::fs::write(path, self.to_dict_string())
            .map_err(|e| AlignmentError::io("write dictionary", e))
    }
}

/// A non-branching acceptor: state `i` goes to `i + 1` on the i-th
/// dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    name: String,
    transitions: Vec<String>,
}

impl Grammar {
    pub const TRANSITION_WEIGHT: &'static str = "1.0";

    pub fn linear(name: &str, dictionary: &Dictionary) -> Self {
        let name = match slugify(name) {
            slug if slug.is_empty() => "grammar".to_string(),
            slug => slug,
        };
        Self {
            name,
            transitions: dictionary
                .entries()
                .iter()
                .map(|entry| entry.id.clone())
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit ids in acceptance order.
    pub fn transitions(&self) -> &[String] {
        &self.transitions
    }

    pub fn num_states(&self) -> usize {
        self.transitions.len() + 1
    }

    pub fn final_state(&self) -> usize {
        self.transitions.len()
    }

    pub fn to_fsg_string(&self) -> String {
        let mut out = format!(
            "FSG_BEGIN {}\nNUM_STATES {}\nSTART_STATE 0\nFINAL_STATE {}\n\n",
            self.name,
            self.num_states(),
            self.final_state()
        );
        for (state, id) in self.transitions.iter().enumerate() {
            out.push_str(&format!(
                "TRANSITION {} {} {} {}\n",
                state,
                state + 1,
                Self::TRANSITION_WEIGHT,
                id
            ));
        }
        out.push_str("FSG_END\n");
        out
    }

    pub fn save(&self, path: &Path) -> Result<(), AlignmentError> {
        std::fs::write(path, self.to_fsg_string()).map_err(|e| AlignmentError::io("write grammar", e))
    }
}

/// Lowercase ASCII alphanumerics; every other run of characters becomes a
/// single `-`, trimmed at both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
