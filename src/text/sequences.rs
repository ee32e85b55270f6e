//! Anchor-delimited unit sequences.
//!
//! An anchor such as `<anchor time="34.5s"/>` pins a point of the text to a
//! point of the audio. Units between two anchors form one sequence, aligned
//! on its own against that stretch of audio.

use std::sync::OnceLock;

use regex::Regex;

use crate::document::{Document, NodeId};
use crate::error::AlignmentError;

pub const TIME_ATTR: &str = "time";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSequence {
    /// Start in ms; `None` means the start of the audio.
    pub start: Option<u64>,
    /// End in ms; `None` means the end of the audio.
    pub end: Option<u64>,
    pub units: Vec<NodeId>,
}

/// Parse `"0.23s"`, `"5.234"` (seconds implied) or `"1234 ms"` into
/// milliseconds.
pub fn parse_time(value: &str) -> Result<u64, AlignmentError> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"^\s*([0-9.]+)\s*(?:(s|ms)\s*)?$").ok())
        .as_ref()
        .ok_or_else(|| AlignmentError::invalid_input("time pattern failed to compile"))?;

    let invalid = || {
        AlignmentError::invalid_input(format!(
            "invalid time \"{value}\": expected a number followed by \"s\", \"ms\" or nothing"
        ))
    };
    let caps = pattern.captures(value).ok_or_else(invalid)?;
    let number: f64 = caps[1].parse().map_err(|_| invalid())?;
    let ms = match caps.get(2).map(|unit| unit.as_str()) {
        Some("ms") => number,
        _ => number * 1000.0,
    };
    Ok(ms.round() as u64)
}

/// Split the units of `doc` at every anchor. Units inside do-not-align
/// subtrees are left out. Anchors without a parseable `time` are all
/// reported together.
pub fn get_sequences(
    doc: &Document,
    unit_tag: &str,
    anchor_tag: &str,
) -> Result<Vec<WordSequence>, AlignmentError> {
    let mut sequences = Vec::new();
    let mut start = None;
    let mut units = Vec::new();
    let mut problems = Vec::new();

    for id in doc.descendants(doc.root()) {
        let node = doc.node(id);
        if node.local_name() == unit_tag {
            if !doc.in_do_not_align(id) {
                units.push(id);
            }
            continue;
        }
        if node.local_name() != anchor_tag {
            continue;
        }

        let end = match node.attribute(TIME_ATTR) {
            Some(value) => match parse_time(value) {
                Ok(ms) => ms,
                Err(err) => {
                    tracing::error!(error = %err, "invalid anchor");
                    problems.push(err.to_string());
                    continue;
                }
            },
            None => {
                tracing::error!(anchor_tag, "anchor is missing its time attribute");
                problems.push(format!("<{anchor_tag}> without a \"{TIME_ATTR}\" attribute"));
                continue;
            }
        };
        if !units.is_empty() {
            sequences.push(WordSequence {
                start,
                end: Some(end),
                units: std::mem::take(&mut units),
            });
        }
        start = Some(end);
    }
    if !units.is_empty() {
        sequences.push(WordSequence {
            start,
            end: None,
            units,
        });
    }

    if !problems.is_empty() {
        return Err(AlignmentError::invalid_input(format!(
            "could not parse all anchors ({}); use e.g. <{anchor_tag} time=\"34.5s\"/>",
            problems.join("; ")
        )));
    }
    Ok(sequences)
}
