//! Regrouping flat unit timings into structural tiers.

use crate::alignment::reconcile::UnitSpan;
use crate::document::{Document, NodeId, ID_ATTR};
use crate::error::AlignmentError;
use crate::types::{Interval, Tier};

pub const WORD_TIER: &str = "Word";

pub fn tier_name(tag: &str) -> String {
    match tag {
        "s" => "Sentence".to_string(),
        "p" => "Paragraph".to_string(),
        other => other.to_string(),
    }
}

/// One interval per span, labelled with the full text of its unit.
pub fn unit_intervals(doc: &Document, spans: &[UnitSpan]) -> Result<Vec<Interval>, AlignmentError> {
    let index = doc.id_index();
    spans
        .iter()
        .map(|span| {
            let node = index.get(span.id.as_str()).copied().ok_or_else(|| {
                AlignmentError::mismatch(format!("no element with id \"{}\"", span.id))
            })?;
            Ok(Interval {
                id: span.id.clone(),
                text: doc.text_content(node),
                start_ms: span.start_ms,
                end_ms: span.end_ms,
            })
        })
        .collect()
}

/// The word tier first, then one tier per grouping tag in the given order.
pub fn build_tiers(doc: &Document, units: &[Interval], group_tags: &[String]) -> Vec<Tier> {
    let mut tiers = Vec::with_capacity(group_tags.len() + 1);
    tiers.push(Tier {
        name: WORD_TIER.to_string(),
        intervals: units.to_vec(),
    });
    for tag in group_tags {
        tiers.push(Tier {
            name: tier_name(tag),
            intervals: group_intervals(doc, units, tag),
        });
    }
    tiers
}

/// Consecutive units under the same nearest `tag` ancestor form one
/// interval from the first unit's start to the last unit's end. A unit with
/// no such ancestor is a group of its own.
fn group_intervals(doc: &Document, units: &[Interval], tag: &str) -> Vec<Interval> {
    let index = doc.id_index();
    let mut groups: Vec<(Option<NodeId>, Interval)> = Vec::new();
    for unit in units {
        let owner = index
            .get(unit.id.as_str())
            .and_then(|&node| nearest_ancestor(doc, node, tag));
        match groups.last_mut() {
            Some((Some(current), group)) if Some(*current) == owner => {
                group.text.push(' ');
                group.text.push_str(&unit.text);
                group.end_ms = unit.end_ms;
            }
            _ => {
                let id = owner
                    .and_then(|node| doc.node(node).attribute(ID_ATTR))
                    .unwrap_or(&unit.id)
                    .to_string();
                groups.push((
                    owner,
                    Interval {
                        id,
                        text: unit.text.clone(),
                        start_ms: unit.start_ms,
                        end_ms: unit.end_ms,
                    },
                ));
            }
        }
    }
    tracing::debug!(tag, groups = groups.len(), "tiers: grouped units");
    groups.into_iter().map(|(_, interval)| interval).collect()
}

fn nearest_ancestor(doc: &Document, node: NodeId, tag: &str) -> Option<NodeId> {
    doc.ancestors_or_self(node)
        .skip(1)
        .find(|&ancestor| doc.node(ancestor).local_name() == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse(
            r#"<body><p id="p0"><s id="s0"><w id="w0">Hello</w> <w id="w1">there<m>!</m></w></s><s id="s1"><w id="w2">Bye</w></s></p><w id="w3">orphan</w></body>"#,
        )
        .expect("valid markup")
    }

    fn spans() -> Vec<UnitSpan> {
        vec![
            UnitSpan::new("w0", 0, 100),
            UnitSpan::new("w1", 100, 250),
            UnitSpan::new("w2", 300, 400),
            UnitSpan::new("w3", 400, 500),
        ]
    }

    fn summary(tier: &Tier) -> Vec<(&str, &str, u64, u64)> {
        tier.intervals
            .iter()
            .map(|i| (i.id.as_str(), i.text.as_str(), i.start_ms, i.end_ms))
            .collect()
    }

    #[test]
    fn word_tier_uses_full_unit_text() {
        let doc = doc();
        let units = unit_intervals(&doc, &spans()).expect("known ids");
        assert_eq!(units[1].text, "there!");
    }

    #[test]
    fn sentences_and_paragraphs() {
        let doc = doc();
        let units = unit_intervals(&doc, &spans()).expect("known ids");
        let tiers = build_tiers(&doc, &units, &["s".to_string(), "p".to_string()]);
        let names: Vec<&str> = tiers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Word", "Sentence", "Paragraph"]);
        assert_eq!(
            summary(&tiers[1]),
            [
                ("s0", "Hello there!", 0, 250),
                ("s1", "Bye", 300, 400),
                ("w3", "orphan", 400, 500)
            ]
        );
        assert_eq!(
            summary(&tiers[2]),
            [("p0", "Hello there! Bye", 0, 400), ("w3", "orphan", 400, 500)]
        );
    }

    #[test]
    fn unknown_unit_id_is_a_mismatch() {
        let err = unit_intervals(&doc(), &[UnitSpan::new("nope", 0, 1)]).unwrap_err();
        assert!(matches!(err, AlignmentError::AlignmentMismatch { .. }));
    }

    #[test]
    fn other_tags_keep_their_name() {
        assert_eq!(tier_name("div"), "div");
    }
}
