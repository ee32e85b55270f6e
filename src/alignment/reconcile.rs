//! Turning engine frames into unit timings on the original audio timeline.

use crate::alignment::dna::{cumulative_shift, reconcile_bleed, DnaSegment};
use crate::document::Document;
use crate::error::AlignmentError;
use crate::text::dictionary::Dictionary;
use crate::types::EngineSegment;

pub const TIME_ATTR: &str = "time";
pub const DURATION_ATTR: &str = "dur";

/// Timing contract: [start_ms, end_ms), start inclusive and end exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpan {
    pub id: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl UnitSpan {
    pub fn new(id: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            id: id.into(),
            start_ms,
            end_ms,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

pub fn frames_to_ms(frame: u64, frame_rate: f64) -> u64 {
    (frame as f64 * 1000.0 / frame_rate).round() as u64
}

/// Drop noise labels, convert frames to milliseconds and move every
/// timestamp from the spliced timeline back onto the original one.
///
/// `removed` is the normalized list of ranges cut from the audio handed to
/// the engine. Spans that would straddle a removed range are snapped to one
/// side of it.
pub fn process_segmentation(
    segments: &[EngineSegment],
    removed: &[DnaSegment],
    noise_words: &[String],
    frame_rate: f64,
) -> Result<Vec<UnitSpan>, AlignmentError> {
    let mut spans: Vec<UnitSpan> = Vec::with_capacity(segments.len());
    for segment in segments {
        if noise_words.iter().any(|noise| *noise == segment.label) {
            continue;
        }
        if segment.end_frame < segment.start_frame {
            return Err(AlignmentError::mismatch(format!(
                "segment \"{}\" ends at frame {} before it starts at frame {}",
                segment.label, segment.end_frame, segment.start_frame
            )));
        }

        let mut start = frames_to_ms(segment.start_frame, frame_rate);
        let mut end = frames_to_ms(segment.end_frame, frame_rate);
        start += cumulative_shift(start, removed);
        end += cumulative_shift(end, removed);
        (start, end) = reconcile_bleed(start, end, removed);

        if let Some(previous) = spans.last() {
            if start < previous.end_ms {
                return Err(AlignmentError::mismatch(format!(
                    "segment \"{}\" starts at {start} ms, before \"{}\" ends at {} ms",
                    segment.label, previous.id, previous.end_ms
                )));
            }
        }
        tracing::trace!(
            id = segment.label.as_str(),
            start_ms = start,
            end_ms = end,
            "reconcile: segment"
        );
        spans.push(UnitSpan::new(segment.label.clone(), start, end));
    }
    Ok(spans)
}

/// One span per dictionary entry, in dictionary order.
pub fn check_against_dictionary(
    spans: &[UnitSpan],
    dictionary: &Dictionary,
) -> Result<(), AlignmentError> {
    if spans.len() != dictionary.len() {
        return Err(AlignmentError::mismatch(format!(
            "engine returned {} segment(s) for {} dictionary entries",
            spans.len(),
            dictionary.len()
        )));
    }
    for (index, (span, entry)) in spans.iter().zip(dictionary.entries()).enumerate() {
        if span.id != entry.id {
            return Err(AlignmentError::mismatch(format!(
                "segment {index} is \"{}\", expected \"{}\"",
                span.id, entry.id
            )));
        }
    }
    Ok(())
}

/// Every span well-formed and no span starting before its predecessor ends.
pub fn check_ordering(spans: &[UnitSpan]) -> Result<(), AlignmentError> {
    if let Some(span) = spans.iter().find(|span| span.end_ms < span.start_ms) {
        return Err(AlignmentError::mismatch(format!(
            "\"{}\" ends at {} ms before it starts at {} ms",
            span.id, span.end_ms, span.start_ms
        )));
    }
    if let Some(pair) = spans.windows(2).find(|pair| pair[1].start_ms < pair[0].end_ms) {
        return Err(AlignmentError::mismatch(format!(
            "\"{}\" [{}, {}) overlaps \"{}\" [{}, {})",
            pair[0].id, pair[0].start_ms, pair[0].end_ms, pair[1].id, pair[1].start_ms, pair[1].end_ms
        )));
    }
    Ok(())
}

/// Write `time` and `dur` (seconds, three decimals) onto the unit with each
/// span's id.
pub fn annotate(doc: &mut Document, spans: &[UnitSpan]) -> Result<(), AlignmentError> {
    let nodes = {
        let index = doc.id_index();
        spans
            .iter()
            .map(|span| {
                index.get(span.id.as_str()).copied().ok_or_else(|| {
                    AlignmentError::mismatch(format!("no element with id \"{}\"", span.id))
                })
            })
            .collect::<Result<Vec<_>, _>>()?
    };
    for (span, node) in spans.iter().zip(nodes) {
        let element = doc.node_mut(node);
        element.set_attribute(TIME_ATTR, format_secs(span.start_ms));
        element.set_attribute(DURATION_ATTR, format_secs(span.duration_ms()));
    }
    Ok(())
}

fn format_secs(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}
