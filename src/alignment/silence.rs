//! Redistribution of the silence between aligned units.

use crate::alignment::dna::{intersect, normalize, DnaSegment};
use crate::alignment::reconcile::UnitSpan;
use crate::text::sequences::WordSequence;

/// Give every gap to its neighbours, split at the midpoint. Leading silence
/// goes to the first unit and trailing silence, up to `final_end_ms`, to the
/// last one.
///
/// When a gap touches an excluded range the earlier unit stops at the first
/// excluded begin and the later one starts after the last excluded end, so no
/// unit is stretched over excluded audio. `excluded` must be normalized.
pub fn split_silences(spans: &mut [UnitSpan], final_end_ms: u64, excluded: &[DnaSegment]) {
    let mut last_end = 0u64;
    let mut previous: Option<usize> = None;

    // A sentinel at final_end_ms closes the trailing gap.
    for index in 0..=spans.len() {
        let (start, end) = match spans.get(index) {
            Some(span) => (span.start_ms, span.end_ms),
            None => (final_end_ms, final_end_ms),
        };

        if start > last_end {
            let midpoint = last_end + (start - last_end) / 2;
            let within_gap = intersect(&[DnaSegment::new(last_end, start)], excluded);
            let (prev_end, next_start) = match (within_gap.first(), within_gap.last()) {
                (Some(first), Some(last)) => (midpoint.min(first.begin), midpoint.max(last.end)),
                _ => (midpoint, midpoint),
            };
            if let Some(prev) = previous {
                spans[prev].end_ms = prev_end;
            }
            if let Some(span) = spans.get_mut(index) {
                span.start_ms = next_start;
            }
        }

        previous = Some(index);
        last_end = end;
    }
}

/// Exclusions to respect while splitting: the configured DNA plus every
/// anchor boundary as a zero-length range (or the range between two
/// adjacent anchors).
pub fn silence_exclusions(dna: &[DnaSegment], sequences: &[WordSequence]) -> Vec<DnaSegment> {
    let mut exclusions = dna.to_vec();
    let mut last_end: Option<u64> = None;
    for seq in sequences {
        if let Some(begin) = last_end.or(seq.start) {
            let end = seq.start.or(last_end).unwrap_or(begin);
            exclusions.push(DnaSegment::new(begin.min(end), begin.max(end)));
        }
        last_end = seq.end;
    }
    if let Some(end) = last_end {
        exclusions.push(DnaSegment::new(end, end));
    }
    normalize(&exclusions)
}
