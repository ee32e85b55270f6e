//! Interval algebra over do-not-align (DNA) ranges.
//!
//! Ranges are half-open millisecond intervals `[begin, end)`. Most operations
//! require a *normalized* list: sorted by `begin`, pairwise disjoint, touching
//! ranges fused. Passing anything else is a programmer error and panics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DnaSegment {
    pub begin: u64,
    pub end: u64,
}

impl DnaSegment {
    pub const fn new(begin: u64, end: u64) -> Self {
        Self { begin, end }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end.saturating_sub(self.begin)
    }
}

/// Sort by `begin` and fuse every pair where the next range begins at or
/// before the end of the current one.
pub fn normalize(segments: &[DnaSegment]) -> Vec<DnaSegment> {
    let mut sorted = segments.to_vec();
    sorted.sort_by_key(|seg| seg.begin);

    let mut out: Vec<DnaSegment> = Vec::with_capacity(sorted.len());
    for seg in sorted {
        match out.last_mut() {
            Some(last) if seg.begin <= last.end => {
                last.end = last.end.max(seg.end);
            }
            _ => out.push(seg),
        }
    }
    out
}

pub fn is_normalized(segments: &[DnaSegment]) -> bool {
    segments.iter().all(|seg| seg.begin <= seg.end)
        && segments.windows(2).all(|pair| pair[0].end < pair[1].begin)
}

#[track_caller]
fn assert_normalized(segments: &[DnaSegment], operation: &str) {
    assert!(
        is_normalized(segments),
        "{operation}: DNA segments must be sorted, disjoint and fused, got {segments:?}"
    );
}

/// Two-pointer intersection of two normalized lists. Ranges that merely touch
/// produce a zero-length intersection.
pub fn intersect(a: &[DnaSegment], b: &[DnaSegment]) -> Vec<DnaSegment> {
    assert_normalized(a, "intersect");
    assert_normalized(b, "intersect");

    let mut out = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    while i < a.len() && j < b.len() {
        let (x, y) = (a[i], b[j]);
        if x.end < y.begin {
            i += 1;
        } else if x.begin > y.end {
            j += 1;
        } else {
            out.push(DnaSegment::new(x.begin.max(y.begin), x.end.min(y.end)));
            if x.end < y.end {
                i += 1;
            } else {
                j += 1;
            }
        }
    }
    out
}

/// Map a timestamp in DNA-spliced audio back onto the original timeline: the
/// sum of the durations of every removed range that begins at or before the
/// (progressively shifted) timestamp.
pub fn cumulative_shift(timestamp_ms: u64, dna: &[DnaSegment]) -> u64 {
    assert_normalized(dna, "cumulative_shift");

    let mut shifted = timestamp_ms;
    let mut total = 0u64;
    for seg in dna {
        if seg.begin > shifted {
            break;
        }
        let delta = seg.duration_ms();
        total += delta;
        shifted += delta;
    }
    total
}

/// When `[start, end)` strictly contains a DNA range, snap one boundary to the
/// range edge that needs the smaller adjustment. On a tie the span keeps its
/// end and the start moves forward to the DNA end.
pub fn reconcile_bleed(start_ms: u64, end_ms: u64, dna: &[DnaSegment]) -> (u64, u64) {
    for seg in dna {
        if start_ms < seg.begin && end_ms > seg.end {
            if seg.begin - start_ms > end_ms - seg.end {
                return (start_ms, seg.begin);
            }
            return (seg.end, end_ms);
        }
    }
    (start_ms, end_ms)
}

/// DNA list equivalent to excluding everything outside `[keep_start, keep_end)`
/// together with `dna`. Ranges straddling a kept boundary are truncated into
/// the outer exclusion rather than dropped. `None` means the start or end of
/// the audio.
pub fn union_outside(
    keep_start: Option<u64>,
    keep_end: Option<u64>,
    dna: &[DnaSegment],
    total_len_ms: u64,
) -> Vec<DnaSegment> {
    assert_normalized(dna, "union_outside");

    let mut current = dna.to_vec();

    if let Some(mut start) = keep_start.filter(|&s| s > 0) {
        let mut next = vec![DnaSegment::new(0, start)];
        for seg in current {
            if seg.end <= start {
                // subsumed by [0, start)
                continue;
            }
            if seg.begin <= start {
                start = seg.end;
                next[0].end = start;
            } else {
                next.push(seg);
            }
        }
        current = next;
    }

    if let Some(mut end) = keep_end {
        let mut next = Vec::with_capacity(current.len() + 1);
        for seg in current {
            if seg.begin >= end {
                continue;
            }
            if seg.end >= end {
                end = seg.begin;
            } else {
                next.push(seg);
            }
        }
        next.push(DnaSegment::new(end, total_len_ms.max(end)));
        current = next;
    }

    current
}
