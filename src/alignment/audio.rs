//! Sample-buffer editing for do-not-align ranges and anchored sequences.

use crate::alignment::dna::{is_normalized, DnaSegment};

pub fn duration_ms(sample_count: usize, sample_rate_hz: u32) -> u64 {
    if sample_rate_hz == 0 {
        return 0;
    }
    (sample_count as u64 * 1000) / u64::from(sample_rate_hz)
}

/// Sample index of `ms`, clamped to the buffer length.
pub fn ms_to_sample(ms: u64, sample_rate_hz: u32, sample_count: usize) -> usize {
    let index = (u128::from(ms) * u128::from(sample_rate_hz)) / 1000;
    usize::try_from(index).map_or(sample_count, |index| index.min(sample_count))
}

/// Copy of `samples` with every range in `dna` cut out. Ranges past the end
/// of the audio are ignored.
pub fn remove_ranges(samples: &[f32], dna: &[DnaSegment], sample_rate_hz: u32) -> Vec<f32> {
    assert!(
        is_normalized(dna),
        "remove_ranges: DNA segments must be normalized, got {dna:?}"
    );
    let mut out = Vec::with_capacity(samples.len());
    let mut cursor = 0usize;
    for seg in dna {
        let begin = ms_to_sample(seg.begin, sample_rate_hz, samples.len());
        let end = ms_to_sample(seg.end, sample_rate_hz, samples.len());
        if begin > cursor {
            out.extend_from_slice(&samples[cursor..begin]);
        }
        cursor = cursor.max(end);
    }
    if cursor < samples.len() {
        out.extend_from_slice(&samples[cursor..]);
    }
    out
}

/// Zero every range in `dna`; the timeline is unchanged.
pub fn mute_ranges(samples: &mut [f32], dna: &[DnaSegment], sample_rate_hz: u32) {
    let len = samples.len();
    for seg in dna {
        let begin = ms_to_sample(seg.begin, sample_rate_hz, len);
        let end = ms_to_sample(seg.end, sample_rate_hz, len);
        if begin < end {
            samples[begin..end].fill(0.0);
        } else if seg.begin < seg.end {
            tracing::warn!(
                begin_ms = seg.begin,
                end_ms = seg.end,
                audio_ms = duration_ms(len, sample_rate_hz),
                "do-not-align range lies outside the audio"
            );
        }
    }
}
