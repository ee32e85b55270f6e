use serde::Serialize;

/// One labelled span produced by a language tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    pub text: String,
    pub is_word: bool,
}

impl TextUnit {
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_word: true,
        }
    }

    pub fn other(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_word: false,
        }
    }
}

/// Result of a single phoneme conversion. An invalid result still carries
/// whatever partial output the backend produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversion {
    pub output: String,
    pub valid: bool,
}

/// One entry of the alignment engine's output. `end_frame` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSegment {
    pub label: String,
    pub start_frame: u64,
    pub end_frame: u64,
}

impl EngineSegment {
    pub fn new(label: impl Into<String>, start_frame: u64, end_frame: u64) -> Self {
        Self {
            label: label.into(),
            start_frame,
            end_frame,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlignmentInput {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

impl AlignmentInput {
    pub fn duration_ms(&self) -> u64 {
        crate::alignment::audio::duration_ms(self.samples.len(), self.sample_rate_hz)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub id: String,
    pub text: String,
    /// Millisecond interval is [start_ms, end_ms), i.e. start inclusive/end exclusive.
    pub start_ms: u64,
    /// Millisecond interval is [start_ms, end_ms), i.e. start inclusive/end exclusive.
    pub end_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tier {
    pub name: String,
    pub intervals: Vec<Interval>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentOutput {
    /// One entry per aligned unit, in document order.
    pub units: Vec<Interval>,
    pub tiers: Vec<Tier>,
    pub duration_ms: u64,
}
