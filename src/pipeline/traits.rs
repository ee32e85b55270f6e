use crate::error::AlignmentError;
use crate::text::dictionary::{Dictionary, Grammar};
use crate::types::{Conversion, EngineSegment, TextUnit};

/// Per-language tokenization and phoneme conversion.
pub trait LanguageBackend: Send + Sync {
    fn lang(&self) -> &str;

    /// Split `text` into word and non-word spans. Concatenating the spans
    /// must give back `text`.
    fn tokenize(&self, text: &str) -> Vec<TextUnit>;

    fn convert(&self, text: &str) -> Conversion;
}

/// The external forced aligner. Segments come back in grammar order, one per
/// dictionary entry, possibly interleaved with noise labels.
pub trait AlignmentEngine: Send + Sync {
    fn align(
        &self,
        dictionary: &Dictionary,
        grammar: &Grammar,
        samples: &[f32],
        sample_rate_hz: u32,
    ) -> Result<Vec<EngineSegment>, AlignmentError>;
}
