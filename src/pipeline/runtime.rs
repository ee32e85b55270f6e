use crate::alignment::audio::{mute_ranges, remove_ranges};
use crate::alignment::dna::{normalize, union_outside, DnaSegment};
use crate::alignment::reconcile::{
    annotate, check_against_dictionary, check_ordering, process_segmentation, UnitSpan,
};
use crate::alignment::silence::{silence_exclusions, split_silences};
use crate::alignment::tiers::{build_tiers, unit_intervals};
use crate::config::{AlignConfig, DnaMethod};
use crate::document::{Document, XML_LANG_ATTR};
use crate::error::AlignmentError;
use crate::lang::identify::LanguageIdentifier;
use crate::lang::LanguageRegistry;
use crate::pipeline::traits::AlignmentEngine;
use crate::text::convert::{convert_units, ConversionReport};
use crate::text::dictionary::{Dictionary, Grammar};
use crate::text::ids::assign_ids;
use crate::text::sequences::get_sequences;
use crate::text::tokenize::tokenize;
use crate::types::{AlignmentInput, AlignmentOutput};

/// A tokenized, identified and converted document, ready for alignment.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    /// Used to name the grammar.
    pub name: String,
    pub document: Document,
    pub report: ConversionReport,
}

pub struct ReadAligner {
    config: AlignConfig,
    registry: LanguageRegistry,
    engine: Option<Box<dyn AlignmentEngine>>,
}

pub(crate) struct ReadAlignerParts {
    pub config: AlignConfig,
    pub registry: LanguageRegistry,
    pub engine: Option<Box<dyn AlignmentEngine>>,
}

impl ReadAligner {
    pub(crate) fn from_parts(parts: ReadAlignerParts) -> Self {
        Self {
            config: parts.config,
            registry: parts.registry,
            engine: parts.engine,
        }
    }

    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Tokenize, assign ids and convert every unit of `doc`.
    ///
    /// Fails with [`AlignmentError::ConversionFailed`] when some unit stayed
    /// invalid and the configuration asks to abort in that case.
    pub fn prepare(&self, name: &str, doc: &Document) -> Result<PreparedDocument, AlignmentError> {
        let mut source = doc.clone();
        if self.config.auto_detect_language {
            self.detect_language(&mut source);
        }

        let tokenized = tokenize(&source, &self.registry, &self.config.unit_tag);
        let with_ids = assign_ids(&tokenized, &self.config.unit_tag)?;
        let (document, report) = convert_units(&with_ids, &self.registry, &self.config)?;

        if !report.all_valid {
            if self.config.abort_on_invalid_g2p {
                return Err(AlignmentError::ConversionFailed {
                    unit_ids: report.invalid_units,
                });
            }
            tracing::warn!(
                invalid = report.invalid_units.len(),
                "continuing with partially converted document"
            );
        }
        Ok(PreparedDocument {
            name: name.to_string(),
            document,
            report,
        })
    }

    fn detect_language(&self, doc: &mut Document) {
        let root = doc.root();
        if doc.lang(root).is_some() {
            return;
        }
        let identifier = LanguageIdentifier::from_registry(&self.registry);
        match identifier.best(&doc.text_content(root)) {
            Some(lang) => {
                tracing::info!(lang = %lang, "detected document language");
                doc.node_mut(root).set_attribute(XML_LANG_ATTR, lang);
            }
            None => tracing::warn!("could not detect the document language"),
        }
    }

    /// Dictionary over every alignable unit of a prepared document.
    pub fn dictionary(&self, prepared: &PreparedDocument) -> Result<Dictionary, AlignmentError> {
        Dictionary::from_document(&prepared.document, &self.config.unit_tag)
    }

    pub fn grammar(&self, prepared: &PreparedDocument) -> Result<Grammar, AlignmentError> {
        Ok(Grammar::linear(&prepared.name, &self.dictionary(prepared)?))
    }

    pub fn align(
        &self,
        prepared: &PreparedDocument,
        input: &AlignmentInput,
    ) -> Result<AlignmentOutput, AlignmentError> {
        let spans = self.align_spans(prepared, input)?;
        self.build_output(&prepared.document, &spans, input.duration_ms())
    }

    /// Like [`ReadAligner::align`], also returning the document with `time`
    /// and `dur` attributes on every aligned unit.
    pub fn align_document(
        &self,
        prepared: &PreparedDocument,
        input: &AlignmentInput,
    ) -> Result<(Document, AlignmentOutput), AlignmentError> {
        let spans = self.align_spans(prepared, input)?;
        let output = self.build_output(&prepared.document, &spans, input.duration_ms())?;
        let mut annotated = prepared.document.clone();
        annotate(&mut annotated, &spans)?;
        Ok((annotated, output))
    }

    fn align_spans(
        &self,
        prepared: &PreparedDocument,
        input: &AlignmentInput,
    ) -> Result<Vec<UnitSpan>, AlignmentError> {
        let engine = self
            .engine
            .as_deref()
            .ok_or_else(|| AlignmentError::invalid_input("no alignment engine configured"))?;
        if input.sample_rate_hz == 0 || input.samples.is_empty() {
            return Err(AlignmentError::invalid_input(format!(
                "empty audio ({} samples at {} Hz)",
                input.samples.len(),
                input.sample_rate_hz
            )));
        }

        let config = &self.config;
        let doc = &prepared.document;
        let duration_ms = input.duration_ms();
        let dna = normalize(config.dna_segments());

        let mut samples = input.samples.clone();
        let removed: Vec<DnaSegment> = match config.dna_method() {
            DnaMethod::Remove => dna.clone(),
            DnaMethod::Mute => {
                mute_ranges(&mut samples, &dna, input.sample_rate_hz);
                Vec::new()
            }
        };

        let sequences = get_sequences(doc, &config.unit_tag, &config.anchor_tag)?;
        let mut spans = Vec::new();
        for (index, sequence) in sequences.iter().enumerate() {
            let dictionary = match Dictionary::from_units(doc, &sequence.units) {
                Ok(dictionary) => dictionary,
                Err(AlignmentError::NoWordsToAlign) => {
                    tracing::warn!(sequence = index, "sequence has nothing to align; skipping");
                    continue;
                }
                Err(err) => return Err(err),
            };
            let name = if sequences.len() > 1 {
                format!("{}-{index}", prepared.name)
            } else {
                prepared.name.clone()
            };
            let grammar = Grammar::linear(&name, &dictionary);

            let excluded = union_outside(sequence.start, sequence.end, &removed, duration_ms);
            let audio = remove_ranges(&samples, &excluded, input.sample_rate_hz);
            tracing::info!(
                sequence = index,
                units = dictionary.len(),
                start_ms = ?sequence.start,
                end_ms = ?sequence.end,
                audio_samples = audio.len(),
                "aligning sequence"
            );

            let segments = engine.align(&dictionary, &grammar, &audio, input.sample_rate_hz)?;
            let sequence_spans = process_segmentation(
                &segments,
                &excluded,
                &config.noise_words,
                config.frame_rate,
            )?;
            check_against_dictionary(&sequence_spans, &dictionary)?;
            spans.extend(sequence_spans);
        }

        if spans.is_empty() {
            return Err(AlignmentError::NoWordsToAlign);
        }
        check_ordering(&spans)?;

        if !config.bare {
            let exclusions = silence_exclusions(&dna, &sequences);
            split_silences(&mut spans, duration_ms, &exclusions);
            check_ordering(&spans)?;
        }
        Ok(spans)
    }

    fn build_output(
        &self,
        doc: &Document,
        spans: &[UnitSpan],
        duration_ms: u64,
    ) -> Result<AlignmentOutput, AlignmentError> {
        let units = unit_intervals(doc, spans)?;
        let tiers = build_tiers(doc, &units, &self.config.tier_tags);
        Ok(AlignmentOutput {
            units,
            tiers,
            duration_ms,
        })
    }
}
