//! Phoneme conversion of every unit with a per-language fallback cascade.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::config::AlignConfig;
use crate::document::{Document, NodeId, ID_ATTR};
use crate::error::AlignmentError;
use crate::lang::arpabet::is_arpabet;
use crate::lang::LanguageRegistry;
use crate::types::Conversion;

pub const PRONUNCIATION_ATTR: &str = "ARPABET";
pub const EFFECTIVE_LANG_ATTR: &str = "effective-g2p-lang";
/// Language assumed for text with no declared language.
pub const UNDETERMINED_LANG: &str = "und";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversionReport {
    /// True only when every unit converted to a valid pronunciation.
    pub all_valid: bool,
    pub converted_units: usize,
    /// Units that needed a fallback language and found one.
    pub fallback_units: usize,
    /// Ids (or text, for units without an id) of units left invalid.
    pub invalid_units: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum WarningKind {
    InvalidPrecomputed,
    UnknownLanguage,
    TryingFallback,
    NoValidConversion,
}

/// Lets the first `limit` warnings of each kind through and counts the rest.
struct WarningThrottle {
    limit: Option<usize>,
    counts: BTreeMap<WarningKind, usize>,
}

impl WarningThrottle {
    fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            counts: BTreeMap::new(),
        }
    }

    fn allow(&mut self, kind: WarningKind) -> bool {
        let count = self.counts.entry(kind).or_insert(0);
        *count += 1;
        self.limit.map_or(true, |limit| *count <= limit)
    }

    fn finish(&self) {
        let Some(limit) = self.limit else {
            return;
        };
        for (kind, &count) in &self.counts {
            if count > limit {
                tracing::warn!(
                    kind = ?kind,
                    suppressed = count - limit,
                    "further conversion warnings suppressed; enable verbose warnings to see all"
                );
            }
        }
    }
}

/// Return a copy of `doc` where every unit carries a pronunciation attribute,
/// plus a report on how the conversion went.
///
/// Units that already have a pronunciation are validated, not recomputed.
/// Invalid outputs are kept on the unit so they can be inspected. The whole
/// pass fails with [`AlignmentError::TimeBudgetExceeded`] once it runs past
/// `config.g2p_time_budget_ms` (0 disables the budget).
pub fn convert_units(
    doc: &Document,
    registry: &LanguageRegistry,
    config: &AlignConfig,
) -> Result<(Document, ConversionReport), AlignmentError> {
    let budget = (config.g2p_time_budget_ms > 0)
        .then(|| Duration::from_millis(config.g2p_time_budget_ms));
    let mut converter = Converter {
        registry,
        config,
        started: Instant::now(),
        budget,
        throttle: WarningThrottle::new(config.effective_warning_limit()),
    };

    let mut out = doc.clone();
    let units: Vec<NodeId> = doc
        .elements_with_tag(&config.unit_tag)
        .filter(|&id| !doc.in_do_not_align(id))
        .collect();

    let mut report = ConversionReport {
        all_valid: true,
        ..ConversionReport::default()
    };
    for &unit in &units {
        converter.check_budget(report.converted_units)?;
        converter.convert_unit(&mut out, unit, &mut report);
    }
    converter.check_budget(report.converted_units)?;
    converter.throttle.finish();

    tracing::info!(
        units = report.converted_units,
        fallbacks = report.fallback_units,
        invalid = report.invalid_units.len(),
        elapsed_ms = converter.started.elapsed().as_millis() as u64,
        "conversion finished"
    );
    Ok((out, report))
}

struct Converter<'a> {
    registry: &'a LanguageRegistry,
    config: &'a AlignConfig,
    started: Instant,
    budget: Option<Duration>,
    throttle: WarningThrottle,
}

impl Converter<'_> {
    fn check_budget(&self, converted_units: usize) -> Result<(), AlignmentError> {
        let Some(budget) = self.budget else {
            return Ok(());
        };
        let elapsed = self.started.elapsed();
        if elapsed > budget {
            return Err(AlignmentError::TimeBudgetExceeded {
                elapsed,
                budget,
                converted_units,
            });
        }
        Ok(())
    }

    fn convert_unit(&mut self, doc: &mut Document, unit: NodeId, report: &mut ConversionReport) {
        let label = unit_label(doc, unit);

        if let Some(existing) = doc.node(unit).attribute(PRONUNCIATION_ATTR) {
            if !is_arpabet(existing) {
                if self.throttle.allow(WarningKind::InvalidPrecomputed) {
                    tracing::warn!(
                        unit = %label,
                        pronunciation = existing,
                        "pre-converted unit has an invalid pronunciation"
                    );
                }
                report.all_valid = false;
                report.invalid_units.push(label);
            }
            return;
        }

        let text = doc.text_content(unit);
        if text.trim().is_empty() {
            return;
        }

        let fallbacks = doc
            .fallback_langs(unit)
            .unwrap_or_else(|| self.config.g2p_fallbacks.clone());

        let mut outputs = Vec::new();
        let mut effective_langs = Vec::new();
        let mut unit_valid = true;
        let mut used_fallback = false;
        for (lang, run) in merge_runs(doc.language_runs(unit)) {
            let attempt = self.convert_run(&run, &lang, &fallbacks);
            unit_valid &= attempt.conversion.valid;
            used_fallback |= attempt.lang != lang && attempt.conversion.valid;
            if !attempt.conversion.output.is_empty() {
                outputs.push(attempt.conversion.output);
            }
            effective_langs.push(attempt.lang);
        }

        let node = doc.node_mut(unit);
        node.set_attribute(PRONUNCIATION_ATTR, outputs.join(" "));
        if used_fallback {
            node.set_attribute(EFFECTIVE_LANG_ATTR, effective_langs.join(","));
            report.fallback_units += 1;
        }
        report.converted_units += 1;
        if !unit_valid {
            report.all_valid = false;
            report.invalid_units.push(label);
        }
    }

    /// Try `lang`, then each fallback in order. When nothing is valid the
    /// primary attempt is returned.
    fn convert_run(&mut self, text: &str, lang: &str, fallbacks: &[String]) -> Attempt {
        let primary = Attempt {
            lang: lang.to_string(),
            conversion: self.convert_one(text, lang),
        };
        if primary.conversion.valid {
            return primary;
        }

        for fallback in fallbacks.iter().filter(|fallback| fallback.as_str() != lang) {
            if self.throttle.allow(WarningKind::TryingFallback) {
                tracing::warn!(
                    text,
                    lang,
                    fallback = %fallback,
                    "could not convert text; trying fallback language"
                );
            }
            let conversion = self.convert_one(text, fallback);
            if conversion.valid {
                tracing::debug!(text, fallback = %fallback, "fallback conversion succeeded");
                return Attempt {
                    lang: fallback.clone(),
                    conversion,
                };
            }
        }

        if self.throttle.allow(WarningKind::NoValidConversion) {
            tracing::warn!(
                text,
                lang,
                tried = fallbacks.len(),
                output = %primary.conversion.output,
                "no valid conversion found"
            );
        }
        primary
    }

    fn convert_one(&mut self, text: &str, lang: &str) -> Conversion {
        match self.registry.get(lang) {
            Some(backend) => backend.convert(text),
            None => {
                if self.throttle.allow(WarningKind::UnknownLanguage) {
                    tracing::warn!(lang, "no converter registered for language");
                }
                Conversion::default()
            }
        }
    }
}

struct Attempt {
    lang: String,
    conversion: Conversion,
}

fn unit_label(doc: &Document, unit: NodeId) -> String {
    match doc.node(unit).attribute(ID_ATTR) {
        Some(id) => id.to_string(),
        None => doc.text_content(unit),
    }
}

/// Merge adjacent runs in the same language; undeclared text counts as
/// [`UNDETERMINED_LANG`].
fn merge_runs(runs: Vec<(Option<String>, String)>) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = Vec::new();
    for (lang, text) in runs {
        let lang = lang.unwrap_or_else(|| UNDETERMINED_LANG.to_string());
        match merged.last_mut() {
            Some((last_lang, last_text)) if *last_lang == lang => last_text.push_str(&text),
            _ => merged.push((lang, text)),
        }
    }
    merged
        .into_iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .collect()
}
