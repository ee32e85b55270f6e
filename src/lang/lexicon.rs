//! Whole-word pronunciation lookup from a `word<TAB>phones` lexicon.

use std::collections::HashMap;
use std::path::Path;

use unicode_normalization::UnicodeNormalization;

use super::arpabet::is_arpabet;
use super::mapping::{LanguageData, MappingBackend};
use crate::error::AlignmentError;
use crate::pipeline::traits::LanguageBackend;
use crate::types::{Conversion, TextUnit};

/// Converts by looking the whole word up, uppercased and NFKC-normalized.
/// A word missing from the lexicon converts invalid so the fallback cascade
/// gets a chance. Tokenization follows the language's inventory.
pub struct LexiconBackend {
    tokenizer: MappingBackend,
    entries: HashMap<String, String>,
}

impl LexiconBackend {
    pub fn new(
        data: &LanguageData,
        entries: HashMap<String, String>,
    ) -> Result<Self, AlignmentError> {
        Ok(Self {
            tokenizer: MappingBackend::new(data)?,
            entries,
        })
    }

    pub fn load(data: &LanguageData, path: &Path) -> Result<Self, AlignmentError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| AlignmentError::io("read lexicon", e))?;
        let entries = parse_lexicon(&text);
        tracing::debug!(
            lang = %data.lang,
            path = %path.display(),
            entries = entries.len(),
            "loaded lexicon"
        );
        Self::new(data, entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One entry per line, key and phones separated by a tab. Lines without a
/// tab are skipped; the first entry for a word wins.
pub fn parse_lexicon(text: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    for line in text.lines() {
        let mut parts = line.trim().split('\t');
        let (Some(word), Some(phones)) = (parts.next(), parts.next()) else {
            continue;
        };
        let phones: Vec<&str> = phones.split_whitespace().collect();
        if word.is_empty() || phones.is_empty() {
            continue;
        }
        entries
            .entry(lexicon_key(word))
            .or_insert_with(|| phones.join(" ").nfkc().collect());
    }
    entries
}

fn lexicon_key(word: &str) -> String {
    word.trim_matches('#')
        .trim()
        .nfkc()
        .collect::<String>()
        .to_uppercase()
}

impl LanguageBackend for LexiconBackend {
    fn lang(&self) -> &str {
        self.tokenizer.lang()
    }

    fn tokenize(&self, text: &str) -> Vec<TextUnit> {
        self.tokenizer.tokenize(text)
    }

    fn convert(&self, text: &str) -> Conversion {
        match self.entries.get(&lexicon_key(text)) {
            Some(phones) => Conversion {
                output: phones.clone(),
                valid: is_arpabet(phones),
            },
            None => Conversion {
                output: text.trim().to_string(),
                valid: false,
            },
        }
    }
}
