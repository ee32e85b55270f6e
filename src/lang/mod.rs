//! Language capabilities: per-language tokenizers and converters, looked up
//! by language code.

pub mod arpabet;
pub mod identify;
mod lexicon;
mod mapping;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

pub use lexicon::{parse_lexicon, LexiconBackend};
pub use mapping::{LanguageData, MappingBackend, MappingRule};

use crate::error::AlignmentError;
use crate::pipeline::defaults::DefaultLanguageBackend;
use crate::pipeline::traits::LanguageBackend;
use crate::types::TextUnit;

const BUILTIN_DATA: &str = include_str!("builtin.json");

static BUILTIN: OnceLock<Result<LanguageRegistry, String>> = OnceLock::new();

#[derive(Clone)]
pub struct LanguageRegistry {
    backends: BTreeMap<String, Arc<dyn LanguageBackend>>,
    inventories: BTreeMap<String, BTreeSet<String>>,
    default_backend: Arc<dyn LanguageBackend>,
}

impl LanguageRegistry {
    /// A registry with no languages; every lookup falls through to the
    /// default alphanumeric tokenizer.
    pub fn new() -> Self {
        Self {
            backends: BTreeMap::new(),
            inventories: BTreeMap::new(),
            default_backend: Arc::new(DefaultLanguageBackend),
        }
    }

    /// The bundled languages, parsed once per process and shared read-only.
    pub fn builtin() -> Result<&'static Self, AlignmentError> {
        BUILTIN
            .get_or_init(|| Self::from_json_str(BUILTIN_DATA).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|message| {
                AlignmentError::invalid_input(format!("bundled language data: {message}"))
            })
    }

    /// Parse a JSON array of language descriptions.
    pub fn from_json_str(data: &str) -> Result<Self, AlignmentError> {
        let languages: Vec<LanguageData> = serde_json::from_str(data)
            .map_err(|e| AlignmentError::json("parse language data", e))?;
        let mut registry = Self::new();
        for language in &languages {
            registry.add_language(language)?;
        }
        Ok(registry)
    }

    /// Add a language; a relative lexicon path resolves against the
    /// working directory.
    pub fn add_language(&mut self, data: &LanguageData) -> Result<(), AlignmentError> {
        self.add_language_in(data, Path::new(""))
    }

    fn add_language_in(&mut self, data: &LanguageData, base: &Path) -> Result<(), AlignmentError> {
        let backend: Arc<dyn LanguageBackend> = match &data.lexicon {
            Some(lexicon) => Arc::new(LexiconBackend::load(data, &base.join(lexicon))?),
            None => Arc::new(MappingBackend::new(data)?),
        };
        if data.display {
            self.inventories
                .insert(data.lang.clone(), data.word_pieces());
        }
        self.register(backend);
        Ok(())
    }

    /// Add or replace the backend for `backend.lang()`.
    pub fn register(&mut self, backend: Arc<dyn LanguageBackend>) {
        let lang = backend.lang().to_string();
        if self.backends.insert(lang.clone(), backend).is_some() {
            tracing::debug!(lang = %lang, "replacing language backend");
        }
    }

    /// Load every `*.json` language description in `dir`. Returns how many
    /// were added.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, AlignmentError> {
        let entries =
            std::fs::read_dir(dir).map_err(|e| AlignmentError::io("read language directory", e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| AlignmentError::io("read language directory", e))?
                .path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let data = std::fs::read_to_string(path)
                .map_err(|e| AlignmentError::io("read language file", e))?;
            let language: LanguageData = serde_json::from_str(&data)
                .map_err(|e| AlignmentError::json("parse language file", e))?;
            tracing::debug!(lang = %language.lang, path = %path.display(), "loaded language");
            self.add_language_in(&language, dir)?;
        }
        Ok(paths.len())
    }

    pub fn get(&self, lang: &str) -> Option<&dyn LanguageBackend> {
        self.backends.get(lang).map(|backend| backend.as_ref())
    }

    pub fn contains(&self, lang: &str) -> bool {
        self.backends.contains_key(lang)
    }

    /// Backend for `lang`, or the default tokenizer when the language is
    /// unknown or undeclared.
    pub fn for_lang(&self, lang: Option<&str>) -> &dyn LanguageBackend {
        lang.and_then(|lang| self.get(lang))
            .unwrap_or(self.default_backend.as_ref())
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }

    /// Word pieces of each language that takes part in identification.
    pub fn inventories(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.inventories
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageRegistry")
            .field("languages", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Letters, digits and combining marks.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || is_combining_mark(c)
}

pub(crate) fn is_combining_mark(c: char) -> bool {
    matches!(
        c,
        '\u{0300}'..='\u{036F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{20D0}'..='\u{20FF}'
            | '\u{FE20}'..='\u{FE2F}'
    )
}

/// Append `text`, merging with the previous unit when the label matches.
pub(crate) fn push_unit(units: &mut Vec<TextUnit>, text: &str, is_word: bool) {
    match units.last_mut() {
        Some(last) if last.is_word == is_word => last.text.push_str(text),
        _ => units.push(TextUnit {
            text: text.to_string(),
            is_word,
        }),
    }
}
