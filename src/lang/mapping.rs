use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use super::arpabet::is_arpabet;
use super::{is_word_char, push_unit};
use crate::error::AlignmentError;
use crate::pipeline::traits::LanguageBackend;
use crate::types::{Conversion, TextUnit};

/// A language description as stored in the bundled data or in a mapping
/// directory.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageData {
    pub lang: String,
    /// Whether the inventory takes part in language identification.
    #[serde(default = "default_display")]
    pub display: bool,
    #[serde(default)]
    pub case_insensitive: bool,
    /// Strip Latin diacritics before conversion.
    #[serde(default)]
    pub transliterate: bool,
    /// Extra word pieces on top of the mapping inputs.
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub map: Vec<MappingRule>,
    /// `word<TAB>phones` file converting by whole-word lookup instead of
    /// `map`. Relative paths resolve against the language file's directory.
    #[serde(default)]
    pub lexicon: Option<PathBuf>,
}

fn default_display() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingRule {
    #[serde(rename = "in")]
    pub input: String,
    #[serde(rename = "out")]
    pub output: String,
}

impl LanguageData {
    /// Every piece treated as part of a word: mapping inputs plus the
    /// explicit inventory.
    pub fn word_pieces(&self) -> BTreeSet<String> {
        self.map
            .iter()
            .map(|rule| rule.input.as_str())
            .chain(self.inventory.iter().map(String::as_str))
            .filter(|piece| !piece.is_empty())
            .map(|piece| {
                if self.case_insensitive {
                    piece.to_lowercase()
                } else {
                    piece.to_string()
                }
            })
            .collect()
    }
}

/// Longest-match grapheme rewriting straight to ARPABET.
pub struct MappingBackend {
    lang: String,
    case_insensitive: bool,
    transliterate: bool,
    inventory: BTreeSet<String>,
    pieces: Regex,
    rules: HashMap<String, String>,
}

impl MappingBackend {
    pub fn new(data: &LanguageData) -> Result<Self, AlignmentError> {
        let inventory = data.word_pieces();

        let mut alternatives: Vec<&str> = inventory.iter().map(String::as_str).collect();
        alternatives.sort_by_key(|piece| std::cmp::Reverse(piece.chars().count()));
        let mut pattern: Vec<String> = alternatives.iter().map(|p| regex::escape(p)).collect();
        pattern.push(".".to_string());

        let pieces = RegexBuilder::new(&pattern.join("|"))
            .case_insensitive(data.case_insensitive)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| {
                AlignmentError::invalid_input(format!(
                    "cannot build tokenizer for language {}: {e}",
                    data.lang
                ))
            })?;

        let rules = data
            .map
            .iter()
            .filter(|rule| !rule.input.is_empty())
            .map(|rule| {
                let input = if data.case_insensitive {
                    rule.input.to_lowercase()
                } else {
                    rule.input.clone()
                };
                (input, rule.output.trim().to_string())
            })
            .collect();

        Ok(Self {
            lang: data.lang.clone(),
            case_insensitive: data.case_insensitive,
            transliterate: data.transliterate,
            inventory,
            pieces,
            rules,
        })
    }

    fn key<'a>(&self, piece: &'a str) -> Cow<'a, str> {
        if self.case_insensitive {
            Cow::Owned(piece.to_lowercase())
        } else {
            Cow::Borrowed(piece)
        }
    }

    fn is_word_piece(&self, piece: &str) -> bool {
        self.inventory.contains(self.key(piece).as_ref()) || piece.chars().all(is_word_char)
    }
}

impl LanguageBackend for MappingBackend {
    fn lang(&self) -> &str {
        &self.lang
    }

    fn tokenize(&self, text: &str) -> Vec<TextUnit> {
        let mut units = Vec::new();
        for found in self.pieces.find_iter(text) {
            let piece = found.as_str();
            push_unit(&mut units, piece, self.is_word_piece(piece));
        }
        units
    }

    fn convert(&self, text: &str) -> Conversion {
        let prepared = if self.transliterate {
            Cow::Owned(transliterate(text))
        } else {
            Cow::Borrowed(text)
        };

        let mut output = String::new();
        for found in self.pieces.find_iter(&prepared) {
            let piece = found.as_str();
            let phones = match self.rules.get(self.key(piece).as_ref()) {
                Some(phones) => phones.as_str(),
                // unmapped letters are kept so the failure stays visible
                None if piece.chars().all(is_word_char) => piece,
                None => continue,
            };
            if phones.is_empty() {
                continue;
            }
            if !output.is_empty() {
                output.push(' ');
            }
            output.push_str(phones);
        }

        let valid = is_arpabet(&output);
        Conversion { output, valid }
    }
}

fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match fold_diacritic(c) {
            Some(folded) => out.push_str(folded),
            None if super::is_combining_mark(c) => {}
            None => out.push(c),
        }
    }
    out
}

fn fold_diacritic(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' => "A",
        'æ' => "ae",
        'Æ' => "AE",
        'ç' | 'ć' | 'č' => "c",
        'Ç' | 'Ć' | 'Č' => "C",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => "e",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ę' => "E",
        'ì' | 'í' | 'î' | 'ï' | 'ī' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' => "I",
        'ñ' | 'ń' => "n",
        'Ñ' | 'Ń' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' => "O",
        'œ' => "oe",
        'Œ' => "OE",
        'š' | 'ś' => "s",
        'Š' | 'Ś' => "S",
        'ß' => "ss",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' | 'Ÿ' => "Y",
        'ž' | 'ź' | 'ż' => "z",
        'Ž' | 'Ź' | 'Ż' => "Z",
        _ => return None,
    };
    Some(folded)
}
