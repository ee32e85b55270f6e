//! Character-inventory language identification.
//!
//! Each language gets a smoothed unigram distribution over every character
//! seen in any inventory: characters in its own inventory weigh
//! [`SEEN_FACTOR`], the rest [`UNSEEN_FACTOR`]. Text is scored by summing
//! log-probabilities of its known characters.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::LanguageRegistry;

pub const SEEN_FACTOR: f64 = 1.0;
pub const UNSEEN_FACTOR: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct LanguageIdentifier {
    langs: Vec<String>,
    chars: HashMap<char, usize>,
    /// `logprobs[lang][char]`
    logprobs: Vec<Vec<f64>>,
}

impl LanguageIdentifier {
    pub fn from_inventories(inventories: &BTreeMap<String, BTreeSet<String>>) -> Self {
        let langs: Vec<String> = inventories.keys().cloned().collect();
        let mut chars = HashMap::new();
        for pieces in inventories.values() {
            for c in lowercase_chars(pieces) {
                let next = chars.len();
                chars.entry(c).or_insert(next);
            }
        }

        let logprobs = inventories
            .values()
            .map(|pieces| {
                let mut row = vec![UNSEEN_FACTOR; chars.len()];
                for c in lowercase_chars(pieces) {
                    row[chars[&c]] = SEEN_FACTOR;
                }
                let total: f64 = row.iter().sum();
                row.iter().map(|p| (p / total).ln()).collect()
            })
            .collect();

        Self {
            langs,
            chars,
            logprobs,
        }
    }

    pub fn from_registry(registry: &LanguageRegistry) -> Self {
        Self::from_inventories(registry.inventories())
    }

    /// Normalized probability per language, most likely first. Characters
    /// outside every inventory are ignored.
    pub fn identify(&self, text: &str) -> Vec<(String, f64)> {
        if self.langs.is_empty() {
            return Vec::new();
        }
        let mut scores = vec![0.0f64; self.langs.len()];
        for c in text.chars().flat_map(char::to_lowercase) {
            let Some(&index) = self.chars.get(&c) else {
                continue;
            };
            for (score, row) in scores.iter_mut().zip(&self.logprobs) {
                *score += row[index];
            }
        }

        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exp.iter().sum();

        let mut result: Vec<(String, f64)> = self
            .langs
            .iter()
            .cloned()
            .zip(exp.into_iter().map(|p| p / total))
            .collect();
        result.sort_by(|a, b| b.1.total_cmp(&a.1));
        result
    }

    pub fn best(&self, text: &str) -> Option<String> {
        self.identify(text).into_iter().next().map(|(lang, _)| lang)
    }
}

/// Text is lowercased before scoring, so inventories are too.
fn lowercase_chars(pieces: &BTreeSet<String>) -> impl Iterator<Item = char> + '_ {
    pieces
        .iter()
        .flat_map(|piece| piece.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventories() -> BTreeMap<String, BTreeSet<String>> {
        let mut inv = BTreeMap::new();
        inv.insert(
            "abc".to_string(),
            ["a", "b", "c"].iter().map(|s| s.to_string()).collect(),
        );
        inv.insert(
            "xyz".to_string(),
            ["x", "y", "z", "a"].iter().map(|s| s.to_string()).collect(),
        );
        inv
    }

    #[test]
    fn picks_language_whose_inventory_covers_text() {
        let identifier = LanguageIdentifier::from_inventories(&inventories());
        assert_eq!(identifier.best("Cab").as_deref(), Some("abc"));
        assert_eq!(identifier.best("zax").as_deref(), Some("xyz"));
    }

    #[test]
    fn probabilities_are_normalized_and_sorted() {
        let identifier = LanguageIdentifier::from_inventories(&inventories());
        let scores = identifier.identify("abba");
        let total: f64 = scores.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(scores[0].1 >= scores[1].1);
    }

    #[test]
    fn unknown_characters_leave_a_uniform_result() {
        let identifier = LanguageIdentifier::from_inventories(&inventories());
        let scores = identifier.identify("???");
        assert!((scores[0].1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn builtin_registry_distinguishes_mohawk() {
        let registry = LanguageRegistry::builtin().expect("bundled data parses");
        let identifier = LanguageIdentifier::from_registry(registry);
        assert_eq!(
            identifier.best("Sewakwé:kon tsi").as_deref(),
            Some("moh")
        );
    }

    #[test]
    fn uppercase_inventory_characters_still_score() {
        let mut inv = BTreeMap::new();
        inv.insert("low".to_string(), BTreeSet::from(["x".to_string()]));
        inv.insert("up".to_string(), BTreeSet::from(["Q".to_string()]));
        let identifier = LanguageIdentifier::from_inventories(&inv);
        assert_eq!(identifier.best("Qq").as_deref(), Some("up"));
    }

    #[test]
    fn empty_identifier_returns_nothing() {
        let identifier = LanguageIdentifier::from_inventories(&BTreeMap::new());
        assert!(identifier.best("abc").is_none());
    }
}
