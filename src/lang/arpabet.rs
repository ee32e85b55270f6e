//! The canonical phone set pronunciations are validated against.

pub const PHONES: [&str; 39] = [
    "AA", "AE", "AH", "AO", "AW", "AY", "B", "CH", "D", "DH", "EH", "ER", "EY", "F", "G", "HH",
    "IH", "IY", "JH", "K", "L", "M", "N", "NG", "OW", "OY", "P", "R", "S", "SH", "T", "TH", "UH",
    "UW", "V", "W", "Y", "Z", "ZH",
];

const VOWELS: [&str; 15] = [
    "AA", "AE", "AH", "AO", "AW", "AY", "EH", "ER", "EY", "IH", "IY", "OW", "OY", "UH", "UW",
];

/// A single phone, optionally carrying a 0-2 stress digit when it is a vowel.
pub fn is_phone(symbol: &str) -> bool {
    let base = match symbol.as_bytes().last() {
        Some(b'0'..=b'2') => {
            let base = &symbol[..symbol.len() - 1];
            if !VOWELS.contains(&base) {
                return false;
            }
            base
        }
        _ => symbol,
    };
    PHONES.contains(&base)
}

/// Non-empty and made only of space-separated phones.
pub fn is_arpabet(pronunciation: &str) -> bool {
    let mut symbols = pronunciation.split_whitespace().peekable();
    symbols.peek().is_some() && symbols.all(is_phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_stressed_phones() {
        assert!(is_arpabet("HH AH0 L OW1"));
        assert!(is_arpabet("B AA N ZH UW R"));
        assert!(is_arpabet("  S  "));
    }

    #[test]
    fn rejects_empty_unknown_and_stressed_consonants() {
        assert!(!is_arpabet(""));
        assert!(!is_arpabet("   "));
        assert!(!is_arpabet("HH q L"));
        assert!(!is_arpabet("B1"));
        assert!(!is_arpabet("AH3"));
        assert!(!is_arpabet("hh ah"));
    }
}
