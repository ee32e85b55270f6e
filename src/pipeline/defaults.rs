use crate::lang::{is_word_char, push_unit};
use crate::pipeline::traits::LanguageBackend;
use crate::types::{Conversion, TextUnit};

/// Used when no language is declared or the declared one is unknown.
/// Words are runs of letters, digits and combining marks. It cannot convert.
pub struct DefaultLanguageBackend;

impl DefaultLanguageBackend {
    pub const LANG: &'static str = "default";
}

impl LanguageBackend for DefaultLanguageBackend {
    fn lang(&self) -> &str {
        Self::LANG
    }

    fn tokenize(&self, text: &str) -> Vec<TextUnit> {
        let mut units = Vec::new();
        let mut buf = [0u8; 4];
        for c in text.chars() {
            push_unit(&mut units, c.encode_utf8(&mut buf), is_word_char(c));
        }
        units
    }

    fn convert(&self, text: &str) -> Conversion {
        Conversion {
            output: text.trim().to_string(),
            valid: false,
        }
    }
}
