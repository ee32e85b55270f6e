//! Markup preparation: tokenization, ids, conversion, dictionary and grammar.

pub mod convert;
pub mod dictionary;
pub mod ids;
pub mod sequences;
pub mod tokenize;
