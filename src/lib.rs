pub mod alignment;
pub mod config;
pub mod document;
pub mod error;
pub mod lang;
pub mod pipeline;
pub mod text;
pub mod types;

pub use alignment::dna::DnaSegment;
pub use config::{AlignConfig, DnaMethod};
pub use document::{Document, NodeId};
pub use error::AlignmentError;
pub use lang::LanguageRegistry;
pub use pipeline::builder::ReadAlignerBuilder;
pub use pipeline::runtime::{PreparedDocument, ReadAligner};
pub use pipeline::traits::{AlignmentEngine, LanguageBackend};
pub use text::convert::ConversionReport;
pub use text::dictionary::{Dictionary, Grammar};
pub use types::{AlignmentInput, AlignmentOutput, EngineSegment, Interval, Tier};
