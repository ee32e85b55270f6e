use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("markup parse error: {source}")]
    Xml {
        #[source]
        source: roxmltree::Error,
    },
    /// Contradictory do-not-align / unit nesting. Raised before conversion.
    #[error("structural error: {message}")]
    Structural { message: String },
    /// Raised only when the caller asked to abort on invalid conversions.
    #[error("{} unit(s) could not be converted to a valid pronunciation: {}", unit_ids.len(), unit_ids.join(", "))]
    ConversionFailed { unit_ids: Vec<String> },
    #[error(
        "conversion time budget exceeded after {converted_units} unit(s): {elapsed:?} > {budget:?}"
    )]
    TimeBudgetExceeded {
        elapsed: Duration,
        budget: Duration,
        converted_units: usize,
    },
    #[error("no words to align")]
    NoWordsToAlign,
    #[error("alignment mismatch: {message}")]
    AlignmentMismatch { message: String },
    #[error("alignment engine failed: {message}")]
    Engine { message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl AlignmentError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        Self::AlignmentMismatch {
            message: message.into(),
        }
    }

    /// For engine implementations outside this crate.
    pub fn engine(err: impl std::fmt::Display) -> Self {
        Self::Engine {
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// True when retrying with a longer conversion budget may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TimeBudgetExceeded { .. })
    }
}

impl From<roxmltree::Error> for AlignmentError {
    fn from(source: roxmltree::Error) -> Self {
        Self::Xml { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_budget_is_distinct_from_conversion_failure() {
        let budget = AlignmentError::TimeBudgetExceeded {
            elapsed: Duration::from_millis(12),
            budget: Duration::from_millis(10),
            converted_units: 3,
        };
        let failed = AlignmentError::ConversionFailed {
            unit_ids: vec!["s0w0".to_string()],
        };
        assert!(budget.is_retryable());
        assert!(!failed.is_retryable());
        assert!(failed.to_string().contains("s0w0"));
    }

    #[test]
    fn engine_error_keeps_message_verbatim() {
        let err = AlignmentError::engine("decoder returned -1");
        assert_eq!(err.to_string(), "alignment engine failed: decoder returned -1");
    }
}
