use std::path::Path;

use serde::Deserialize;

use crate::alignment::dna::DnaSegment;
use crate::error::AlignmentError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub unit_tag: String,
    pub anchor_tag: String,
    pub g2p_fallbacks: Vec<String>,
    pub g2p_time_budget_ms: u64,
    pub verbose_g2p_warnings: bool,
    pub warning_limit: usize,
    pub abort_on_invalid_g2p: bool,
    pub auto_detect_language: bool,
    pub frame_rate: f64,
    pub bare: bool,
    pub tier_tags: Vec<String>,
    pub noise_words: Vec<String>,
    #[serde(rename = "do-not-align")]
    pub do_not_align: Option<DnaConfig>,
}

impl AlignConfig {
    pub const DEFAULT_FRAME_RATE: f64 = 100.0;
    pub const DEFAULT_TIME_BUDGET_MS: u64 = 30_000;
    pub const DEFAULT_WARNING_LIMIT: usize = 2;

    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data =
            std::fs::read_to_string(path).map_err(|e| AlignmentError::io("read config", e))?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> Result<Self, AlignmentError> {
        let config: Self =
            serde_json::from_str(data).map_err(|e| AlignmentError::json("parse config", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with: a non-positive frame
    /// rate, empty tags or a do-not-align range ending before it begins.
    pub fn validate(&self) -> Result<(), AlignmentError> {
        if self.frame_rate.is_nan() || self.frame_rate <= 0.0 {
            return Err(AlignmentError::invalid_input(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if self.unit_tag.is_empty() || self.anchor_tag.is_empty() {
            return Err(AlignmentError::invalid_input("unit and anchor tags must not be empty"));
        }
        if let Some(segment) = self.dna_segments().iter().find(|s| s.begin > s.end) {
            return Err(AlignmentError::invalid_input(format!(
                "do-not-align segment ends at {} ms before it begins at {} ms",
                segment.end, segment.begin
            )));
        }
        Ok(())
    }

    /// Warning cap for the conversion pass; `None` means unlimited.
    pub fn effective_warning_limit(&self) -> Option<usize> {
        if self.verbose_g2p_warnings {
            None
        } else {
            Some(self.warning_limit)
        }
    }

    pub fn dna_segments(&self) -> &[DnaSegment] {
        self.do_not_align
            .as_ref()
            .map(|dna| dna.segments.as_slice())
            .unwrap_or(&[])
    }

    pub fn dna_method(&self) -> DnaMethod {
        self.do_not_align
            .as_ref()
            .map(|dna| dna.method)
            .unwrap_or_default()
    }
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            unit_tag: "w".to_string(),
            anchor_tag: "anchor".to_string(),
            g2p_fallbacks: Vec::new(),
            g2p_time_budget_ms: Self::DEFAULT_TIME_BUDGET_MS,
            verbose_g2p_warnings: false,
            warning_limit: Self::DEFAULT_WARNING_LIMIT,
            abort_on_invalid_g2p: true,
            auto_detect_language: false,
            frame_rate: Self::DEFAULT_FRAME_RATE,
            bare: false,
            tier_tags: vec!["s".to_string()],
            noise_words: ["<sil>", "<s>", "</s>", "[NOISE]", "(NULL)"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            do_not_align: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DnaConfig {
    #[serde(default)]
    pub segments: Vec<DnaSegment>,
    #[serde(default)]
    pub method: DnaMethod,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnaMethod {
    /// Cut the ranges out of the audio; timestamps are shifted back afterwards.
    #[default]
    Remove,
    /// Zero the ranges in place; the timeline is unchanged.
    Mute,
}
