// src/report.rs
//! Display figures layered on top of the density engine. The caution band is a
//! presentation rule only; the engine never sees the threshold.

use serde::Serialize;

use crate::density::{AnalysisResult, KeywordMatcher};

pub const DEFAULT_CAUTION_THRESHOLD: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityBand {
    /// Keyword never appears.
    Low,
    Healthy,
    /// Density above the configured threshold (likely keyword stuffing).
    Caution,
}

impl DensityBand {
    pub fn classify(result: &AnalysisResult, caution_threshold: f64) -> Self {
        if result.occurrence_count == 0 {
            DensityBand::Low
        } else if result.density_percent > caution_threshold {
            DensityBand::Caution
        } else {
            DensityBand::Healthy
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DensityBand::Low => "low",
            DensityBand::Healthy => "healthy",
            DensityBand::Caution => "caution",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordReport {
    pub keyword: String,
    pub total_words: usize,
    pub occurrence_count: usize,
    pub density_percent: f64,
    pub density_display: String,
    pub band: DensityBand,
}

impl KeywordReport {
    pub fn new(keyword: &str, result: &AnalysisResult, caution_threshold: f64) -> Self {
        Self {
            keyword: keyword.trim().to_string(),
            total_words: result.total_words,
            occurrence_count: result.occurrence_count,
            density_percent: result.density_percent,
            density_display: result.density_display(),
            band: DensityBand::classify(result, caution_threshold),
        }
    }

    /// Scores `text` and labels the report with the normalized keyword.
    /// `None` for a blank keyword.
    pub fn score(text: &str, keyword: &str, caution_threshold: f64) -> Option<Self> {
        let m = KeywordMatcher::new(keyword)?;
        Some(Self::new(m.keyword(), &m.analyze(text), caution_threshold))
    }

    /// One-line summary, e.g. `words=100 occurrences=3 density=3.00% [caution]`.
    pub fn summary_line(&self) -> String {
        format!(
            "words={} occurrences={} density={}% [{}]",
            self.total_words,
            self.occurrence_count,
            self.density_display,
            self.band.as_str()
        )
    }
}
