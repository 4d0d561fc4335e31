//! Extraction confidence levels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence a model reported for a single extracted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionConfidence {
    /// Weakest level
    Low,
    /// Default level when a model says nothing
    Medium,
    /// Strongest level
    High,
}

impl ExtractionConfidence {
    /// All levels, strongest first
    pub const ALL: [ExtractionConfidence; 3] = [Self::High, Self::Medium, Self::Low];

    /// Parse an exact lower-case level name
    ///
    /// Returns `None` for anything else, including mixed case; callers that
    /// want leniency normalize first.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Convert to the lower-case wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Ordinal used to pick a merge base: high=3, medium=2, low=1
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

impl Default for ExtractionConfidence {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for ExtractionConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Count of records per confidence level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceDistribution {
    /// Records at `high`
    pub high: usize,
    /// Records at `medium`
    pub medium: usize,
    /// Records at `low`
    pub low: usize,
}

impl ConfidenceDistribution {
    /// Add one record at the given level
    pub fn record(&mut self, level: ExtractionConfidence) {
        match level {
            ExtractionConfidence::High => self.high += 1,
            ExtractionConfidence::Medium => self.medium += 1,
            ExtractionConfidence::Low => self.low += 1,
        }
    }

    /// Count for one level
    pub fn get(&self, level: ExtractionConfidence) -> usize {
        match level {
            ExtractionConfidence::High => self.high,
            ExtractionConfidence::Medium => self.medium,
            ExtractionConfidence::Low => self.low,
        }
    }

    /// Sum across levels
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

impl FromIterator<ExtractionConfidence> for ConfidenceDistribution {
    fn from_iter<I: IntoIterator<Item = ExtractionConfidence>>(iter: I) -> Self {
        let mut distribution = Self::default();
        for level in iter {
            distribution.record(level);
        }
        distribution
    }
}
