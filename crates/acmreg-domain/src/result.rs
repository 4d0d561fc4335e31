//! Asbestos test result normalization

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized asbestos test result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultStatus {
    /// Asbestos detected
    #[serde(rename = "Detected")]
    Detected,
    /// No asbestos detected
    #[serde(rename = "Not Detected")]
    NotDetected,
    /// Presumed to contain asbestos
    #[serde(rename = "Presumed")]
    Presumed,
    /// No result reported
    #[serde(rename = "Unknown")]
    Unknown,
}

impl ResultStatus {
    /// Display name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detected => "Detected",
            Self::NotDetected => "Not Detected",
            Self::Presumed => "Presumed",
            Self::Unknown => "Unknown",
        }
    }

    /// Classify a model-reported result
    ///
    /// Substring rules, first match wins:
    /// `no asbestos` / `nad` / `not detected` → Not Detected,
    /// `detected` / `positive` → Detected, `presumed` → Presumed.
    /// Blank input is Unknown. Anything else is `None` and should be kept
    /// verbatim.
    pub fn classify(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_lowercase();
        if lower.is_empty() {
            return Some(Self::Unknown);
        }
        if lower.contains("no asbestos") || lower.contains("nad") || lower.contains("not detected") {
            Some(Self::NotDetected)
        } else if lower.contains("detected") || lower.contains("positive") {
            Some(Self::Detected)
        } else if lower.contains("presumed") {
            Some(Self::Presumed)
        } else {
            None
        }
    }

    /// Normalize a table cell from a parsed register
    ///
    /// Tables use a narrower rule than model output: `no asbestos` →
    /// Not Detected, otherwise `detected` → Detected, otherwise the cell is
    /// returned unchanged.
    pub fn normalize_table_cell(raw: &str) -> String {
        let lower = raw.to_lowercase();
        if lower.contains("no asbestos") {
            Self::NotDetected.as_str().to_string()
        } else if lower.contains("detected") {
            Self::Detected.as_str().to_string()
        } else {
            raw.to_string()
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
