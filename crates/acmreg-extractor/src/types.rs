//! Request and result types for extraction runs

use acmreg_domain::{ConfidenceDistribution, ExtractedRecord};
use serde::{Deserialize, Serialize};

/// A bounded slice of document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk text
    pub content: String,

    /// Best-effort page the chunk starts on
    pub page_number: u32,

    /// Position in the chunk sequence (0-based)
    pub chunk_index: usize,
}

/// Request to run AI extraction for one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Source document ID
    pub source_id: String,

    /// Specific model, or the provisioner's default
    #[serde(default)]
    pub model_id: Option<String>,

    /// Delete existing records for the source first
    #[serde(default)]
    pub force: bool,
}

impl ExtractionRequest {
    /// Request with default model and no forced re-extraction
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            model_id: None,
            force: false,
        }
    }
}

/// Status of the records produced by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// At least one record saved
    Valid,
    /// Nothing saved
    NoData,
    /// Run failed
    Invalid,
}

/// Records and counters from a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRunResult {
    /// Deduplicated records, in first-seen order
    pub records: Vec<ExtractedRecord>,

    /// Overall status
    pub status: ExtractionStatus,

    /// Records saved
    pub total_records: usize,

    /// Records rejected by validation
    pub records_rejected: usize,

    /// Saved records per confidence level
    pub confidence_distribution: ConfidenceDistribution,
}

impl ExtractionRunResult {
    /// Result for a run that produced nothing
    pub fn empty(status: ExtractionStatus) -> Self {
        Self {
            records: Vec::new(),
            status,
            total_records: 0,
            records_rejected: 0,
            confidence_distribution: ConfidenceDistribution::default(),
        }
    }
}

/// Outcome reported to the job runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Records were saved
    Success,
    /// The run or some saves failed
    Failed,
    /// The document held no register items
    NoData,
}

impl RunStatus {
    /// Lower-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
            RunStatus::NoData => "no_data",
        }
    }
}

/// Structured summary of an extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Source document ID
    pub source_id: String,

    /// Outcome
    pub status: RunStatus,

    /// Records saved
    pub total_records: usize,

    /// Records rejected by validation plus records that failed to save
    pub records_failed: usize,

    /// Saved records per confidence level
    pub confidence_distribution: ConfidenceDistribution,

    /// Human-readable error, if any
    pub error: Option<String>,

    /// Wall-clock time of the run
    pub elapsed_ms: u64,
}

impl ExtractionOutput {
    /// Output for a run that failed before producing anything
    pub fn failed(source_id: impl Into<String>, error: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            source_id: source_id.into(),
            status: RunStatus::Failed,
            total_records: 0,
            records_failed: 0,
            confidence_distribution: ConfidenceDistribution::default(),
            error: Some(error.into()),
            elapsed_ms,
        }
    }
}
