//! Record validation logic

use crate::ValidationConfig;
use acmreg_domain::{ExtractedRecord, ExtractionConfidence, HierarchicalContext, ResultStatus};
use tracing::{debug, info, warn};

/// Data-issue notes added during validation
pub mod issues {
    /// building_id was empty
    pub const MISSING_BUILDING_ID: &str = "missing building_id";
    /// product was empty
    pub const MISSING_PRODUCT: &str = "missing product";
    /// material_description was empty
    pub const MISSING_MATERIAL_DESCRIPTION: &str = "missing material_description";
    /// building_id was filled from the running context
    pub const BUILDING_INFERRED: &str = "building id inferred from context";
    /// result was empty and set to Unknown
    pub const RESULT_EMPTY: &str = "result was empty, set to Unknown";
    /// extraction_confidence was not a known level
    pub const CONFIDENCE_NORMALIZED: &str = "invalid confidence value normalized to medium";
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Record kept
    Accepted,

    /// Record excluded from output
    Rejected,
}

/// Reasons for rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// No building_id and none could be inferred
    MissingBuildingId,

    /// No product
    MissingProduct,

    /// No material_description
    MissingMaterialDescription,
}

/// Result of validating one record
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the record passed validation
    pub status: ValidationStatus,

    /// Rejection reasons (empty when accepted)
    pub reasons: Vec<RejectionReason>,

    /// The normalized record
    pub record: ExtractedRecord,
}

/// Partitioned output of a validation pass
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Records that passed, in input order
    pub accepted: Vec<ExtractedRecord>,

    /// Rejected records with their reasons
    pub rejected: Vec<ValidationResult>,
}

impl ValidationReport {
    /// Number of rejected records
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// The Gatekeeper validates extracted records before deduplication
#[derive(Debug, Clone, Default)]
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Normalize one record and decide whether it survives
    ///
    /// Issues are appended after any the model reported: missing fields
    /// first, then building inference, then result and confidence notes.
    pub fn validate(&self, mut record: ExtractedRecord, context: &HierarchicalContext) -> ValidationResult {
        let missing_building = is_blank(&record.building_id);
        if missing_building {
            record.data_issues.insert(issues::MISSING_BUILDING_ID);
        }
        if is_blank(&record.product) {
            record.data_issues.insert(issues::MISSING_PRODUCT);
        }
        if is_blank(&record.material_description) {
            record.data_issues.insert(issues::MISSING_MATERIAL_DESCRIPTION);
        }

        if missing_building && self.config.infer_building_from_context {
            if let Some(building) = context.building() {
                record.building_id = building.to_string();
                record.data_issues.insert(issues::BUILDING_INFERRED);
            }
        }

        match ResultStatus::classify(&record.result) {
            Some(ResultStatus::Unknown) => {
                record.result = ResultStatus::Unknown.as_str().to_string();
                record.data_issues.insert(issues::RESULT_EMPTY);
            }
            Some(status) => record.result = status.as_str().to_string(),
            None => {}
        }

        let normalized = record.extraction_confidence.trim().to_lowercase();
        match ExtractionConfidence::parse(&normalized) {
            Some(level) => record.extraction_confidence = level.as_str().to_string(),
            None => {
                record.extraction_confidence = ExtractionConfidence::Medium.as_str().to_string();
                record.data_issues.insert(issues::CONFIDENCE_NORMALIZED);
            }
        }

        let mut reasons = Vec::new();
        if is_blank(&record.building_id) {
            reasons.push(RejectionReason::MissingBuildingId);
        }
        if is_blank(&record.product) {
            reasons.push(RejectionReason::MissingProduct);
        }
        if is_blank(&record.material_description) {
            reasons.push(RejectionReason::MissingMaterialDescription);
        }

        let status = if reasons.is_empty() {
            ValidationStatus::Accepted
        } else {
            ValidationStatus::Rejected
        };

        ValidationResult {
            status,
            reasons,
            record,
        }
    }

    /// Validate a batch, partitioning into accepted and rejected
    pub fn validate_all(
        &self,
        records: Vec<ExtractedRecord>,
        context: &HierarchicalContext,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();

        for record in records {
            let result = self.validate(record, context);
            match result.status {
                ValidationStatus::Accepted => report.accepted.push(result.record),
                ValidationStatus::Rejected => {
                    warn!(
                        reasons = ?result.reasons,
                        issues = ?result.record.data_issues.as_slice(),
                        "Rejected record due to missing required fields"
                    );
                    report.rejected.push(result);
                }
            }
        }

        if report.rejected_count() > 0 {
            info!(
                accepted = report.accepted.len(),
                rejected = report.rejected_count(),
                "Validated records"
            );
        } else {
            debug!(accepted = report.accepted.len(), "Validated records");
        }

        report
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
