//! Persisted register records

use crate::context::{HierarchicalContext, UNKNOWN_SCHOOL};
use crate::issues::DataIssues;
use crate::record::ExtractedRecord;
use serde::{Deserialize, Serialize};

/// Building identifier used by the table parser before any building heading
pub const UNKNOWN_BUILDING: &str = "Unknown";

/// One row of an asbestos register as stored
///
/// Both extraction paths produce this shape: the table parser builds it
/// straight from a table row and the current context, the AI pipeline
/// converts validated [`ExtractedRecord`]s with [`AcmRecord::from_extracted`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcmRecord {
    /// Store-assigned identifier, `None` until saved
    pub id: Option<String>,
    /// Source document the record came from
    pub source_id: String,

    /// School or facility name
    pub school_name: String,
    /// School code
    pub school_code: Option<String>,

    /// Building identifier
    pub building_id: String,
    /// Building name
    pub building_name: Option<String>,
    /// Construction year
    pub building_year: Option<i32>,
    /// Construction type
    pub building_construction: Option<String>,

    /// Room identifier
    pub room_id: Option<String>,
    /// Room name
    pub room_name: Option<String>,
    /// Room area in m²
    pub room_area: Option<f64>,
    /// `Interior`, `Exterior` or `Grounds`
    pub area_type: String,

    /// Product type
    pub product: String,
    /// Material description
    pub material_description: String,
    /// Extent/coverage
    pub extent: Option<String>,
    /// Location within the room
    pub location: Option<String>,
    /// Friability
    pub friable: Option<String>,
    /// Material condition
    pub material_condition: Option<String>,
    /// Risk status
    pub risk_status: Option<String>,
    /// Normalized result
    pub result: String,
    /// Page number in the source document
    pub page_number: Option<u32>,

    /// Likelihood of disturbance
    pub disturbance_potential: Option<String>,
    /// Sample identification number
    pub sample_no: Option<String>,
    /// Laboratory result
    pub sample_result: Option<String>,
    /// Inspecting company
    pub identifying_company: Option<String>,
    /// Amount of material
    pub quantity: Option<String>,
    /// Labelled on site
    pub acm_labelled: Option<bool>,
    /// Label details
    pub acm_label_details: Option<String>,
    /// Hygienist recommendations
    pub hygienist_recommendations: Option<String>,
    /// Identifier supplied by the asset owner
    pub external_id: Option<String>,
    /// Removal status
    pub removal_status: Option<String>,
    /// Date of removal
    pub date_of_removal: Option<String>,

    /// Confidence level (`high`, `medium`, `low`), `None` for parsed rows
    pub extraction_confidence: Option<String>,
    /// Data-quality notes
    pub data_issues: DataIssues,
}

impl AcmRecord {
    /// Convert a validated model record into its persisted form
    ///
    /// School fields come from the run context; everything else is taken
    /// from the record. A missing area type is stored as `Interior`.
    pub fn from_extracted(
        source_id: &str,
        context: &HierarchicalContext,
        record: &ExtractedRecord,
    ) -> Self {
        let school_name = if context.school_name.trim().is_empty() {
            UNKNOWN_SCHOOL.to_string()
        } else {
            context.school_name.clone()
        };

        Self {
            id: None,
            source_id: source_id.to_string(),
            school_name,
            school_code: context.school_code.clone(),
            building_id: record.building_id.clone(),
            building_name: record.building_name.clone(),
            building_year: record.building_year,
            building_construction: record.building_construction.clone(),
            room_id: record.room_id.clone(),
            room_name: record.room_name.clone(),
            room_area: record.room_area,
            area_type: record
                .area_type
                .clone()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| crate::AreaType::Interior.as_str().to_string()),
            product: record.product.clone(),
            material_description: record.material_description.clone(),
            extent: record.extent.clone(),
            location: record.location.clone(),
            friable: record.friable.clone(),
            material_condition: record.material_condition.clone(),
            risk_status: record.risk_status.clone(),
            result: record.result.clone(),
            page_number: record.page_number,
            disturbance_potential: record.disturbance_potential.clone(),
            sample_no: record.sample_no.clone(),
            sample_result: record.sample_result.clone(),
            identifying_company: record.identifying_company.clone(),
            quantity: record.quantity.clone(),
            acm_labelled: record.acm_labelled,
            acm_label_details: record.acm_label_details.clone(),
            hygienist_recommendations: record.hygienist_recommendations.clone(),
            external_id: record.external_id.clone(),
            removal_status: record.removal_status.clone(),
            date_of_removal: record.date_of_removal.clone(),
            extraction_confidence: Some(record.extraction_confidence.clone()),
            data_issues: record.data_issues.clone(),
        }
    }
}

/// Per-source register statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSummary {
    /// Number of records
    pub total_records: usize,
    /// Records with risk status `High`
    pub high_risk_count: usize,
    /// Records with risk status `Medium`
    pub medium_risk_count: usize,
    /// Records with risk status `Low`
    pub low_risk_count: usize,
    /// Distinct buildings
    pub building_count: usize,
    /// Distinct non-empty rooms
    pub room_count: usize,
}
