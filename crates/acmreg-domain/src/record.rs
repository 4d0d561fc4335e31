//! Records as returned by a model

use crate::confidence::ExtractionConfidence;
use crate::issues::DataIssues;
use serde::{Deserialize, Deserializer, Serialize};

/// A single register item extracted by a model
///
/// The four identifying fields are plain strings that may be empty: models
/// routinely drop them, and the gatekeeper decides whether a record can be
/// repaired (building from context) or must be rejected. `null` is read as
/// empty for the same reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Building identifier (e.g. `A1`)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub building_id: String,
    /// Product type (e.g. `Ceiling Tiles`)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub product: String,
    /// Material description
    #[serde(default, deserialize_with = "null_as_empty")]
    pub material_description: String,
    /// Reported result, free-form until normalized
    #[serde(default, deserialize_with = "null_as_empty")]
    pub result: String,

    /// Building name
    #[serde(default)]
    pub building_name: Option<String>,
    /// Construction year
    #[serde(default)]
    pub building_year: Option<i32>,
    /// Construction type
    #[serde(default)]
    pub building_construction: Option<String>,
    /// Room identifier
    #[serde(default)]
    pub room_id: Option<String>,
    /// Room name
    #[serde(default)]
    pub room_name: Option<String>,
    /// Room area in m²
    #[serde(default)]
    pub room_area: Option<f64>,
    /// `Interior`, `Exterior` or `Grounds`
    #[serde(default)]
    pub area_type: Option<String>,

    /// Extent/coverage of the material
    #[serde(default)]
    pub extent: Option<String>,
    /// Location within the room
    #[serde(default)]
    pub location: Option<String>,
    /// `Friable` or `Non Friable`
    #[serde(default)]
    pub friable: Option<String>,
    /// Material condition
    #[serde(default)]
    pub material_condition: Option<String>,
    /// Risk status
    #[serde(default)]
    pub risk_status: Option<String>,

    /// Likelihood of disturbance
    #[serde(default)]
    pub disturbance_potential: Option<String>,
    /// Sample identification number
    #[serde(default)]
    pub sample_no: Option<String>,
    /// Laboratory result for the sample
    #[serde(default)]
    pub sample_result: Option<String>,
    /// Consulting company that performed the inspection
    #[serde(default)]
    pub identifying_company: Option<String>,
    /// Amount of material
    #[serde(default)]
    pub quantity: Option<String>,
    /// Whether the material is labelled on site
    #[serde(default)]
    pub acm_labelled: Option<bool>,
    /// Label details
    #[serde(default)]
    pub acm_label_details: Option<String>,
    /// Hygienist recommendations
    #[serde(default)]
    pub hygienist_recommendations: Option<String>,
    /// Identifier supplied by the asset owner
    #[serde(default)]
    pub external_id: Option<String>,
    /// Removal status
    #[serde(default)]
    pub removal_status: Option<String>,
    /// Date of removal
    #[serde(default)]
    pub date_of_removal: Option<String>,

    /// Model-reported confidence, free-form until normalized
    #[serde(default = "default_confidence", deserialize_with = "null_as_medium")]
    pub extraction_confidence: String,
    /// Data-quality notes
    #[serde(default)]
    pub data_issues: DataIssues,
    /// Page the record was found on
    #[serde(default)]
    pub page_number: Option<u32>,
}

impl ExtractedRecord {
    /// Confidence level, if the reported value is a known level
    pub fn confidence(&self) -> Option<ExtractionConfidence> {
        ExtractionConfidence::parse(&self.extraction_confidence)
    }

    /// Merge rank of the reported confidence; unknown values rank 0
    pub fn confidence_rank(&self) -> u8 {
        self.confidence().map(|c| c.rank()).unwrap_or(0)
    }

    /// True when building, product and description are all present
    pub fn has_required_fields(&self) -> bool {
        !self.building_id.trim().is_empty()
            && !self.product.trim().is_empty()
            && !self.material_description.trim().is_empty()
    }
}

fn default_confidence() -> String {
    ExtractionConfidence::Medium.as_str().to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_medium<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_confidence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_defaults() {
        let record: ExtractedRecord = serde_json::from_str(
            r#"{"building_id": "B1", "product": "Tiles", "material_description": "Vinyl", "result": "Detected"}"#,
        )
        .unwrap();

        assert_eq!(record.building_id, "B1");
        assert_eq!(record.extraction_confidence, "medium");
        assert!(record.data_issues.is_empty());
        assert_eq!(record.room_id, None);
        assert!(record.has_required_fields());
    }

    #[test]
    fn test_nulls_read_as_empty() {
        let record: ExtractedRecord = serde_json::from_str(
            r#"{"building_id": null, "product": "Tiles", "material_description": "Vinyl", "result": null, "extraction_confidence": null}"#,
        )
        .unwrap();

        assert_eq!(record.building_id, "");
        assert_eq!(record.result, "");
        assert_eq!(record.extraction_confidence, "medium");
        assert!(!record.has_required_fields());
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let parsed: Result<ExtractedRecord, _> =
            serde_json::from_str(r#"{"building_id": 7, "product": "Tiles"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_confidence_rank() {
        let mut record = ExtractedRecord {
            extraction_confidence: "high".to_string(),
            ..Default::default()
        };
        assert_eq!(record.confidence_rank(), 3);

        record.extraction_confidence = "unsure".to_string();
        assert_eq!(record.confidence(), None);
        assert_eq!(record.confidence_rank(), 0);
    }
}
