//! Parse model answers into extracted records

use crate::error::ExtractorError;
use acmreg_domain::ExtractedRecord;
use serde::Deserialize;

/// A model answer for one chunk
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelResponse {
    /// Extracted records, in document order
    pub records: Vec<ExtractedRecord>,

    /// Model-reported status (`valid`, `invalid`, `no_acm_data`)
    #[serde(default)]
    pub status: Option<String>,

    /// Free-form notes from the model
    #[serde(default)]
    pub extraction_notes: Option<String>,
}

/// Parse a raw model answer
///
/// The answer must be a JSON object with a `records` array. Anything else
/// is an [`ExtractorError::InvalidFormat`], which the pipeline retries.
pub fn parse_model_response(raw: &str) -> Result<ModelResponse, ExtractorError> {
    let json = extract_json(raw)?;
    serde_json::from_str(json)
        .map_err(|e| ExtractorError::InvalidFormat(format!("JSON parse error: {}", e)))
}

/// Strip a Markdown code fence if the model added one
fn extract_json(raw: &str) -> Result<&str, ExtractorError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractorError::InvalidFormat("Empty response".to_string()));
    }

    if let Some(rest) = trimmed.strip_prefix("```") {
        let body = rest.strip_prefix("json").unwrap_or(rest);
        let body = body.strip_suffix("```").unwrap_or(body).trim();
        if body.is_empty() {
            return Err(ExtractorError::InvalidFormat("Empty code block".to_string()));
        }
        return Ok(body);
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_records() {
        let raw = r#"{"records": [{"building_id": "B1", "product": "Eaves",
            "material_description": "Fibre cement", "result": "Detected",
            "extraction_confidence": "high"}], "status": "valid"}"#;
        let response = parse_model_response(raw).unwrap();
        assert_eq!(response.records.len(), 1);
        assert_eq!(response.records[0].product, "Eaves");
        assert_eq!(response.status.as_deref(), Some("valid"));
        assert_eq!(response.extraction_notes, None);
    }

    #[test]
    fn test_strips_code_fence() {
        let raw = "```json\n{\"records\": []}\n```";
        let response = parse_model_response(raw).unwrap();
        assert!(response.records.is_empty());
    }

    #[test]
    fn test_nulls_in_required_fields_are_empty() {
        let raw = r#"{"records": [{"building_id": null, "product": "Pipe",
            "material_description": "Lagging", "result": null, "extraction_confidence": null}]}"#;
        let response = parse_model_response(raw).unwrap();
        let record = &response.records[0];
        assert_eq!(record.building_id, "");
        assert_eq!(record.result, "");
        assert_eq!(record.extraction_confidence, "medium");
    }

    #[test]
    fn test_invalid_shapes() {
        for raw in ["", "not json", "[]", "{\"status\": \"valid\"}", "{\"records\": 3}", "```\n```"] {
            assert!(
                matches!(parse_model_response(raw), Err(ExtractorError::InvalidFormat(_))),
                "accepted {:?}",
                raw
            );
        }
    }
}
