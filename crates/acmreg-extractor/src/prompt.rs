//! Prompt rendering for register extraction

use crate::types::Chunk;
use acmreg_domain::HierarchicalContext;
use serde_json::{json, Map, Value};

/// User-turn instruction sent alongside every rendered prompt
pub const EXTRACTION_INSTRUCTION: &str =
    "Extract ACM records from the content provided in the system prompt.";

/// Builds the system prompt for one chunk
pub struct PromptBuilder<'a> {
    context: &'a HierarchicalContext,
    chunk: &'a Chunk,
    total_chunks: usize,
}

impl<'a> PromptBuilder<'a> {
    /// Create a prompt builder for a chunk
    pub fn new(context: &'a HierarchicalContext, chunk: &'a Chunk, total_chunks: usize) -> Self {
        Self {
            context,
            chunk,
            total_chunks,
        }
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(EXTRACTION_RULES);
        prompt.push_str("\n\n");

        prompt.push_str(&format!("School: {}\n", self.context.school_name));
        if let Some(code) = &self.context.school_code {
            prompt.push_str(&format!("School code: {}\n", code));
        }
        prompt.push_str(&format!("Page: {}\n", self.chunk.page_number));
        prompt.push_str(&format!(
            "Chunk: {} of {}\n",
            self.chunk.chunk_index + 1,
            self.total_chunks.max(1)
        ));

        // Where the previous chunk left off
        if let Some(building) = self.context.building() {
            prompt.push_str(&format!(
                "Current building: {}{}\n",
                building,
                suffix(self.context.building_name.as_deref())
            ));
        }
        if let Some(room) = self.context.room_id.as_deref() {
            prompt.push_str(&format!(
                "Current room: {}{}\n",
                room,
                suffix(self.context.room_name.as_deref())
            ));
        }
        prompt.push_str(&format!("Area type: {}\n\n", self.context.area_type));

        prompt.push_str("Register content:\n");
        prompt.push_str("---\n");
        prompt.push_str(&self.chunk.content);
        prompt.push_str("\n---\n\n");

        prompt.push_str(OUTPUT_FORMAT_REMINDER);
        prompt
    }
}

fn suffix(name: Option<&str>) -> String {
    name.filter(|n| !n.trim().is_empty())
        .map(|n| format!(" ({})", n))
        .unwrap_or_default()
}

const REQUIRED_FIELDS: [&str; 4] = ["building_id", "product", "material_description", "result"];

const OPTIONAL_TEXT_FIELDS: [&str; 20] = [
    "building_name",
    "building_construction",
    "room_id",
    "room_name",
    "area_type",
    "extent",
    "location",
    "friable",
    "material_condition",
    "risk_status",
    "disturbance_potential",
    "sample_no",
    "sample_result",
    "identifying_company",
    "quantity",
    "acm_label_details",
    "hygienist_recommendations",
    "external_id",
    "removal_status",
    "date_of_removal",
];

/// JSON Schema for the model's answer
pub fn response_schema() -> String {
    let mut fields = Map::new();
    for name in REQUIRED_FIELDS {
        fields.insert(name.to_string(), json!({ "type": "string" }));
    }
    for name in OPTIONAL_TEXT_FIELDS {
        fields.insert(name.to_string(), json!({ "type": ["string", "null"] }));
    }
    fields.insert(
        "result".to_string(),
        json!({ "type": "string", "enum": ["Detected", "Not Detected", "Presumed", "Unknown"] }),
    );
    fields.insert("building_year".to_string(), json!({ "type": ["integer", "null"] }));
    fields.insert("room_area".to_string(), json!({ "type": ["number", "null"] }));
    fields.insert("acm_labelled".to_string(), json!({ "type": ["boolean", "null"] }));
    fields.insert("page_number".to_string(), json!({ "type": ["integer", "null"] }));
    fields.insert(
        "extraction_confidence".to_string(),
        json!({ "type": "string", "enum": ["high", "medium", "low"] }),
    );
    fields.insert(
        "data_issues".to_string(),
        json!({ "type": "array", "items": { "type": "string" } }),
    );

    json!({
        "type": "object",
        "required": ["records"],
        "properties": {
            "records": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": REQUIRED_FIELDS,
                    "properties": Value::Object(fields)
                }
            },
            "status": { "type": "string", "enum": ["valid", "invalid", "no_acm_data"] },
            "extraction_notes": { "type": ["string", "null"] }
        }
    })
    .to_string()
}

const EXTRACTION_RULES: &str = r#"You extract asbestos-containing material (ACM) records from a school asbestos register.

The register is organised as School > Building > Room > Area Type (Interior, Exterior, Grounds).
Each row of a register table is one record. For every record:
- building_id, product, material_description and result are required.
- result must be one of: Detected, Not Detected, Presumed, Unknown.
- Use the building and room given below when the content continues a room from an earlier chunk.
- Copy values as written; do not invent rooms, products or results.
- Set extraction_confidence to high, medium or low, and list any doubts in data_issues.
- Lines marked ">>> ACM DETECTED <<<" indicate a positive result."#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Respond with a single JSON object: {"records": [...], "status": "valid", "extraction_notes": "..."}.
If the content has no register rows, return {"records": [], "status": "no_acm_data"}."#;

#[cfg(test)]
mod tests {
    use super::*;
    use acmreg_domain::BuildingHeader;

    fn chunk(content: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            page_number: 3,
            chunk_index: 1,
        }
    }

    #[test]
    fn test_prompt_includes_context_and_content() {
        let mut context = HierarchicalContext::for_school("Hillside PS");
        context.enter_building(BuildingHeader {
            id: "B1".to_string(),
            name: "Block A".to_string(),
            year: None,
            construction: None,
        });
        let chunk = chunk("| Eaves | Fibre cement | Detected |");

        let prompt = PromptBuilder::new(&context, &chunk, 4).build();

        assert!(prompt.contains("School: Hillside PS"));
        assert!(prompt.contains("Page: 3"));
        assert!(prompt.contains("Chunk: 2 of 4"));
        assert!(prompt.contains("Current building: B1 (Block A)"));
        assert!(!prompt.contains("Current room:"));
        assert!(prompt.contains("| Eaves | Fibre cement | Detected |"));
    }

    #[test]
    fn test_schema_is_valid_json() {
        let schema: serde_json::Value = serde_json::from_str(&response_schema()).unwrap();
        assert_eq!(schema["required"][0], "records");
        let items = &schema["properties"]["records"]["items"];
        assert_eq!(items["required"].as_array().map(Vec::len), Some(4));
        assert_eq!(items["properties"]["result"]["enum"][1], "Not Detected");
        assert_eq!(items["properties"]["room_id"]["type"][1], "null");
    }
}
