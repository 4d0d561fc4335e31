//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use acmreg_domain::{AcmRecord, RegisterSummary};
use acmreg_extractor::{ExtractionOutput, RunStatus};
use acmreg_worker::ParseJobOutput;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format stored records.
    pub fn format_records(&self, records: &[AcmRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
            OutputFormat::Table => Ok(self.format_records_table(records)),
            OutputFormat::Quiet => Ok(records
                .iter()
                .filter_map(|r| r.id.as_deref())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_records_table(&self, records: &[AcmRecord]) -> String {
        if records.is_empty() {
            return self.colorize("No records found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record([
            "Building", "Room", "Area", "Product", "Material", "Result", "Risk", "Page", "Confidence",
        ]);

        for record in records {
            builder.push_record([
                record.building_id.clone(),
                record.room_id.clone().unwrap_or_default(),
                record.area_type.clone(),
                record.product.clone(),
                truncate(&record.material_description, 40),
                record.result.clone(),
                record.risk_status.clone().unwrap_or_default(),
                record.page_number.map(|p| p.to_string()).unwrap_or_default(),
                record.extraction_confidence.clone().unwrap_or_default(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format a source summary.
    pub fn format_summary(&self, source_id: &str, summary: &RegisterSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
            OutputFormat::Quiet => Ok(summary.total_records.to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Source", source_id]);
                builder.push_record(["Records".to_string(), summary.total_records.to_string()]);
                builder.push_record(["High risk".to_string(), summary.high_risk_count.to_string()]);
                builder.push_record(["Medium risk".to_string(), summary.medium_risk_count.to_string()]);
                builder.push_record(["Low risk".to_string(), summary.low_risk_count.to_string()]);
                builder.push_record(["Buildings".to_string(), summary.building_count.to_string()]);
                builder.push_record(["Rooms".to_string(), summary.room_count.to_string()]);

                let mut table = builder.build();
                table.with(Style::rounded());
                Ok(table.to_string())
            }
        }
    }

    /// Format the result of a parse job.
    pub fn format_parse_output(&self, output: &ParseJobOutput) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(output)?),
            OutputFormat::Quiet => Ok(output.records_created.to_string()),
            OutputFormat::Table => Ok(match &output.error_message {
                Some(message) if !output.success => self.error(message),
                _ => self.success(&format!(
                    "Parsed {}: {} record(s) created, {} replaced ({:.2}s)",
                    output.source_id, output.records_created, output.records_deleted, output.processing_time
                )),
            }),
        }
    }

    /// Format the result of an extraction job.
    pub fn format_extraction_output(&self, output: &ExtractionOutput) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(output)?),
            OutputFormat::Quiet => Ok(output.total_records.to_string()),
            OutputFormat::Table => {
                let dist = &output.confidence_distribution;
                let counts = format!(
                    "{} record(s) saved, {} failed (confidence high {} / medium {} / low {}) in {}ms",
                    output.total_records, output.records_failed, dist.high, dist.medium, dist.low, output.elapsed_ms
                );
                let mut lines = vec![match output.status {
                    RunStatus::Success => self.success(&format!("Extracted {}: {}", output.source_id, counts)),
                    RunStatus::NoData => self.warning(&format!("No register items found in {}", output.source_id)),
                    RunStatus::Failed => self.error(&format!("Extraction of {} failed: {}", output.source_id, counts)),
                }];
                if let Some(error) = &output.error {
                    lines.push(self.info(error));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
