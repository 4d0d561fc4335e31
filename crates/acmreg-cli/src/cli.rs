//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// acmreg CLI - Extract asbestos register records from converted documents.
#[derive(Debug, Parser)]
#[command(name = "acmreg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file (overrides the configuration)
    #[arg(long, global = true, env = "ACMREG_DATABASE")]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a converted document as a source
    Import(ImportArgs),

    /// Parse register tables from a source
    Parse(ParseArgs),

    /// Extract records from a source with a language model
    Extract(ExtractArgs),

    /// List stored records
    Records(RecordsArgs),

    /// Show risk and location counts for a source
    Summary(SummaryArgs),
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// Markdown or text file produced by the document converter
    pub file: PathBuf,

    /// Source ID (defaults to the file name without extension)
    #[arg(short, long)]
    pub id: Option<String>,

    /// Document title, used as the school name
    #[arg(short, long)]
    pub title: Option<String>,
}

/// Arguments for the parse command.
#[derive(Debug, Parser)]
pub struct ParseArgs {
    /// Source ID
    pub source_id: String,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Source ID
    pub source_id: String,

    /// Model to use instead of the configured default
    #[arg(short, long)]
    pub model: Option<String>,

    /// Delete existing records for the source first
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the records command.
#[derive(Debug, Parser)]
pub struct RecordsArgs {
    /// Filter by source ID
    #[arg(short, long)]
    pub source: Option<String>,

    /// Filter by building ID
    #[arg(short, long)]
    pub building: Option<String>,

    /// Filter by risk status (e.g. High)
    #[arg(short, long)]
    pub risk: Option<String>,
}

/// Arguments for the summary command.
#[derive(Debug, Parser)]
pub struct SummaryArgs {
    /// Source ID
    pub source_id: String,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
