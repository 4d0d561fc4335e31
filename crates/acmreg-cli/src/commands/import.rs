//! Import command implementation.

use super::{lock, SharedStore};
use crate::cli::ImportArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use acmreg_domain::Source;
use std::fs;
use std::path::Path;
use tracing::info;

/// Execute the import command.
pub fn execute_import(args: ImportArgs, store: &SharedStore, formatter: &Formatter) -> Result<()> {
    let text = fs::read_to_string(&args.file)?;
    let source = build_source(&args.file, args.id, args.title, text)?;

    lock(store).put_source(&source)?;

    let chars = source.full_text.as_deref().map_or(0, |t| t.chars().count());
    info!(source_id = %source.id, chars, "Imported source");
    println!("{}", formatter.success(&format!("Imported source {} ({} chars)", source.id, chars)));

    Ok(())
}

fn build_source(file: &Path, id: Option<String>, title: Option<String>, text: String) -> Result<Source> {
    let id = match id {
        Some(id) => id,
        None => file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .ok_or_else(|| CliError::InvalidInput(format!("Cannot derive a source ID from {}", file.display())))?,
    };

    if id.trim().is_empty() {
        return Err(CliError::InvalidInput("Source ID must not be empty".to_string()));
    }

    let source = Source::new(id, text);
    Ok(match title {
        Some(title) => source.with_title(title),
        None => source,
    })
}
