//! Summary command implementation.

use super::{lock, SharedStore};
use crate::cli::SummaryArgs;
use crate::error::Result;
use crate::output::Formatter;
use acmreg_domain::RecordStore;

/// Execute the summary command.
pub fn execute_summary(args: SummaryArgs, store: &SharedStore, formatter: &Formatter) -> Result<()> {
    let summary = lock(store).summary_by_source(&args.source_id)?;
    println!("{}", formatter.format_summary(&args.source_id, &summary)?);
    Ok(())
}
