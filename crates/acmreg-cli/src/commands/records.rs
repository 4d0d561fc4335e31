//! Records command implementation.

use super::{lock, SharedStore};
use crate::cli::RecordsArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use acmreg_domain::RecordStore;

/// Execute the records command.
pub fn execute_records(args: RecordsArgs, store: &SharedStore, formatter: &Formatter) -> Result<()> {
    let store = lock(store);
    let source = args.source.as_deref();

    let records = match (args.building.as_deref(), args.risk.as_deref(), source) {
        (Some(building), None, _) => store.get_by_building(building, source)?,
        (None, Some(risk), _) => store.get_by_risk_status(risk, source)?,
        (None, None, Some(source_id)) => store.get_by_source(source_id)?,
        (Some(_), Some(_), _) => {
            return Err(CliError::InvalidInput(
                "Use either --building or --risk, not both".to_string(),
            ))
        }
        (None, None, None) => {
            return Err(CliError::InvalidInput(
                "Specify --source, --building or --risk".to_string(),
            ))
        }
    };

    println!("{}", formatter.format_records(&records)?);

    Ok(())
}
