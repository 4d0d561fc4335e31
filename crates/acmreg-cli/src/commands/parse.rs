//! Parse command implementation.

use super::SharedStore;
use crate::cli::ParseArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use acmreg_worker::{JobRunner, ParseJobInput};

/// Execute the parse command.
pub async fn execute_parse(
    args: ParseArgs,
    store: &SharedStore,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let runner = JobRunner::new(config.worker.clone())?;

    let output = runner
        .parse_register(store.as_ref(), store.as_ref(), &ParseJobInput::new(args.source_id))
        .await;

    println!("{}", formatter.format_parse_output(&output)?);

    if !output.success {
        return Err(CliError::JobFailed(output.error_message.unwrap_or_default()));
    }
    Ok(())
}
