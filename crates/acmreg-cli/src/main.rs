//! acmreg CLI - Command-line interface for asbestos register extraction.

use acmreg_cli::commands;
use acmreg_cli::{Cli, Command, Config, Formatter};
use acmreg_store::SqliteStore;
use clap::Parser;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> acmreg_cli::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let store = Arc::new(Mutex::new(SqliteStore::new(&config.database_path)?));

    match cli.command {
        Command::Import(args) => commands::execute_import(args, &store, &formatter)?,
        Command::Parse(args) => commands::execute_parse(args, &store, &config, &formatter).await?,
        Command::Extract(args) => commands::execute_extract(args, &store, &config, &formatter).await?,
        Command::Records(args) => commands::execute_records(args, &store, &formatter)?,
        Command::Summary(args) => commands::execute_summary(args, &store, &formatter)?,
    }

    Ok(())
}
