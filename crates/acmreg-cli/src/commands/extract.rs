//! Extract command implementation.

use super::SharedStore;
use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use acmreg_extractor::{ExtractionPipeline, ExtractionRequest, RunStatus};
use acmreg_llm::OllamaProvider;
use acmreg_worker::JobRunner;
use std::sync::Arc;
use std::time::Duration;

/// Execute the extract command.
pub async fn execute_extract(
    args: ExtractArgs,
    store: &SharedStore,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let pipeline = ExtractionPipeline::new(
        build_provider(config),
        Arc::clone(store),
        Arc::clone(store),
        config.extractor.clone(),
    )
    .with_validation(config.validation.clone());
    let runner = JobRunner::new(config.worker.clone())?;

    let request = ExtractionRequest {
        source_id: args.source_id,
        model_id: args.model,
        force: args.force,
    };
    let output = runner.extract(&pipeline, &request).await;

    println!("{}", formatter.format_extraction_output(&output)?);

    if output.status == RunStatus::Failed {
        return Err(CliError::JobFailed(output.error.unwrap_or_default()));
    }
    Ok(())
}

/// Ollama provider with the configured model routing
fn build_provider(config: &Config) -> OllamaProvider {
    let ollama = &config.ollama;
    let mut provider = OllamaProvider::new(&ollama.endpoint, &ollama.model).with_timeout(http_timeout(config));

    for (purpose, model) in &ollama.purpose_models {
        provider = provider.with_purpose_model(purpose, model);
    }
    if let Some(model) = &ollama.large_context_model {
        provider = provider.with_large_context_model(model, ollama.large_context_threshold_chars);
    }
    provider
}

/// HTTP timeout, never longer than the pipeline's per-call deadline
fn http_timeout(config: &Config) -> Duration {
    Duration::from_secs(config.ollama.timeout_secs).min(config.extractor.extraction_timeout())
}
