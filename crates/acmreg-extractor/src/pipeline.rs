//! Staged AI extraction pipeline
//!
//! A run moves through a fixed set of stages:
//!
//! ```text
//! Prepare → Extract ⟲ → Validate → Deduplicate → Save → Done
//!    │         │           │
//!    └─────────┴───────────┴──→ Failed
//! ```
//!
//! Extract loops once per chunk and once per retry. Stage handlers mutate a
//! [`RunState`] value; [`next_stage`] picks the following stage from that
//! state alone.

use crate::chunking::Chunker;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::observer::{NoopObserver, StageEvent, StageObserver};
use crate::patterns::school_title;
use crate::preprocess::preprocess;
use crate::prompt::{response_schema, PromptBuilder, EXTRACTION_INSTRUCTION};
use crate::response::{parse_model_response, ModelResponse};
use crate::types::{
    Chunk, ExtractionOutput, ExtractionRequest, ExtractionRunResult, ExtractionStatus, RunStatus,
};
use acmreg_domain::{
    AcmRecord, Classify, ConfidenceDistribution, ExtractedRecord, HierarchicalContext,
    ModelProvisioner, ModelSpec, RecordStore, SourceProvider, StructuredModel,
};
use acmreg_gatekeeper::{Deduplicator, Gatekeeper, ValidationConfig};
use std::fmt::{self, Display};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Load, preprocess and chunk the source
    Prepare,
    /// Run the model over the current chunk
    Extract,
    /// Check required fields and normalize values
    Validate,
    /// Merge duplicate records
    Deduplicate,
    /// Persist records
    Save,
    /// Finished normally
    Done,
    /// Finished with an error
    Failed,
}

impl Stage {
    /// Done or Failed
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    /// Lower-case name
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Prepare => "prepare",
            Stage::Extract => "extract",
            Stage::Validate => "validate",
            Stage::Deduplicate => "deduplicate",
            Stage::Save => "save",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The facts [`next_stage`] needs from a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// An error has been recorded
    pub failed: bool,
    /// The current chunk is waiting for another attempt
    pub retry_pending: bool,
    /// Chunks remain after the current index
    pub chunks_remaining: bool,
}

/// Transition function of the pipeline
///
/// Any recorded error sends a non-terminal stage to Failed. Terminal
/// stages stay where they are.
pub fn next_stage(stage: Stage, progress: Progress) -> Stage {
    if stage.is_terminal() {
        return stage;
    }
    if progress.failed {
        return Stage::Failed;
    }
    match stage {
        Stage::Prepare => Stage::Extract,
        Stage::Extract if progress.retry_pending || progress.chunks_remaining => Stage::Extract,
        Stage::Extract => Stage::Validate,
        Stage::Validate => Stage::Deduplicate,
        Stage::Deduplicate => Stage::Save,
        Stage::Save | Stage::Done => Stage::Done,
        Stage::Failed => Stage::Failed,
    }
}

/// Working state of one run
#[derive(Debug, Clone)]
pub struct RunState {
    /// Source being extracted
    pub source_id: String,
    /// Requested model, if any
    pub model_id: Option<String>,
    /// Chunks produced by Prepare
    pub chunks: Vec<Chunk>,
    /// Next chunk to extract
    pub chunk_index: usize,
    /// Retries spent on the current chunk
    pub retry_count: u32,
    /// Position in the document, bridged across chunks
    pub context: HierarchicalContext,
    /// Records gathered so far
    pub records: Vec<ExtractedRecord>,
    /// Records rejected by validation
    pub records_rejected: usize,
    /// Fatal error, if any
    pub error: Option<ExtractorError>,
    /// Messages from failed saves
    pub save_errors: Vec<String>,
    /// Result assembled by Save
    pub result: Option<ExtractionRunResult>,
}

impl RunState {
    /// Fresh state for a request
    pub fn new(request: &ExtractionRequest) -> Self {
        Self {
            source_id: request.source_id.clone(),
            model_id: request.model_id.clone(),
            chunks: Vec::new(),
            chunk_index: 0,
            retry_count: 0,
            context: HierarchicalContext::default(),
            records: Vec::new(),
            records_rejected: 0,
            error: None,
            save_errors: Vec::new(),
            result: None,
        }
    }

    /// Facts for the transition function
    pub fn progress(&self) -> Progress {
        Progress {
            failed: self.error.is_some(),
            retry_pending: self.retry_count > 0 && self.chunk_index < self.chunks.len(),
            chunks_remaining: self.chunk_index < self.chunks.len(),
        }
    }
}

/// AI extraction pipeline over a source provider, a model provisioner and a record store
pub struct ExtractionPipeline<P, S, R> {
    provisioner: Arc<P>,
    sources: Arc<S>,
    store: Arc<Mutex<R>>,
    gatekeeper: Gatekeeper,
    deduplicator: Deduplicator,
    config: ExtractorConfig,
    observer: Arc<dyn StageObserver>,
}

impl<P, S, R> ExtractionPipeline<P, S, R>
where
    P: ModelProvisioner + Send + Sync + 'static,
    P::Error: Classify + Display,
    S: SourceProvider,
    S::Error: Classify + Display,
    R: RecordStore,
    R::Error: Classify + Display,
{
    /// Create a new pipeline
    pub fn new(provisioner: P, sources: Arc<S>, store: Arc<Mutex<R>>, config: ExtractorConfig) -> Self {
        Self {
            provisioner: Arc::new(provisioner),
            sources,
            store,
            gatekeeper: Gatekeeper::default(),
            deduplicator: Deduplicator::default(),
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Use a specific validation configuration
    pub fn with_validation(mut self, config: ValidationConfig) -> Self {
        self.gatekeeper = Gatekeeper::new(config.clone());
        self.deduplicator = Deduplicator::new(config);
        self
    }

    /// Attach an observer
    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Pipeline configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Run extraction for one source
    ///
    /// Always returns an output; failures are reported in its status and
    /// error fields.
    pub async fn run_extraction(&self, request: &ExtractionRequest) -> ExtractionOutput {
        let started = Instant::now();
        match self.execute(request).await {
            Ok(output) => output,
            Err(e) => ExtractionOutput::failed(&request.source_id, e.to_string(), elapsed_ms(started)),
        }
    }

    /// Run extraction, surfacing transient failures as errors
    ///
    /// Returns `Err` only when the run ended on a transient error outside
    /// the per-chunk retry loop (source lookup or the forced delete), so an
    /// outer job runner can retry the whole run. Every other outcome,
    /// including fatal failures, is an `Ok` output.
    pub async fn execute(&self, request: &ExtractionRequest) -> Result<ExtractionOutput, ExtractorError> {
        let started = Instant::now();

        if let Err(message) = self.config.validate() {
            return Ok(ExtractionOutput::failed(
                &request.source_id,
                ExtractorError::Config(message).to_string(),
                elapsed_ms(started),
            ));
        }

        info!(source_id = %request.source_id, force = request.force, "Starting extraction");

        if request.force {
            match self.lock_store().delete_by_source(&request.source_id) {
                Ok(deleted) => info!("Deleted {} existing records for {}", deleted, request.source_id),
                Err(e) => {
                    let e = ExtractorError::store(e);
                    error!("Failed to delete existing records: {}", e);
                    if e.is_transient() {
                        return Err(e);
                    }
                    return Ok(ExtractionOutput::failed(&request.source_id, e.to_string(), elapsed_ms(started)));
                }
            }
        }

        let mut state = RunState::new(request);
        let mut stage = Stage::Prepare;

        while !stage.is_terminal() {
            self.observer.on_event(&state.source_id, &StageEvent::Entered { stage });
            match stage {
                Stage::Prepare => self.prepare(&mut state),
                Stage::Extract => self.extract(&mut state).await,
                Stage::Validate => self.validate(&mut state),
                Stage::Deduplicate => self.deduplicate(&mut state),
                Stage::Save => self.save(&mut state),
                Stage::Done | Stage::Failed => {}
            }
            stage = next_stage(stage, state.progress());
        }

        let elapsed = elapsed_ms(started);

        if let Some(e) = state.error.take() {
            self.observer.on_event(&state.source_id, &StageEvent::Finished { stage, records: 0 });
            error!(source_id = %state.source_id, "Extraction failed: {}", e);
            if e.is_transient() {
                return Err(e);
            }
            let mut output = ExtractionOutput::failed(&state.source_id, e.to_string(), elapsed);
            output.records_failed = state.records_rejected;
            return Ok(output);
        }

        let result = state
            .result
            .take()
            .unwrap_or_else(|| ExtractionRunResult::empty(ExtractionStatus::NoData));
        let failed_saves = state.save_errors.len();
        let error = state.save_errors.first().map(|first| {
            format!(
                "Saved {} records, {} failed: {}",
                result.total_records, failed_saves, first
            )
        });
        let status = if error.is_some() {
            RunStatus::Failed
        } else if result.total_records > 0 {
            RunStatus::Success
        } else {
            RunStatus::NoData
        };

        self.observer.on_event(
            &state.source_id,
            &StageEvent::Finished {
                stage,
                records: result.total_records,
            },
        );
        info!(
            source_id = %state.source_id,
            status = status.as_str(),
            saved = result.total_records,
            rejected = result.records_rejected,
            failed_saves,
            elapsed_ms = elapsed,
            "Extraction complete"
        );

        Ok(ExtractionOutput {
            source_id: state.source_id,
            status,
            total_records: result.total_records,
            records_failed: result.records_rejected + failed_saves,
            confidence_distribution: result.confidence_distribution,
            error,
            elapsed_ms: elapsed,
        })
    }

    fn prepare(&self, state: &mut RunState) {
        let source = match self.sources.get_source(&state.source_id) {
            Ok(Some(source)) => source,
            Ok(None) => {
                state.error = Some(ExtractorError::SourceNotFound(state.source_id.clone()));
                return;
            }
            Err(e) => {
                state.error = Some(ExtractorError::source_lookup(e));
                return;
            }
        };

        let Some(text) = source.text() else {
            warn!("Source {} has no content", state.source_id);
            state.error = Some(ExtractorError::NoContent);
            return;
        };

        let (processed, metadata) = preprocess(text);
        let chunks = Chunker::from_config(&self.config).chunk(&processed);

        // Document title first, then the register's own heading
        let school = source
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| school_title(text));
        state.context = school
            .as_deref()
            .map(HierarchicalContext::for_school)
            .unwrap_or_default();

        self.observer.on_event(
            &state.source_id,
            &StageEvent::Prepared {
                content: &processed,
                metadata: &metadata,
                chunks: chunks.len(),
            },
        );
        info!(
            rooms = metadata.rooms_found,
            buildings = metadata.buildings_found,
            acm_indicators = metadata.acm_indicators_found,
            chunks = chunks.len(),
            "Prepared {} chars for extraction",
            metadata.processed_length
        );

        state.chunks = chunks;
        state.chunk_index = 0;
        state.retry_count = 0;
    }

    async fn extract(&self, state: &mut RunState) {
        let total = state.chunks.len();
        let index = state.chunk_index;
        let Some(chunk) = state.chunks.get(index).cloned() else {
            state.error = Some(ExtractorError::Config("No chunks to process".to_string()));
            return;
        };

        state.context.set_page(chunk.page_number);
        let prompt = PromptBuilder::new(&state.context, &chunk, total).build();
        self.observer.on_event(
            &state.source_id,
            &StageEvent::PromptRendered {
                chunk_index: index,
                total_chunks: total,
                prompt: &prompt,
            },
        );
        debug!("Chunk {}/{}: {} chars", index + 1, total, chunk.content.len());

        let temperature = self.config.temperature_for(state.retry_count);
        match self
            .call_model(&chunk.content, prompt, state.model_id.clone(), temperature)
            .await
        {
            Ok(response) => {
                let ModelResponse {
                    mut records,
                    extraction_notes,
                    ..
                } = response;
                if records.is_empty() {
                    warn!(notes = ?extraction_notes, "No records extracted from chunk {}", index + 1);
                }
                for record in &mut records {
                    record.page_number.get_or_insert(chunk.page_number);
                }
                if let Some(last) = records.last() {
                    state.context.bridge_from(last);
                }

                info!("Extracted {} records from chunk {}/{}", records.len(), index + 1, total);
                self.observer.on_event(
                    &state.source_id,
                    &StageEvent::ChunkExtracted {
                        chunk_index: index,
                        records: records.len(),
                    },
                );

                state.records.extend(records);
                state.chunk_index += 1;
                state.retry_count = 0;
            }
            Err(e) if e.is_transient() && state.retry_count < self.config.max_retries => {
                let delay = self.config.retry_delay(state.retry_count);
                state.retry_count += 1;
                warn!(
                    "Chunk {}/{} failed: {}. Retrying in {:?} (attempt {}/{})",
                    index + 1,
                    total,
                    e,
                    delay,
                    state.retry_count,
                    self.config.max_retries
                );
                self.observer.on_event(
                    &state.source_id,
                    &StageEvent::RetryScheduled {
                        chunk_index: index,
                        retry: state.retry_count,
                        delay,
                        error: &e.to_string(),
                    },
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) if e.is_transient() => {
                error!("Chunk {}/{} failed after {} retries: {}", index + 1, total, self.config.max_retries, e);
                state.error = Some(ExtractorError::RetriesExhausted {
                    retries: self.config.max_retries,
                    last_error: e.to_string(),
                });
            }
            Err(e) => {
                error!("Chunk {}/{} failed: {}", index + 1, total, e);
                state.error = Some(e);
            }
        }
    }

    fn validate(&self, state: &mut RunState) {
        let records = std::mem::take(&mut state.records);
        if records.is_empty() {
            info!("No records to validate");
            return;
        }
        let report = self.gatekeeper.validate_all(records, &state.context);
        state.records_rejected = report.rejected_count();
        state.records = report.accepted;
    }

    fn deduplicate(&self, state: &mut RunState) {
        let records = std::mem::take(&mut state.records);
        let outcome = self
            .deduplicator
            .deduplicate(records, state.context.school_code.as_deref());
        debug!(merged = outcome.merged, "Deduplicated records");
        state.records = outcome.records;
    }

    fn save(&self, state: &mut RunState) {
        let mut distribution = ConfidenceDistribution::default();
        let mut saved = 0;

        {
            let mut store = self.lock_store();
            for record in &state.records {
                let row = AcmRecord::from_extracted(&state.source_id, &state.context, record);
                match store.save_record(&row) {
                    Ok(_) => {
                        saved += 1;
                        if let Some(level) = record.confidence() {
                            distribution.record(level);
                        }
                    }
                    Err(e) => {
                        error!("Failed to save record {} / {}: {}", row.building_id, row.product, e);
                        state.save_errors.push(e.to_string());
                    }
                }
            }
        }

        state.result = Some(ExtractionRunResult {
            records: std::mem::take(&mut state.records),
            status: if saved > 0 {
                ExtractionStatus::Valid
            } else {
                ExtractionStatus::NoData
            },
            total_records: saved,
            records_rejected: state.records_rejected,
            confidence_distribution: distribution,
        });
    }

    /// Provision a model and ask it about one chunk
    async fn call_model(
        &self,
        content: &str,
        prompt: String,
        model_id: Option<String>,
        temperature: f32,
    ) -> Result<ModelResponse, ExtractorError> {
        let provisioner = Arc::clone(&self.provisioner);
        let spec = ModelSpec::new(self.config.purpose.clone(), temperature).with_model(model_id);
        let content = content.to_string();

        // Provisioners and models are synchronous
        let mut task = tokio::task::spawn_blocking(move || -> Result<String, ExtractorError> {
            let model = provisioner
                .provision(&content, &spec)
                .map_err(ExtractorError::provision)?;
            model
                .generate_structured(&prompt, EXTRACTION_INSTRUCTION, &response_schema())
                .map_err(ExtractorError::model)
        });

        let joined = match timeout(self.config.extraction_timeout(), &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                // A blocking call cannot be cancelled; the retry waits for it
                warn!(
                    "Model call exceeded {}s, waiting for it to return",
                    self.config.extraction_timeout_secs
                );
                let _ = task.await;
                return Err(ExtractorError::Timeout);
            }
        };
        let raw = joined.map_err(|e| ExtractorError::Task(format!("Task join error: {}", e)))??;

        debug!("Model response length: {} chars", raw.len());
        parse_model_response(&raw)
    }

    fn lock_store(&self) -> MutexGuard<'_, R> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(failed: bool, retry_pending: bool, chunks_remaining: bool) -> Progress {
        Progress {
            failed,
            retry_pending,
            chunks_remaining,
        }
    }

    #[test]
    fn test_happy_path_transitions() {
        let p = Progress::default();
        assert_eq!(next_stage(Stage::Prepare, progress(false, false, true)), Stage::Extract);
        assert_eq!(next_stage(Stage::Extract, p), Stage::Validate);
        assert_eq!(next_stage(Stage::Validate, p), Stage::Deduplicate);
        assert_eq!(next_stage(Stage::Deduplicate, p), Stage::Save);
        assert_eq!(next_stage(Stage::Save, p), Stage::Done);
    }

    #[test]
    fn test_extract_loops() {
        assert_eq!(next_stage(Stage::Extract, progress(false, true, true)), Stage::Extract);
        assert_eq!(next_stage(Stage::Extract, progress(false, false, true)), Stage::Extract);
    }

    #[test]
    fn test_errors_fail_the_run() {
        let failed = progress(true, false, false);
        assert_eq!(next_stage(Stage::Prepare, failed), Stage::Failed);
        assert_eq!(next_stage(Stage::Extract, progress(true, true, true)), Stage::Failed);
        assert_eq!(next_stage(Stage::Validate, failed), Stage::Failed);
    }

    #[test]
    fn test_terminal_stages_stay() {
        let failed = progress(true, false, false);
        assert_eq!(next_stage(Stage::Done, failed), Stage::Done);
        assert_eq!(next_stage(Stage::Failed, Progress::default()), Stage::Failed);
    }

    #[test]
    fn test_run_state_progress() {
        let mut state = RunState::new(&ExtractionRequest::new("src1"));
        state.chunks = vec![
            Chunk {
                content: "a".to_string(),
                page_number: 1,
                chunk_index: 0,
            };
            2
        ];
        assert_eq!(state.progress(), progress(false, false, true));

        state.retry_count = 1;
        assert_eq!(state.progress(), progress(false, true, true));

        state.retry_count = 0;
        state.chunk_index = 2;
        assert_eq!(state.progress(), Progress::default());

        state.error = Some(ExtractorError::NoContent);
        assert!(state.progress().failed);
    }
}
