//! Job commands run under the outer retrier
//!
//! Each command returns a structured output for every outcome. Only
//! transient failures (write contention, busy database) are retried, by
//! restarting the whole job.

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::metrics::{JobKind, JobMetrics};
use crate::retry::Retrier;
use acmreg_domain::{Classify, ModelProvisioner, RecordStore, SourceProvider};
use acmreg_extractor::{parse_register, ExtractionOutput, ExtractionPipeline, ExtractionRequest, RunStatus};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Input of a pattern-parse job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseJobInput {
    /// Source document ID
    pub source_id: String,
}

impl ParseJobInput {
    /// Input for the given source
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
        }
    }
}

/// Output of a pattern-parse job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseJobOutput {
    /// Whether the job completed
    pub success: bool,

    /// Source document ID
    pub source_id: String,

    /// Rows saved
    pub records_created: usize,

    /// Prior records removed for the source
    pub records_deleted: usize,

    /// Time spent, in seconds
    pub processing_time: f64,

    /// Human-readable error, if any
    pub error_message: Option<String>,
}

impl ParseJobOutput {
    /// Output for a job that did not complete
    pub fn failed(source_id: impl Into<String>, message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            source_id: source_id.into(),
            records_created: 0,
            records_deleted: 0,
            processing_time: elapsed.as_secs_f64(),
            error_message: Some(message.into()),
        }
    }
}

/// Runs extraction jobs and keeps metrics across them
#[derive(Debug)]
pub struct JobRunner {
    retrier: Retrier,
    metrics: Mutex<JobMetrics>,
}

impl JobRunner {
    /// Create a runner with the given retry policy
    pub fn new(config: WorkerConfig) -> Result<Self, WorkerError> {
        config.validate().map_err(WorkerError::Config)?;
        Ok(Self {
            retrier: Retrier::new(config),
            metrics: Mutex::new(JobMetrics::new()),
        })
    }

    /// Create a runner with the default retry policy
    pub fn default_config() -> Self {
        Self {
            retrier: Retrier::new(WorkerConfig::default()),
            metrics: Mutex::new(JobMetrics::new()),
        }
    }

    /// Snapshot of the metrics collected so far
    pub fn metrics(&self) -> JobMetrics {
        self.lock_metrics().clone()
    }

    /// Parse a source's register tables into records
    ///
    /// Prior records for the source are always deleted first. Rows that fail
    /// to save are logged and skipped.
    pub async fn parse_register<S, R>(&self, sources: &S, store: &Mutex<R>, input: &ParseJobInput) -> ParseJobOutput
    where
        S: SourceProvider,
        S::Error: Classify + Display,
        R: RecordStore,
        R::Error: Classify + Display,
    {
        let started = Instant::now();
        info!(source_id = %input.source_id, "Starting register parse job");

        let outcome = self
            .retrier
            .run(|_| std::future::ready(self.parse_once(sources, store, &input.source_id)))
            .await;

        let output = outcome.result.unwrap_or_else(|e| {
            error!(source_id = %input.source_id, attempts = outcome.attempts, "Parse job gave up: {}", e);
            ParseJobOutput::failed(
                &input.source_id,
                format!("{} (after {} attempts)", e, outcome.attempts),
                started.elapsed(),
            )
        });

        let mut metrics = self.lock_metrics();
        metrics.record_job(JobKind::Parse, outcome.attempts, output.success);
        metrics.record_records(output.records_created, output.records_deleted);
        metrics.total_runtime_ms += started.elapsed().as_millis() as u64;

        output
    }

    /// Run AI extraction for a source
    ///
    /// Transient failures restart the whole run; the final outcome is
    /// always an output.
    pub async fn extract<P, S, R>(
        &self,
        pipeline: &ExtractionPipeline<P, S, R>,
        request: &ExtractionRequest,
    ) -> ExtractionOutput
    where
        P: ModelProvisioner + Send + Sync + 'static,
        P::Error: Classify + Display,
        S: SourceProvider,
        S::Error: Classify + Display,
        R: RecordStore,
        R::Error: Classify + Display,
    {
        let started = Instant::now();
        info!(source_id = %request.source_id, "Starting extraction job");

        let outcome = self.retrier.run(move |_| pipeline.execute(request)).await;

        let output = outcome.result.unwrap_or_else(|e| {
            error!(source_id = %request.source_id, attempts = outcome.attempts, "Extraction job gave up: {}", e);
            ExtractionOutput::failed(
                &request.source_id,
                format!("{} (after {} attempts)", e, outcome.attempts),
                started.elapsed().as_millis() as u64,
            )
        });

        let mut metrics = self.lock_metrics();
        metrics.record_job(JobKind::Extract, outcome.attempts, output.status != RunStatus::Failed);
        metrics.record_records(output.total_records, 0);
        metrics.total_runtime_ms += started.elapsed().as_millis() as u64;

        output
    }

    /// One attempt of the parse job; `Err` only for transient failures
    fn parse_once<S, R>(&self, sources: &S, store: &Mutex<R>, source_id: &str) -> Result<ParseJobOutput, WorkerError>
    where
        S: SourceProvider,
        S::Error: Classify + Display,
        R: RecordStore,
        R::Error: Classify + Display,
    {
        let started = Instant::now();
        match parse_source(sources, store, source_id, started) {
            Ok(output) => Ok(output),
            Err(e) if e.is_transient() => Err(e),
            Err(e) => {
                error!(source_id, "Register parse failed: {}", e);
                Ok(ParseJobOutput::failed(source_id, e.to_string(), started.elapsed()))
            }
        }
    }

    fn lock_metrics(&self) -> MutexGuard<'_, JobMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_source<S, R>(
    sources: &S,
    store: &Mutex<R>,
    source_id: &str,
    started: Instant,
) -> Result<ParseJobOutput, WorkerError>
where
    S: SourceProvider,
    S::Error: Classify + Display,
    R: RecordStore,
    R::Error: Classify + Display,
{
    let Some(source) = sources.get_source(source_id).map_err(WorkerError::source_lookup)? else {
        warn!(source_id, "Source not found");
        return Ok(ParseJobOutput::failed(
            source_id,
            format!("Source {} not found", source_id),
            started.elapsed(),
        ));
    };

    let Some(text) = source.text() else {
        warn!(source_id, "Source has no text content");
        return Ok(ParseJobOutput::failed(
            source_id,
            format!("Source {} has no text content", source_id),
            started.elapsed(),
        ));
    };

    let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);

    let records_deleted = store.delete_by_source(source_id).map_err(WorkerError::store)?;
    if records_deleted > 0 {
        info!("Deleted {} existing records for {}", records_deleted, source_id);
    }

    let rows = parse_register(text, source_id);
    if rows.is_empty() {
        warn!(source_id, "No register rows found");
        return Ok(ParseJobOutput {
            success: true,
            source_id: source_id.to_string(),
            records_created: 0,
            records_deleted,
            processing_time: started.elapsed().as_secs_f64(),
            error_message: None,
        });
    }

    let mut records_created = 0;
    for row in &rows {
        match store.save_record(row) {
            Ok(_) => records_created += 1,
            Err(e) => warn!(
                building_id = %row.building_id,
                product = %row.product,
                "Failed to save register row: {}",
                e
            ),
        }
    }

    info!(
        source_id,
        parsed = rows.len(),
        saved = records_created,
        "Register parse complete"
    );

    Ok(ParseJobOutput {
        success: true,
        source_id: source_id.to_string(),
        records_created,
        records_deleted,
        processing_time: started.elapsed().as_secs_f64(),
        error_message: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use acmreg_domain::{AcmRecord, FailureKind, RegisterSummary, Source};
    use acmreg_llm::MockProvider;
    use acmreg_store::SqliteStore;
    use acmreg_extractor::ExtractorConfig;
    use std::collections::HashMap;
    use std::sync::Arc;

    const REGISTER: &str = "\
# Hillside PS - Asbestos Register

## B1 - Block A

### B1-R1 - Office

| Product | Material Description | Result |
|---|---|---|
| Eaves | Fibre cement | Detected |
| Ceiling | Plasterboard | No Asbestos Detected |
";

    fn sources(text: &str) -> HashMap<String, Source> {
        let mut map = HashMap::new();
        map.insert("s1".to_string(), Source::new("s1", text));
        map
    }

    fn memory_store() -> Mutex<SqliteStore> {
        Mutex::new(SqliteStore::new(":memory:").unwrap())
    }

    fn runner() -> JobRunner {
        JobRunner::new(WorkerConfig::immediate()).unwrap()
    }

    #[derive(Debug)]
    struct Busy;

    impl Display for Busy {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("database is locked")
        }
    }

    impl Classify for Busy {
        fn kind(&self) -> FailureKind {
            FailureKind::Transient
        }
    }

    /// Store whose deletes report contention a fixed number of times
    #[derive(Default)]
    struct ContendedStore {
        busy_deletes: u32,
        deletes: u32,
        saved: Vec<AcmRecord>,
    }

    impl RecordStore for ContendedStore {
        type Error = Busy;

        fn delete_by_source(&mut self, _source_id: &str) -> Result<usize, Busy> {
            self.deletes += 1;
            if self.deletes <= self.busy_deletes {
                return Err(Busy);
            }
            Ok(0)
        }

        fn save_record(&mut self, record: &AcmRecord) -> Result<String, Busy> {
            self.saved.push(record.clone());
            Ok(format!("r{}", self.saved.len()))
        }

        fn get_by_source(&self, _source_id: &str) -> Result<Vec<AcmRecord>, Busy> {
            Ok(self.saved.clone())
        }

        fn get_by_building(&self, _building_id: &str, _source_id: Option<&str>) -> Result<Vec<AcmRecord>, Busy> {
            Ok(Vec::new())
        }

        fn get_by_risk_status(&self, _risk_status: &str, _source_id: Option<&str>) -> Result<Vec<AcmRecord>, Busy> {
            Ok(Vec::new())
        }

        fn summary_by_source(&self, _source_id: &str) -> Result<RegisterSummary, Busy> {
            Ok(RegisterSummary::default())
        }
    }

    #[tokio::test]
    async fn test_parse_job_saves_rows() {
        let runner = runner();
        let store = memory_store();

        let output = runner
            .parse_register(&sources(REGISTER), &store, &ParseJobInput::new("s1"))
            .await;

        assert!(output.success);
        assert_eq!(output.records_created, 2);
        assert_eq!(output.records_deleted, 0);
        assert!(output.error_message.is_none());

        let saved = store.lock().unwrap().get_by_source("s1").unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].school_name, "Hillside PS");
        assert_eq!(saved[0].building_id, "B1");
    }

    #[tokio::test]
    async fn test_parse_job_replaces_prior_records() {
        let runner = runner();
        let store = memory_store();
        let sources = sources(REGISTER);

        runner.parse_register(&sources, &store, &ParseJobInput::new("s1")).await;
        let output = runner.parse_register(&sources, &store, &ParseJobInput::new("s1")).await;

        assert!(output.success);
        assert_eq!(output.records_deleted, 2);
        assert_eq!(output.records_created, 2);
        assert_eq!(store.lock().unwrap().count_by_source("s1").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_parse_job_missing_source() {
        let runner = runner();
        let output = runner
            .parse_register(&sources(REGISTER), &memory_store(), &ParseJobInput::new("nope"))
            .await;

        assert!(!output.success);
        assert_eq!(output.error_message.as_deref(), Some("Source nope not found"));
        assert_eq!(runner.metrics().failures, 1);
    }

    #[tokio::test]
    async fn test_parse_job_empty_source() {
        let runner = runner();
        let output = runner
            .parse_register(&sources("   \n"), &memory_store(), &ParseJobInput::new("s1"))
            .await;

        assert!(!output.success);
        assert_eq!(output.error_message.as_deref(), Some("Source s1 has no text content"));
    }

    #[tokio::test]
    async fn test_parse_job_without_tables_succeeds_empty() {
        let runner = runner();
        let output = runner
            .parse_register(&sources("# Hillside PS\n\nNo register tables here.\n"), &memory_store(), &ParseJobInput::new("s1"))
            .await;

        assert!(output.success);
        assert_eq!(output.records_created, 0);
    }

    #[tokio::test]
    async fn test_parse_job_retries_contention() {
        let runner = runner();
        let store = Mutex::new(ContendedStore {
            busy_deletes: 2,
            ..ContendedStore::default()
        });

        let output = runner
            .parse_register(&sources(REGISTER), &store, &ParseJobInput::new("s1"))
            .await;

        assert!(output.success);
        assert_eq!(output.records_created, 2);
        assert_eq!(store.lock().unwrap().deletes, 3);

        let metrics = runner.metrics();
        assert_eq!(metrics.attempts, 3);
        assert_eq!(metrics.retries, 2);
        assert_eq!(metrics.records_saved, 2);
    }

    #[tokio::test]
    async fn test_parse_job_gives_up_on_persistent_contention() {
        let runner = runner();
        let store = Mutex::new(ContendedStore {
            busy_deletes: 10,
            ..ContendedStore::default()
        });

        let output = runner
            .parse_register(&sources(REGISTER), &store, &ParseJobInput::new("s1"))
            .await;

        assert!(!output.success);
        let message = output.error_message.unwrap();
        assert!(message.contains("database is locked"));
        assert!(message.contains("after 3 attempts"));
        assert!(store.lock().unwrap().saved.is_empty());
    }

    #[tokio::test]
    async fn test_extract_job_reports_pipeline_output() {
        let runner = runner();
        let store = Arc::new(memory_store());
        let provider = MockProvider::new(
            r#"{"records": [{"building_id": "B1",
                "area_type": "Interior", "product": "Eaves", "material_description": "Fibre cement",
                "result": "Asbestos Detected", "extraction_confidence": "high"}]}"#,
        );
        let pipeline = ExtractionPipeline::new(
            provider,
            Arc::new(sources(REGISTER)),
            Arc::clone(&store),
            ExtractorConfig::default(),
        );

        let output = runner.extract(&pipeline, &ExtractionRequest::new("s1")).await;

        assert_eq!(output.status, RunStatus::Success);
        assert_eq!(output.total_records, 1);

        let metrics = runner.metrics();
        assert_eq!(metrics.jobs[&JobKind::Extract], 1);
        assert_eq!(metrics.records_saved, 1);
        assert_eq!(metrics.failures, 0);
    }

    #[tokio::test]
    async fn test_extract_job_retries_forced_delete_contention() {
        let runner = runner();
        let store = Arc::new(Mutex::new(ContendedStore {
            busy_deletes: 1,
            ..ContendedStore::default()
        }));
        let pipeline = ExtractionPipeline::new(
            MockProvider::default(),
            Arc::new(sources(REGISTER)),
            Arc::clone(&store),
            ExtractorConfig::default(),
        );
        let mut request = ExtractionRequest::new("s1");
        request.force = true;

        let output = runner.extract(&pipeline, &request).await;

        assert_eq!(output.status, RunStatus::NoData);
        assert_eq!(store.lock().unwrap().deletes, 2);
        assert_eq!(runner.metrics().retries, 1);
    }

    #[test]
    fn test_runner_rejects_invalid_config() {
        let config = WorkerConfig {
            max_attempts: 0,
            ..WorkerConfig::default()
        };
        assert!(matches!(JobRunner::new(config), Err(WorkerError::Config(_))));
    }
}
