//! acmreg Worker
//!
//! Job-runner side of extraction: the two job commands, the outer retrier
//! that restarts a job on transient failures, and metrics across runs.
//!
//! # Overview
//!
//! - **Parse job** ([`JobRunner::parse_register`]): deterministic table
//!   parse of a source, replacing any records it already has.
//! - **Extract job** ([`JobRunner::extract`]): one AI extraction run
//!   through an [`acmreg_extractor::ExtractionPipeline`].
//!
//! Both always produce a structured output. Only errors classified as
//! transient (busy database, write contention) restart the job, up to
//! [`WorkerConfig::max_attempts`] times with jittered exponential waits
//! between [`WorkerConfig::wait_min_secs`] and [`WorkerConfig::wait_max_secs`].
//!
//! # Usage
//!
//! ```no_run
//! use acmreg_store::SqliteStore;
//! use acmreg_worker::{JobRunner, ParseJobInput};
//! use std::sync::Mutex;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Mutex::new(SqliteStore::new("acmreg.db")?);
//! let runner = JobRunner::default_config();
//!
//! let output = runner
//!     .parse_register(&store, &store, &ParseJobInput::new("source:1"))
//!     .await;
//! println!("{} records created", output.records_created);
//! println!("{}", runner.metrics().summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
mod metrics;
mod retry;

pub use commands::{JobRunner, ParseJobInput, ParseJobOutput};
pub use config::WorkerConfig;
pub use error::WorkerError;
pub use metrics::{JobKind, JobMetrics};
pub use retry::{RetryOutcome, Retrier};
