//! acmreg Extractor
//!
//! Turns converted asbestos register documents into register records.
//!
//! # Overview
//!
//! Two extraction paths share one record shape:
//!
//! - **Table parsing** ([`parse_register`]): a deterministic pass over
//!   Markdown output that reads every register table, stamping rows with
//!   the school, building, room, area type and page in effect.
//! - **AI extraction** ([`ExtractionPipeline`]): a staged run that
//!   preprocesses and chunks the text, asks a model for records chunk by
//!   chunk with retry, then validates, deduplicates and saves them.
//!
//! # Architecture
//!
//! ```text
//! Source → Prepare → Extract ⟲ → Validate → Deduplicate → Save → RecordStore
//!                      │
//!                ModelProvisioner
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use acmreg_extractor::{ExtractionPipeline, ExtractionRequest, ExtractorConfig};
//! use acmreg_llm::MockProvider;
//! use acmreg_store::SqliteStore;
//! use std::sync::{Arc, Mutex};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(Mutex::new(SqliteStore::new(":memory:")?));
//! let pipeline = ExtractionPipeline::new(
//!     MockProvider::default(),
//!     Arc::clone(&store),
//!     store,
//!     ExtractorConfig::default(),
//! );
//!
//! let output = pipeline.run_extraction(&ExtractionRequest::new("source:1")).await;
//! println!("{}: {} records", output.status.as_str(), output.total_records);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod observer;
mod patterns;
mod pipeline;
mod preprocess;
mod prompt;
mod response;
mod table;
mod types;


pub use chunking::Chunker;
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use observer::{NoopObserver, StageEvent, StageObserver};
pub use patterns::{classify_header, page_marker, school_title, Header};
pub use pipeline::{next_stage, ExtractionPipeline, Progress, RunState, Stage};
pub use preprocess::{preprocess, PreprocessMetadata};
pub use prompt::{response_schema, PromptBuilder, EXTRACTION_INSTRUCTION};
pub use response::{parse_model_response, ModelResponse};
pub use table::parse_register;
pub use types::{
    Chunk, ExtractionOutput, ExtractionRequest, ExtractionRunResult, ExtractionStatus, RunStatus,
};
