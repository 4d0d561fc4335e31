//! Hooks for watching a pipeline run
//!
//! The pipeline reports each stage it enters plus the artifacts worth
//! inspecting when an extraction goes wrong: the prepared text, every
//! rendered prompt and each scheduled retry. Observers must not fail the
//! run, so the hook returns nothing.

use crate::pipeline::Stage;
use crate::preprocess::PreprocessMetadata;
use std::time::Duration;

/// Something that happened during a run
#[derive(Debug, Clone, Copy)]
pub enum StageEvent<'a> {
    /// A stage is about to run
    Entered {
        /// Stage being entered
        stage: Stage,
    },

    /// Source text was preprocessed and chunked
    Prepared {
        /// Preprocessed text
        content: &'a str,
        /// Preprocessing counts
        metadata: &'a PreprocessMetadata,
        /// Number of chunks produced
        chunks: usize,
    },

    /// A chunk prompt was rendered
    PromptRendered {
        /// Chunk index (0-based)
        chunk_index: usize,
        /// Total chunks
        total_chunks: usize,
        /// Rendered system prompt
        prompt: &'a str,
    },

    /// A chunk produced records
    ChunkExtracted {
        /// Chunk index (0-based)
        chunk_index: usize,
        /// Records returned for the chunk
        records: usize,
    },

    /// A chunk failed and will be retried
    RetryScheduled {
        /// Chunk index (0-based)
        chunk_index: usize,
        /// Retry number (1-based)
        retry: u32,
        /// Delay before the retry
        delay: Duration,
        /// Error that caused the retry
        error: &'a str,
    },

    /// The run reached a terminal stage
    Finished {
        /// Done or Failed
        stage: Stage,
        /// Records saved
        records: usize,
    },
}

/// Receives [`StageEvent`]s for a source
pub trait StageObserver: Send + Sync {
    /// Called synchronously from the pipeline
    fn on_event(&self, source_id: &str, event: &StageEvent<'_>);
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {
    fn on_event(&self, _source_id: &str, _event: &StageEvent<'_>) {}
}
