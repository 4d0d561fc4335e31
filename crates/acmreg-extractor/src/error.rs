//! Error types for the extraction pipeline

use acmreg_domain::{Classify, FailureKind};
use std::fmt::Display;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    /// Source lookup failed
    #[error("Source error: {message}")]
    Source {
        /// Underlying error text
        message: String,
        /// Classification of the underlying error
        kind: FailureKind,
    },

    /// No source with the given ID
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// Source exists but has no text
    #[error("Source has no content to extract")]
    NoContent,

    /// Model provisioning failed
    #[error("Model provisioning failed: {message}")]
    Provision {
        /// Underlying error text
        message: String,
        /// Classification of the underlying error
        kind: FailureKind,
    },

    /// Model call failed
    #[error("Model error: {message}")]
    Model {
        /// Underlying error text
        message: String,
        /// Classification of the underlying error
        kind: FailureKind,
    },

    /// Model output did not match the record schema
    #[error("Invalid model output: {0}")]
    InvalidFormat(String),

    /// Model call exceeded its deadline
    #[error("Extraction timeout")]
    Timeout,

    /// A chunk kept failing after every retry
    #[error("Extraction failed after {retries} retries: {last_error}")]
    RetriesExhausted {
        /// Retries attempted
        retries: u32,
        /// Message of the final failure
        last_error: String,
    },

    /// Record store error
    #[error("Store error: {message}")]
    Store {
        /// Underlying error text
        message: String,
        /// Classification of the underlying error
        kind: FailureKind,
    },

    /// Blocking task could not be joined
    #[error("Task error: {0}")]
    Task(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Wrap a source-provider error
    pub fn source_lookup<E: Classify + Display>(error: E) -> Self {
        ExtractorError::Source {
            message: error.to_string(),
            kind: error.kind(),
        }
    }

    /// Wrap a provisioning error
    pub fn provision<E: Classify + Display>(error: E) -> Self {
        ExtractorError::Provision {
            message: error.to_string(),
            kind: error.kind(),
        }
    }

    /// Wrap a model error
    pub fn model<E: Classify + Display>(error: E) -> Self {
        ExtractorError::Model {
            message: error.to_string(),
            kind: error.kind(),
        }
    }

    /// Wrap a store error
    pub fn store<E: Classify + Display>(error: E) -> Self {
        ExtractorError::Store {
            message: error.to_string(),
            kind: error.kind(),
        }
    }
}

impl Classify for ExtractorError {
    fn kind(&self) -> FailureKind {
        match self {
            ExtractorError::Source { kind, .. }
            | ExtractorError::Provision { kind, .. }
            | ExtractorError::Model { kind, .. }
            | ExtractorError::Store { kind, .. } => *kind,
            ExtractorError::InvalidFormat(_) | ExtractorError::Timeout => FailureKind::Transient,
            ExtractorError::SourceNotFound(_)
            | ExtractorError::NoContent
            | ExtractorError::RetriesExhausted { .. }
            | ExtractorError::Task(_)
            | ExtractorError::Config(_) => FailureKind::Fatal,
        }
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::InvalidFormat(e.to_string())
    }
}
