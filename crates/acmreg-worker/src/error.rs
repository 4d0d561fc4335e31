//! Error types for job runs

use acmreg_domain::{Classify, FailureKind};
use std::fmt::Display;
use thiserror::Error;

/// Errors that can occur while running a job
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkerError {
    /// Source lookup failed
    #[error("Source error: {message}")]
    Source {
        /// Underlying error text
        message: String,
        /// Classification of the underlying error
        kind: FailureKind,
    },

    /// Record store error
    #[error("Storage error: {message}")]
    Store {
        /// Underlying error text
        message: String,
        /// Classification of the underlying error
        kind: FailureKind,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WorkerError {
    /// Wrap a source-provider error
    pub fn source_lookup<E: Classify + Display>(error: E) -> Self {
        WorkerError::Source {
            message: error.to_string(),
            kind: error.kind(),
        }
    }

    /// Wrap a store error
    pub fn store<E: Classify + Display>(error: E) -> Self {
        WorkerError::Store {
            message: error.to_string(),
            kind: error.kind(),
        }
    }
}

impl Classify for WorkerError {
    fn kind(&self) -> FailureKind {
        match self {
            WorkerError::Source { kind, .. } | WorkerError::Store { kind, .. } => *kind,
            WorkerError::Config(_) => FailureKind::Fatal,
        }
    }
}
