//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction logic and
//! infrastructure. Implementations live in other crates (`acmreg-store`,
//! `acmreg-llm`) or in tests.

use crate::register::{AcmRecord, RegisterSummary};
use crate::source::Source;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Mutex, PoisonError};

/// How a failure should be treated by a retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// May succeed if attempted again
    Transient,
    /// Will fail the same way again
    Fatal,
}

/// Errors that know whether they are worth retrying
pub trait Classify {
    /// Failure kind of this error
    fn kind(&self) -> FailureKind;

    /// Shorthand for `kind() == Transient`
    fn is_transient(&self) -> bool {
        self.kind() == FailureKind::Transient
    }
}

impl Classify for Infallible {
    fn kind(&self) -> FailureKind {
        match *self {}
    }
}

/// Trait for loading converted documents
///
/// Implemented by the infrastructure layer (acmreg-store)
pub trait SourceProvider {
    /// Error type for lookups
    type Error;

    /// Get a source by ID
    fn get_source(&self, id: &str) -> Result<Option<Source>, Self::Error>;
}

impl SourceProvider for HashMap<String, Source> {
    type Error = Infallible;

    fn get_source(&self, id: &str) -> Result<Option<Source>, Self::Error> {
        Ok(self.get(id).cloned())
    }
}

impl<T: SourceProvider> SourceProvider for Mutex<T> {
    type Error = T::Error;

    fn get_source(&self, id: &str) -> Result<Option<Source>, Self::Error> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_source(id)
    }
}

/// Trait for storing and retrieving register records
///
/// Implemented by the infrastructure layer (acmreg-store). Saves are
/// per-record; there is no batch transaction.
pub trait RecordStore {
    /// Error type for store operations
    type Error;

    /// Delete every record for a source, returning how many were removed
    fn delete_by_source(&mut self, source_id: &str) -> Result<usize, Self::Error>;

    /// Save one record, returning its assigned ID
    fn save_record(&mut self, record: &AcmRecord) -> Result<String, Self::Error>;

    /// Records for a source, ordered by building then room
    fn get_by_source(&self, source_id: &str) -> Result<Vec<AcmRecord>, Self::Error>;

    /// Records for a building, optionally restricted to one source
    fn get_by_building(
        &self,
        building_id: &str,
        source_id: Option<&str>,
    ) -> Result<Vec<AcmRecord>, Self::Error>;

    /// Records with a given risk status, optionally restricted to one source
    fn get_by_risk_status(
        &self,
        risk_status: &str,
        source_id: Option<&str>,
    ) -> Result<Vec<AcmRecord>, Self::Error>;

    /// Aggregate counts for a source
    fn summary_by_source(&self, source_id: &str) -> Result<RegisterSummary, Self::Error>;
}

/// What a caller needs from a provisioned model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    /// Explicit model, or `None` for the provider's default for `purpose`
    pub model_id: Option<String>,
    /// Purpose tag used to pick a default model (e.g. `extraction`)
    pub purpose: String,
    /// Sampling temperature
    pub temperature: f32,
}

impl ModelSpec {
    /// Spec for a purpose with the provider's default model
    pub fn new(purpose: impl Into<String>, temperature: f32) -> Self {
        Self {
            model_id: None,
            purpose: purpose.into(),
            temperature,
        }
    }

    /// Pin a specific model
    pub fn with_model(mut self, model_id: Option<String>) -> Self {
        self.model_id = model_id;
        self
    }
}

/// A model able to answer with JSON matching a schema
pub trait StructuredModel {
    /// Error type for generation
    type Error;

    /// Generate a JSON document for the prompt pair
    ///
    /// `schema` is a JSON Schema the answer should conform to. Providers
    /// that cannot enforce it still pass it along as a hint; callers
    /// validate the answer themselves.
    fn generate_structured(
        &self,
        system_prompt: &str,
        instruction: &str,
        schema: &str,
    ) -> Result<String, Self::Error>;
}

/// Trait for provisioning models
///
/// Implemented by the infrastructure layer (acmreg-llm). `content` is the
/// text the model will be asked about; providers may use its size to pick
/// a model with a larger context window.
pub trait ModelProvisioner {
    /// Error type for provisioning and generation
    type Error;

    /// Model handle produced by this provisioner
    type Model: StructuredModel<Error = Self::Error>;

    /// Provision a model for one call
    fn provision(&self, content: &str, spec: &ModelSpec) -> Result<Self::Model, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_map_source_provider() {
        let mut sources = HashMap::new();
        sources.insert("s1".to_string(), Source::new("s1", "# Hillside PS"));

        let found = sources.get_source("s1").unwrap();
        assert_eq!(found.map(|s| s.id), Some("s1".to_string()));
        assert!(sources.get_source("missing").unwrap().is_none());
    }

    #[test]
    fn test_mutex_wrapped_provider() {
        let mut sources = HashMap::new();
        sources.insert("s1".to_string(), Source::new("s1", "text"));
        let shared = Mutex::new(sources);

        assert!(shared.get_source("s1").unwrap().is_some());
    }

    #[test]
    fn test_model_spec_builder() {
        let spec = ModelSpec::new("extraction", 0.3).with_model(Some("llama3".to_string()));
        assert_eq!(spec.model_id.as_deref(), Some("llama3"));
        assert_eq!(spec.purpose, "extraction");
    }
}
