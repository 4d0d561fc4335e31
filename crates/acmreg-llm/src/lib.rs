//! acmreg LLM Provider Layer
//!
//! Model provisioning for the AI extraction path.
//!
//! # Architecture
//!
//! This crate implements `ModelProvisioner` and `StructuredModel` from
//! `acmreg-domain`. A provisioner hands out a model configured for one call
//! (model id, temperature); the model answers a system/instruction prompt
//! pair with JSON.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted responses for testing
//! - `OllamaProvider`: Local Ollama chat API in JSON mode
//!
//! # Examples
//!
//! ```
//! use acmreg_llm::MockProvider;
//! use acmreg_domain::{ModelProvisioner, ModelSpec, StructuredModel};
//!
//! let provider = MockProvider::new(r#"{"records": []}"#);
//! let model = provider.provision("text", &ModelSpec::new("extraction", 0.3)).unwrap();
//! let answer = model.generate_structured("system", "extract", "{}").unwrap();
//! assert_eq!(answer, r#"{"records": []}"#);
//! ```

#![warn(missing_docs)]

pub mod ollama;

use acmreg_domain::{Classify, FailureKind, ModelProvisioner, ModelSpec, StructuredModel};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl Classify for LlmError {
    fn kind(&self) -> FailureKind {
        match self {
            LlmError::Communication(_)
            | LlmError::InvalidResponse(_)
            | LlmError::RateLimitExceeded => FailureKind::Transient,
            LlmError::ModelNotAvailable(_) | LlmError::Other(_) => FailureKind::Fatal,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<Result<String, LlmError>>,
    provision_errors: VecDeque<LlmError>,
    provisions: Vec<ModelSpec>,
    prompts: Vec<String>,
}

/// Mock provider for deterministic testing
///
/// Answers come from a script, consumed in order, one entry per
/// `generate_structured` call; once the script is empty every call gets the
/// default response. Provisioned specs and system prompts are recorded so
/// tests can check temperatures and prompt contents.
///
/// # Examples
///
/// ```
/// use acmreg_llm::{LlmError, MockProvider};
/// use acmreg_domain::{ModelProvisioner, ModelSpec, StructuredModel};
///
/// let provider = MockProvider::default();
/// provider.push_error(LlmError::Communication("reset".into()));
/// provider.push_response("first");
///
/// let model = provider.provision("", &ModelSpec::new("extraction", 0.3)).unwrap();
/// assert!(model.generate_structured("s", "i", "{}").is_err());
/// assert_eq!(model.generate_structured("s", "i", "{}").unwrap(), "first");
/// assert_eq!(provider.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a MockProvider with a fixed default response
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Queue a successful response
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.state).script.push_back(Ok(response.into()));
    }

    /// Queue a generation failure
    pub fn push_error(&self, error: LlmError) {
        lock(&self.state).script.push_back(Err(error));
    }

    /// Make the next `provision` call fail
    pub fn fail_next_provision(&self, error: LlmError) {
        lock(&self.state).provision_errors.push_back(error);
    }

    /// Number of `generate_structured` calls so far
    pub fn call_count(&self) -> usize {
        lock(&self.state).prompts.len()
    }

    /// Specs passed to `provision`, in call order
    pub fn provisions(&self) -> Vec<ModelSpec> {
        lock(&self.state).provisions.clone()
    }

    /// Temperatures requested, in call order
    pub fn temperatures(&self) -> Vec<f32> {
        lock(&self.state)
            .provisions
            .iter()
            .map(|spec| spec.temperature)
            .collect()
    }

    /// System prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.state).prompts.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(r#"{"records": []}"#)
    }
}

impl ModelProvisioner for MockProvider {
    type Error = LlmError;
    type Model = MockModel;

    fn provision(&self, _content: &str, spec: &ModelSpec) -> Result<Self::Model, Self::Error> {
        let mut state = lock(&self.state);
        state.provisions.push(spec.clone());
        if let Some(error) = state.provision_errors.pop_front() {
            return Err(error);
        }
        Ok(MockModel {
            provider: self.clone(),
        })
    }
}

/// Model handed out by [`MockProvider`]
#[derive(Debug, Clone)]
pub struct MockModel {
    provider: MockProvider,
}

impl StructuredModel for MockModel {
    type Error = LlmError;

    fn generate_structured(
        &self,
        system_prompt: &str,
        _instruction: &str,
        _schema: &str,
    ) -> Result<String, Self::Error> {
        let mut state = lock(&self.provider.state);
        state.prompts.push(system_prompt.to_string());
        match state.script.pop_front() {
            Some(scripted) => scripted,
            None => Ok(self.provider.default_response.clone()),
        }
    }
}
