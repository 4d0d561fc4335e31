//! Ollama Provider Implementation
//!
//! Provisions models served by a local Ollama instance. Calls go to the
//! chat endpoint with `format` set to the requested JSON Schema, so the
//! server constrains decoding to the record shape.
//!
//! # Model selection
//!
//! An explicit model id always wins. Otherwise content longer than the
//! configured large-context threshold goes to the large-context model, then
//! a model registered for the spec's purpose, then the default model.
//!
//! # Examples
//!
//! ```no_run
//! use acmreg_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1")
//!     .with_purpose_model("extraction", "qwen2.5:14b")
//!     .with_large_context_model("qwen2.5:32b", 200_000);
//! ```

use crate::LlmError;
use acmreg_domain::{ModelProvisioner, ModelSpec, StructuredModel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for a single chat request
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Ollama API provider for local LLM inference
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    endpoint: String,
    default_model: String,
    purpose_models: HashMap<String, String>,
    large_context: Option<(String, usize)>,
    client: reqwest::Client,
}

/// A provisioned Ollama model
#[derive(Debug, Clone)]
pub struct OllamaModel {
    endpoint: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

/// Request body for the Ollama chat API
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    format: serde_json::Value,
    options: ChatOptions,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Response from the Ollama chat API
#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `default_model`: Model used when nothing more specific applies
    pub fn new(endpoint: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            default_model: default_model.into(),
            purpose_models: HashMap::new(),
            large_context: None,
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Create a provider on `http://localhost:11434`
    pub fn default_endpoint(default_model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, default_model)
    }

    /// Register the model to use for a purpose tag
    pub fn with_purpose_model(mut self, purpose: impl Into<String>, model: impl Into<String>) -> Self {
        self.purpose_models.insert(purpose.into(), model.into());
        self
    }

    /// Use `model` for content longer than `threshold_chars`
    pub fn with_large_context_model(mut self, model: impl Into<String>, threshold_chars: usize) -> Self {
        self.large_context = Some((model.into(), threshold_chars));
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Model that `provision` would pick
    pub fn resolve_model(&self, content: &str, spec: &ModelSpec) -> String {
        if let Some(model) = spec.model_id.as_deref().filter(|m| !m.trim().is_empty()) {
            return model.to_string();
        }
        if let Some((model, threshold)) = &self.large_context {
            if content.chars().count() > *threshold {
                return model.clone();
            }
        }
        self.purpose_models
            .get(&spec.purpose)
            .cloned()
            .unwrap_or_else(|| self.default_model.clone())
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

impl ModelProvisioner for OllamaProvider {
    type Error = LlmError;
    type Model = OllamaModel;

    fn provision(&self, content: &str, spec: &ModelSpec) -> Result<Self::Model, Self::Error> {
        let model = self.resolve_model(content, spec);
        debug!(model = %model, purpose = %spec.purpose, temperature = spec.temperature, "Provisioned Ollama model");
        Ok(OllamaModel {
            endpoint: self.endpoint.clone(),
            model,
            temperature: spec.temperature,
            client: self.client.clone(),
        })
    }
}

impl OllamaModel {
    /// Model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sampling temperature
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Chat call returning the assistant message content
    ///
    /// # Errors
    ///
    /// - `ModelNotAvailable` on HTTP 404
    /// - `RateLimitExceeded` on HTTP 429
    /// - `Communication` for other HTTP failures or network errors
    /// - `InvalidResponse` if the body is not a chat response
    pub async fn chat(
        &self,
        system_prompt: &str,
        instruction: &str,
        schema: &str,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.endpoint);

        // A schema that does not parse still gets plain JSON mode
        let format = serde_json::from_str::<serde_json::Value>(schema)
            .unwrap_or_else(|_| serde_json::Value::String("json".to_string()));

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: instruction,
                },
            ],
            format,
            options: ChatOptions {
                temperature: self.temperature,
            },
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, error_text)));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(chat.message.content)
    }
}

impl StructuredModel for OllamaModel {
    type Error = LlmError;

    fn generate_structured(
        &self,
        system_prompt: &str,
        instruction: &str,
        schema: &str,
    ) -> Result<String, Self::Error> {
        block_on(self.chat(system_prompt, instruction, schema))
    }
}

/// Drive a future to completion from synchronous code
///
/// Inside a blocking-pool thread the ambient runtime is reused; otherwise a
/// throwaway current-thread runtime is built.
fn block_on<F>(future: F) -> Result<String, LlmError>
where
    F: Future<Output = Result<String, LlmError>>,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle.block_on(future),
        Err(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?
            .block_on(future),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ModelSpec {
        ModelSpec::new("extraction", 0.3)
    }

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llama3.1");
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.default_model, "llama3.1");
    }

    #[test]
    fn test_ollama_provider_default_endpoint() {
        let provider = OllamaProvider::default_endpoint("mistral");
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_model_resolution_order() {
        let provider = OllamaProvider::default_endpoint("base")
            .with_purpose_model("extraction", "extractor")
            .with_large_context_model("big", 10);

        assert_eq!(provider.resolve_model("short", &spec()), "extractor");
        assert_eq!(provider.resolve_model("this is longer than ten", &spec()), "big");
        assert_eq!(
            provider.resolve_model("short", &spec().with_model(Some("pinned".into()))),
            "pinned"
        );
        assert_eq!(
            provider.resolve_model("short", &ModelSpec::new("chat", 0.3)),
            "base"
        );
    }

    #[test]
    fn test_provision_carries_temperature() {
        let provider = OllamaProvider::default_endpoint("base");
        let model = provider.provision("", &ModelSpec::new("extraction", 0.1)).unwrap();
        assert_eq!(model.model(), "base");
        assert_eq!(model.temperature(), 0.1);
    }

    #[tokio::test]
    async fn test_ollama_error_handling() {
        // Nothing listens on port 9; the request must fail as a transport error
        let provider = OllamaProvider::new("http://127.0.0.1:9", "llama3.1")
            .with_timeout(Duration::from_secs(2));
        let model = provider.provision("", &spec()).unwrap();

        let result = model.chat("system", "extract", "{}").await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }

    #[test]
    fn test_sync_generation_outside_runtime() {
        let provider = OllamaProvider::new("http://127.0.0.1:9", "llama3.1")
            .with_timeout(Duration::from_secs(2));
        let model = provider.provision("", &spec()).unwrap();

        let result = model.generate_structured("system", "extract", "{}");
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }
}
