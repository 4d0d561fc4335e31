//! Configuration for the extraction pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for chunking, model calls and retry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Model context window (tokens)
    pub context_window_tokens: usize,

    /// Fraction of the context window a single chunk may use
    pub chunk_threshold_ratio: f64,

    /// Characters per token for size estimates
    pub chars_per_token: usize,

    /// Overlap between character-window chunks
    pub chunk_overlap_chars: usize,

    /// Retries per chunk after the first attempt
    pub max_retries: u32,

    /// Delay before each retry (ms); the last entry repeats
    pub retry_delays_ms: Vec<u64>,

    /// Sampling temperature for the first attempt
    pub temperature: f32,

    /// Sampling temperature for retries
    pub retry_temperature: f32,

    /// Maximum time for a single model call (seconds)
    pub extraction_timeout_secs: u64,

    /// Purpose tag passed to the model provisioner
    pub purpose: String,
}

impl ExtractorConfig {
    /// Chunking threshold in tokens
    pub fn threshold_tokens(&self) -> usize {
        (self.context_window_tokens as f64 * self.chunk_threshold_ratio) as usize
    }

    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Delay before retry number `retry_count` (0-based)
    pub fn retry_delay(&self, retry_count: u32) -> Duration {
        let ms = self
            .retry_delays_ms
            .get(retry_count as usize)
            .or_else(|| self.retry_delays_ms.last())
            .copied()
            .unwrap_or(0);
        Duration::from_millis(ms)
    }

    /// Temperature for an attempt
    pub fn temperature_for(&self, retry_count: u32) -> f32 {
        if retry_count > 0 {
            self.retry_temperature
        } else {
            self.temperature
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.context_window_tokens == 0 {
            return Err("context_window_tokens must be greater than 0".to_string());
        }
        if !(self.chunk_threshold_ratio > 0.0 && self.chunk_threshold_ratio <= 1.0) {
            return Err("chunk_threshold_ratio must be in (0, 1]".to_string());
        }
        if self.chars_per_token == 0 {
            return Err("chars_per_token must be greater than 0".to_string());
        }
        if self.threshold_tokens() == 0 {
            return Err("chunk threshold rounds down to 0 tokens".to_string());
        }
        if self.chunk_overlap_chars >= self.threshold_tokens() * self.chars_per_token {
            return Err("chunk_overlap_chars must be smaller than the chunk size".to_string());
        }
        if self.retry_delays_ms.is_empty() {
            return Err("retry_delays_ms must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) || !(0.0..=2.0).contains(&self.retry_temperature) {
            return Err("temperatures must be between 0.0 and 2.0".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        if self.purpose.trim().is_empty() {
            return Err("purpose must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Defaults sized for a 128k-token hosted model
    fn default() -> Self {
        Self {
            context_window_tokens: 128_000,
            chunk_threshold_ratio: 0.5,
            chars_per_token: 4,
            chunk_overlap_chars: 500,
            max_retries: 3,
            retry_delays_ms: vec![1_000, 2_000, 4_000],
            temperature: 0.3,
            retry_temperature: 0.1,
            extraction_timeout_secs: 120,
            purpose: "extraction".to_string(),
        }
    }
}

impl ExtractorConfig {
    /// Local preset: small context window, longer per-call timeout
    pub fn local() -> Self {
        Self {
            context_window_tokens: 8_192,
            extraction_timeout_secs: 600,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
