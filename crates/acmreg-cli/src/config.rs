//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use acmreg_extractor::ExtractorConfig;
use acmreg_gatekeeper::ValidationConfig;
use acmreg_worker::WorkerConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Ollama connection
    #[serde(default)]
    pub ollama: OllamaSettings,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Extraction pipeline settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Record validation and deduplication settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Job retry settings
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Ollama connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaSettings {
    /// API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Default model
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Model per purpose tag (e.g. `extraction = "qwen2.5"`)
    #[serde(default)]
    pub purpose_models: HashMap<String, String>,

    /// Model for documents longer than `large_context_threshold_chars`
    #[serde(default)]
    pub large_context_model: Option<String>,

    /// Document length that switches to the large-context model
    #[serde(default = "default_large_context_threshold")]
    pub large_context_threshold_chars: usize,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".acmreg").join("config.toml"))
    }

    /// Load configuration from `path` (or the default path).
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::path()?,
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)?;
        let config = Self::from_toml(&contents)?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.extractor.validate().map_err(CliError::Config)?;
        config.worker.validate().map_err(CliError::Config)?;
        config
            .validation
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            ollama: OllamaSettings::default(),
            settings: Settings::default(),
            extractor: ExtractorConfig::default(),
            validation: ValidationConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            purpose_models: HashMap::new(),
            large_context_model: None,
            large_context_threshold_chars: default_large_context_threshold(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_database_path() -> String {
    dirs::home_dir()
        .map(|home| home.join(".acmreg").join("acmreg.db").display().to_string())
        .unwrap_or_else(|| "acmreg.db".to_string())
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_large_context_threshold() -> usize {
    200_000
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database_path.ends_with("acmreg.db"));
        assert_eq!(config.ollama.endpoint, "http://localhost:11434");
        assert!(config.settings.color);
        assert_eq!(config.extractor, ExtractorConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
database_path = "/tmp/register.db"

[ollama]
model = "qwen2.5"

[extractor]
context_window_tokens = 8000
"#,
        )
        .unwrap();

        assert_eq!(config.database_path, "/tmp/register.db");
        assert_eq!(config.ollama.model, "qwen2.5");
        assert_eq!(config.ollama.endpoint, "http://localhost:11434");
        assert_eq!(config.extractor.context_window_tokens, 8000);
        assert_eq!(config.extractor.max_retries, 3);
        assert_eq!(config.worker.max_attempts, 3);
    }

    #[test]
    fn test_invalid_extractor_section_rejected() {
        let result = Config::from_toml("[extractor]\ncontext_window_tokens = 0\n");
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_model_routing_and_validation_sections() {
        let config = Config::from_toml(
            r#"
[ollama]
large_context_model = "llama3.1:70b"
large_context_threshold_chars = 50000

[ollama.purpose_models]
extraction = "qwen2.5"

[validation]
infer_building_from_context = false
"#,
        )
        .unwrap();

        assert_eq!(config.ollama.purpose_models.get("extraction").map(String::as_str), Some("qwen2.5"));
        assert_eq!(config.ollama.large_context_model.as_deref(), Some("llama3.1:70b"));
        assert_eq!(config.ollama.large_context_threshold_chars, 50000);
        assert!(!config.validation.infer_building_from_context);
        assert_eq!(config.validation.dedup_prefix_chars, 50);
    }

    #[test]
    fn test_invalid_validation_section_rejected() {
        let result = Config::from_toml("[validation]\ndedup_hash_hex_len = 0\n");
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.settings.format, OutputFormat::Table);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[settings]\nformat = \"json\"\ncolor = false").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.settings.format, OutputFormat::Json);
        assert!(!config.settings.color);
    }
}
