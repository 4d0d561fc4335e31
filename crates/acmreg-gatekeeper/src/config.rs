//! Gatekeeper configuration

use crate::GatekeeperError;
use serde::{Deserialize, Serialize};

/// Configuration for validation and deduplication rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Fill a missing building_id from the running context
    pub infer_building_from_context: bool,

    /// Leading characters of material_description hashed into the dedup key
    pub dedup_prefix_chars: usize,

    /// Hex characters of the SHA-256 digest kept in the dedup key
    pub dedup_hash_hex_len: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            infer_building_from_context: true,
            dedup_prefix_chars: 50,
            dedup_hash_hex_len: 8,
        }
    }
}

impl ValidationConfig {
    /// Create a strict configuration (no context inference)
    pub fn strict() -> Self {
        Self {
            infer_building_from_context: false,
            ..Self::default()
        }
    }

    /// Check the configuration for impossible values
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        if self.dedup_prefix_chars == 0 {
            return Err(GatekeeperError::Config(
                "dedup_prefix_chars must be > 0".to_string(),
            ));
        }
        if self.dedup_hash_hex_len == 0 || self.dedup_hash_hex_len > 64 {
            return Err(GatekeeperError::Config(
                "dedup_hash_hex_len must be between 1 and 64".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        assert!(config.infer_building_from_context);
        assert_eq!(config.dedup_prefix_chars, 50);
        assert_eq!(config.dedup_hash_hex_len, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_config() {
        let config = ValidationConfig::strict();
        assert!(!config.infer_building_from_context);
    }

    #[test]
    fn test_invalid_hash_length() {
        let config = ValidationConfig {
            dedup_hash_hex_len: 65,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
