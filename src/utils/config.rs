use crate::core::DEFAULT_PREFERENCE_KEY;
use crate::provider::{AcquisitionOptions, ProviderRevision};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Construction-time configuration of a [`crate::Geolocation`] instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    /// Preference key the permission flag is persisted under
    pub preference_key: String,
    /// Provider revision detected by the host environment
    pub revision: ProviderRevision,
    /// Initial acquisition options
    pub acquisition: AcquisitionOptions,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            preference_key: DEFAULT_PREFERENCE_KEY.to_string(),
            revision: ProviderRevision::default(),
            acquisition: AcquisitionOptions::default(),
        }
    }
}

/// Configuration validation and file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("{message}")]
    IoError { message: String },
    #[error("{message}")]
    SerializationError { message: String },
}

impl GeolocationConfig {
    /// Configuration for a given provider revision, defaults elsewhere
    pub fn for_revision(revision: ProviderRevision) -> Self {
        Self {
            revision,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preference_key.trim().is_empty() {
            return Err(ConfigError::InvalidParameter {
                parameter: "preference_key".to_string(),
                value: format!("{:?}", self.preference_key),
                reason: "must not be empty".to_string(),
            });
        }

        if self.acquisition.timeout_ms == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "acquisition.timeout_ms".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Load and validate configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: GeolocationConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to parse config file '{}': {}", path_str, e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to serialize config: {}", e),
            })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DEFAULT_TIMEOUT_MS;

    #[test]
    fn test_default_config() {
        let config = GeolocationConfig::default();
        assert_eq!(config.preference_key, DEFAULT_PREFERENCE_KEY);
        assert_eq!(config.revision, ProviderRevision::Modern);
        assert!(!config.acquisition.enable_high_accuracy);
        assert_eq!(config.acquisition.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = GeolocationConfig::default();
        config.preference_key = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { .. })
        ));

        let mut config = GeolocationConfig::default();
        config.acquisition.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let temp_path = std::env::temp_dir().join(format!(
            "geolocation_config_{}.json",
            std::process::id()
        ));

        let mut config = GeolocationConfig::for_revision(ProviderRevision::Legacy);
        config.acquisition.enable_high_accuracy = true;
        config.acquisition.timeout_ms = 5_000;
        config.save_to_file(&temp_path).unwrap();

        let loaded = GeolocationConfig::load_from_file(&temp_path).unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_file(temp_path);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: GeolocationConfig = serde_json::from_str(r#"{"revision": "legacy"}"#).unwrap();
        assert_eq!(config.revision, ProviderRevision::Legacy);
        assert_eq!(config.preference_key, DEFAULT_PREFERENCE_KEY);
        assert_eq!(config.acquisition.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_missing_file() {
        let result = GeolocationConfig::load_from_file("/nonexistent/geolocation.json");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
