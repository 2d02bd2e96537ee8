//! Configuration loading and validation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::{StepwiseConfig, SUPPORTED_BACKEND_KINDS, SUPPORTED_STORE_BACKENDS};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load full Stepwise configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<StepwiseConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from YAML text. Empty text yields defaults.
pub fn parse_config(content: &str) -> Result<StepwiseConfig, ConfigError> {
    let config: StepwiseConfig = if content.trim().is_empty() {
        StepwiseConfig::default()
    } else {
        serde_yaml::from_str(content)?
    };
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &StepwiseConfig) -> Result<(), ConfigError> {
    if config.version == 0 {
        return Err(ConfigError::Invalid(
            "version must be greater than 0".to_string(),
        ));
    }

    if config.app.name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "app.name must not be empty".to_string(),
        ));
    }

    if config.planner.model.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "planner.model must not be empty".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&config.planner.temperature) {
        return Err(ConfigError::Invalid(
            "planner.temperature must be within 0.0..=2.0".to_string(),
        ));
    }

    if config.executor.step_timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "executor.step_timeout_ms must be > 0".to_string(),
        ));
    }

    let backend = &config.providers.backend;
    if !SUPPORTED_BACKEND_KINDS.contains(&backend.kind.to_lowercase().as_str()) {
        return Err(ConfigError::Invalid(format!(
            "providers.backend.kind '{}' is not supported (expected one of: {})",
            backend.kind,
            SUPPORTED_BACKEND_KINDS.join(", ")
        )));
    }
    if backend.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "providers.backend.timeout_secs must be > 0".to_string(),
        ));
    }

    if !SUPPORTED_STORE_BACKENDS.contains(&config.stores.backend.as_str()) {
        return Err(ConfigError::Invalid(format!(
            "stores.backend '{}' is not supported",
            config.stores.backend
        )));
    }

    Ok(())
}
