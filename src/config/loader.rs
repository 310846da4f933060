//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{Environment, GateConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Overrides `environment` when set.
pub const ENV_OVERRIDE: &str = "EVENT_GATE_ENV";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid EVENT_GATE_ENV value: {0}")]
    Environment(String),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse, apply environment overrides, and validate.
pub fn parse_config(content: &str) -> Result<GateConfig, ConfigError> {
    let mut config: GateConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Defaults plus environment overrides, for running without a file.
pub fn default_config() -> Result<GateConfig, ConfigError> {
    let mut config = GateConfig::default();
    apply_env_overrides(&mut config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut GateConfig) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var(ENV_OVERRIDE) {
        config.environment =
            Environment::parse(&value).ok_or(ConfigError::Environment(value))?;
    }
    Ok(())
}
