//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RouterConfig = toml::from_str(&content)?;
    finalize(config)
}

/// Apply environment overrides, then validate.
pub fn finalize(mut config: RouterConfig) -> Result<RouterConfig, ConfigError> {
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// `NODE<id>_URL` replaces the target of node `<id>`.
pub fn apply_env_overrides<F>(config: &mut RouterConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for node in &mut config.nodes {
        let key = format!("NODE{}_URL", node.id);
        if let Some(target) = lookup(&key).filter(|t| !t.is_empty()) {
            tracing::debug!(node = node.id, env = %key, "Node target overridden from environment");
            node.target = target;
        }
    }
}
