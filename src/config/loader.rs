// Configuration loader
//
// Loads the config document from a file (format picked from the extension,
// YAML or TOML) with `MIKOSHI__...` environment overrides on top.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::constants::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, ENV_OVERRIDE_PREFIX};
use super::settings::Config;
use crate::errors::ConfigError;

/// Fail fast when a config path was given but does not exist.
pub fn validate_config_file(config_path: Option<&Path>) -> Result<(), ConfigError> {
    match config_path {
        Some(path) if !path.exists() => Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        }),
        _ => Ok(()),
    }
}

/// Path to load: explicit flag, then `MIKOSHI_CONFIG`, then the default.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

/// Load and validate configuration from `path`.
///
/// The selected provider is checked here so an unsupported or unimplemented
/// provider is reported at startup, before any client is built.
pub fn load_config_from(path: &Path) -> Result<Config> {
    validate_config_file(Some(path))?;

    tracing::debug!("Loading configuration from {}", path.display());

    let config: Config = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_OVERRIDE_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to read configuration file {}", path.display()))?
        .try_deserialize()
        .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;

    config
        .llm_config
        .client
        .provider_settings()
        .context("Configuration validation failed")?;

    Ok(config)
}

/// Load configuration from the resolved default location
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = resolve_config_path(explicit);
    load_config_from(&path)
}
