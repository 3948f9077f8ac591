//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `CHANRELAY_TELEGRAM_TOKEN` - Telegram bot token
//! - `CHANRELAY_OPENAI_API_KEY` - translation API key
//! - `CHANRELAY_ROUTING_FILE` - routing document path
//! - `CHANRELAY_MAPPINGS_FILE` - mapping document path

use std::env;

use crate::config::types::{Config, StorageConfig};

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "CHANRELAY";

/// Apply environment variable overrides to a config.
///
/// This allows secrets to be provided via environment variables
/// instead of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(token) = env::var(format!("{}_TELEGRAM_TOKEN", ENV_PREFIX)) {
        config.telegram.token = token;
    }
    if let Ok(key) = env::var(format!("{}_OPENAI_API_KEY", ENV_PREFIX)) {
        config.translation.api_key = key;
    }

    if let Ok(path) = env::var(format!("{}_ROUTING_FILE", ENV_PREFIX)) {
        config
            .storage
            .get_or_insert_with(StorageConfig::default)
            .routing_file = Some(path);
    }
    if let Ok(path) = env::var(format!("{}_MAPPINGS_FILE", ENV_PREFIX)) {
        config
            .storage
            .get_or_insert_with(StorageConfig::default)
            .mappings_file = Some(path);
    }

    config
}

/// Check if any secret environment variables are set but empty.
pub fn check_empty_env_vars() -> Vec<String> {
    let vars = [
        format!("{}_TELEGRAM_TOKEN", ENV_PREFIX),
        format!("{}_OPENAI_API_KEY", ENV_PREFIX),
    ];

    vars.into_iter()
        .filter(|var| env::var(var).map(|v| v.is_empty()).unwrap_or(false))
        .collect()
}

/// Get the config file path from environment or use default.
///
/// Checks `CHANRELAY_CONFIG` environment variable, otherwise returns "chanrelay.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "chanrelay.conf".to_string())
}
