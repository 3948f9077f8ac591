//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use std::collections::HashSet;

use crate::common::error::ConfigError;
use crate::config::types::Config;

const TOKEN_PLACEHOLDER: &str = "YOUR_TELEGRAM_BOT_TOKEN_HERE";
const KEY_PLACEHOLDER: &str = "YOUR_OPENAI_API_KEY_HERE";

/// Menu buttons carry `replace_src|<route>|<index>|<chat>` in at most 64 bytes.
pub const MAX_ROUTE_NAME_LEN: usize = 24;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.telegram.token.is_empty() {
        errors.push("telegram.token is required".to_string());
    }
    if config.telegram.token == TOKEN_PLACEHOLDER {
        errors.push("telegram.token has not been configured (still using placeholder)".to_string());
    }
    if config.telegram.poll_timeout_secs() == 0 {
        errors.push("telegram.poll_timeout_secs must be non-zero".to_string());
    }

    if config.translation.enabled() {
        if config.translation.api_key.is_empty() || config.translation.api_key == KEY_PLACEHOLDER {
            errors.push(
                "translation.api_key is required while translation is enabled".to_string(),
            );
        }
        let temperature = config.translation.temperature();
        if !(0.0..=2.0).contains(&temperature) {
            errors.push(format!(
                "translation.temperature must be between 0 and 2 (got {})",
                temperature
            ));
        }
    }

    if config.routes.is_empty() {
        errors.push("routes is empty - no message routing configured".to_string());
    }

    let mut names = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        if route.name.is_empty() {
            errors.push(format!("routes[{}].name is required", i));
        } else if route.name.contains('|') || route.name.contains(char::is_whitespace) {
            errors.push(format!(
                "routes[{}].name '{}' must not contain '|' or whitespace",
                i, route.name
            ));
        } else if route.name.len() > MAX_ROUTE_NAME_LEN {
            errors.push(format!(
                "routes[{}].name '{}' is longer than {} bytes",
                i, route.name, MAX_ROUTE_NAME_LEN
            ));
        } else if !names.insert(route.name.as_str()) {
            errors.push(format!("routes[{}].name '{}' is duplicated", i, route.name));
        }
        if route.destination == 0 {
            errors.push(format!("routes[{}].destination must be non-zero", i));
        }
    }

    let storage = config.storage();
    if storage.routing_file().is_empty() {
        errors.push("storage.routing_file must not be empty".to_string());
    }
    if storage.mappings_file().is_empty() {
        errors.push("storage.mappings_file must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
