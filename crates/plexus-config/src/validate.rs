//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: [&str; 4] = ["pretty", "compact", "json", "full"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_discovery(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_discovery(config: &Config) -> ConfigResult<()> {
    let d = &config.discovery;

    if d.max_concurrent_reads == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "discovery.max_concurrent_reads".to_owned(),
            message: "max_concurrent_reads must be at least 1; omit it for unbounded reads"
                .to_owned(),
        });
    }

    for (i, raw) in d.module_urls.iter().enumerate() {
        if let Err(e) = url::Url::parse(raw) {
            return Err(ConfigError::ValidationError {
                field: format!("discovery.module_urls[{i}]"),
                message: format!("'{raw}' is not an absolute URL: {e}"),
            });
        }
    }

    if let Some(empty) = d.search_paths.iter().position(|p| p.as_os_str().is_empty()) {
        return Err(ConfigError::ValidationError {
            field: format!("discovery.search_paths[{empty}]"),
            message: "search path must not be empty".to_owned(),
        });
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    if !VALID_LEVELS.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                VALID_LEVELS.join(", ")
            ),
        });
    }

    if !VALID_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                VALID_FORMATS.join(", ")
            ),
        });
    }

    Ok(())
}
