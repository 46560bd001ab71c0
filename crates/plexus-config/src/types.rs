//! Configuration struct definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where and how plugins are discovered.
    pub discovery: DiscoveryConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Plugin discovery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// `node_modules` roots to scan. Empty means the runtime defaults.
    pub search_paths: Vec<PathBuf>,
    /// Whether the runtime defaults include the global package folder.
    pub include_global_packages: bool,
    /// Module URLs to discover from. A non-empty list selects URL discovery.
    pub module_urls: Vec<String>,
    /// Cap on concurrent directory reads. `None` means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_reads: Option<usize>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            include_global_packages: true,
            module_urls: Vec::new(),
            max_concurrent_reads: None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level filter: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Output format: `pretty`, `compact`, `json` or `full`.
    pub format: String,
    /// Extra per-target directives, e.g. `plexus_plugins=debug`.
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
        }
    }
}
