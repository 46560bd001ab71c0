//! Plexus Config - Layered configuration for plugin discovery.
//!
//! Precedence (highest wins):
//! 1. `{workspace}/.plexus/config.toml`
//! 2. `~/.plexus/config.toml`
//! 3. `PLEXUS_*` environment variables (fallback only, for fields no file set)
//! 4. Embedded defaults
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! # fn main() -> Result<(), plexus_config::ConfigError> {
//! let config = plexus_config::Config::load(Some(Path::new(".")))?;
//! println!("scanning {} roots", config.discovery.search_paths.len());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod env;
pub mod error;
pub mod loader;
pub mod merge;
pub mod types;
pub mod validate;

use std::path::Path;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_DIR, CONFIG_FILE, ResolvedConfig};
pub use merge::{ConfigLayer, FieldSources};
pub use types::{Config, DiscoveryConfig, LoggingConfig};

impl Config {
    /// Load the layered configuration for `workspace_root`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a config file is malformed or the merged
    /// result fails validation.
    pub fn load(workspace_root: Option<&Path>) -> ConfigResult<Self> {
        loader::load(workspace_root, None).map(|resolved| resolved.config)
    }

    /// Load a single config file without layering.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed or
    /// validated.
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
