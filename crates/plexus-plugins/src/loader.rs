//! Module loading boundary.
//!
//! Discovery decides *which* modules to look at; a [`ModuleLoader`] decides
//! how a path or URL becomes a [`LoadedModule`]. Embedders plug in their own
//! runtime here (a JS engine, a WASM host, a dylib loader).
//! [`StaticModuleLoader`] covers plugins linked into the host binary.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use tracing::trace;

use crate::error::{PluginError, PluginResult};
use crate::candidate::{LoadedModule, ModuleExport};

/// Turns a resolved module location into a loaded module.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Load the module at `specifier`, a filesystem path or a URL.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::LoadFailed`] for any resolution, parse or
    /// evaluation failure. Discovery treats every error as "not a plugin".
    async fn load(&self, specifier: &str) -> PluginResult<LoadedModule>;
}

/// In-process loader backed by a fixed specifier table.
///
/// ```
/// use plexus_plugins::{ModuleExport, Plugin, StaticModuleLoader};
///
/// let loader = StaticModuleLoader::new()
///     .with_module("https://plugins.example.com/@acme/widgets", ModuleExport::plugin(Plugin::default()));
/// assert_eq!(loader.len(), 1);
/// ```
#[derive(Default, Clone)]
pub struct StaticModuleLoader {
    modules: HashMap<String, ModuleExport>,
}

impl StaticModuleLoader {
    /// Create an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the default export for `specifier`.
    #[must_use]
    pub fn with_module(mut self, specifier: impl Into<String>, export: ModuleExport) -> Self {
        self.insert(specifier, export);
        self
    }

    /// Register the default export for a filesystem entry point.
    #[must_use]
    pub fn with_module_path(mut self, path: impl AsRef<Path>, export: ModuleExport) -> Self {
        self.insert(path.as_ref().to_string_lossy(), export);
        self
    }

    /// Register the default export for `specifier`, replacing any previous one.
    pub fn insert(&mut self, specifier: impl Into<String>, export: ModuleExport) {
        self.modules.insert(specifier.into(), export);
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no modules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[async_trait]
impl ModuleLoader for StaticModuleLoader {
    async fn load(&self, specifier: &str) -> PluginResult<LoadedModule> {
        trace!(specifier, "Resolving static module");
        self.modules
            .get(specifier)
            .cloned()
            .map(LoadedModule::with_default)
            .ok_or_else(|| PluginError::LoadFailed {
                specifier: specifier.to_string(),
                message: "module not found".to_string(),
            })
    }
}

impl fmt::Debug for StaticModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut specifiers: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        specifiers.sort_unstable();
        f.debug_struct("StaticModuleLoader")
            .field("modules", &specifiers)
            .finish()
    }
}
