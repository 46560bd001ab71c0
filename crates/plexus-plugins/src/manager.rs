//! The plugin manager façade.
//!
//! [`PluginManager`] owns a repository and the three registries. Hosts
//! declare the extension points they understand, run discovery, then list
//! and instantiate extensions through opaque handles.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use plexus_plugins::{PluginManager, StaticModuleLoader};
//!
//! # async fn run() -> plexus_plugins::PluginResult<()> {
//! let mut manager = PluginManager::node_modules(Arc::new(StaticModuleLoader::new()), None);
//! manager.register_extension_point("formatter".into())?;
//!
//! let added = manager.register_plugins_by_module_scope("@acme").await?;
//! tracing::info!(added, "discovered formatters");
//!
//! for info in manager.extensions(&"formatter".into()) {
//!     let _formatter = manager.instantiate(&info.extension_handle, None).await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::PluginResult;
use crate::id::{ExtensionHandle, ExtensionPointId, PluginId};
use crate::loader::ModuleLoader;
use crate::plugin::{ExtensionInfo, ExtensionInstance, Plugin};
use crate::registry::{ExtensionPointRegistry, ExtensionRegistry, PluginRegistry};
use crate::repository::{
    NodeModulesRepository, PluginRepository, PluginStream, UrlPluginRepository,
};

/// Host-facing entry point for plugin discovery and extension lookup.
///
/// Registration methods take `&mut self`: a manager has exactly one writer.
/// Wrap it in a lock if several tasks need to register concurrently.
pub struct PluginManager {
    repository: Arc<dyn PluginRepository>,
    extension_points: ExtensionPointRegistry,
    plugins: PluginRegistry,
    extensions: ExtensionRegistry,
}

impl PluginManager {
    /// Create a manager discovering plugins from `repository`.
    #[must_use]
    pub fn new(repository: Arc<dyn PluginRepository>) -> Self {
        Self {
            repository,
            extension_points: ExtensionPointRegistry::new(),
            plugins: PluginRegistry::new(),
            extensions: ExtensionRegistry::new(),
        }
    }

    /// Create a manager scanning `node_modules` trees.
    ///
    /// `search_paths` defaults to the working directory's `node_modules`
    /// plus the global package folder.
    #[must_use]
    pub fn node_modules(loader: Arc<dyn ModuleLoader>, search_paths: Option<Vec<PathBuf>>) -> Self {
        let repository = match search_paths {
            Some(paths) => NodeModulesRepository::with_search_paths(loader, paths),
            None => NodeModulesRepository::new(loader),
        };
        Self::new(Arc::new(repository))
    }

    /// Create a manager over a fixed list of module URLs.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidModuleUrl`](crate::PluginError::InvalidModuleUrl)
    /// if any URL fails to parse.
    pub fn from_urls<I, S>(urls: I, loader: Arc<dyn ModuleLoader>) -> PluginResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::new(Arc::new(UrlPluginRepository::new(urls, loader)?)))
    }

    /// Create a manager from loaded discovery settings.
    ///
    /// A non-empty `module_urls` list selects URL discovery; otherwise the
    /// manager scans `search_paths`, or the defaults when that is empty.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidModuleUrl`](crate::PluginError::InvalidModuleUrl)
    /// if a configured URL fails to parse.
    #[cfg(feature = "config")]
    pub fn from_config(
        config: &plexus_config::DiscoveryConfig,
        loader: Arc<dyn ModuleLoader>,
    ) -> PluginResult<Self> {
        if !config.module_urls.is_empty() {
            return Self::from_urls(&config.module_urls, loader);
        }

        let paths = if config.search_paths.is_empty() {
            crate::repository::default_search_paths(config.include_global_packages)
        } else {
            config.search_paths.clone()
        };
        let mut repository = NodeModulesRepository::with_search_paths(loader, paths);
        if let Some(limit) = config.max_concurrent_reads {
            repository = repository.with_max_concurrent_reads(limit);
        }
        Ok(Self::new(Arc::new(repository)))
    }

    // -----------------------------------------------------------------------
    // Extension points
    // -----------------------------------------------------------------------

    /// Declare an extension point the host can consume.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ExtensionPointAlreadyRegistered`](crate::PluginError::ExtensionPointAlreadyRegistered)
    /// if it was already declared.
    pub fn register_extension_point(&mut self, id: ExtensionPointId) -> PluginResult<()> {
        self.extension_points.register(id)
    }

    /// Declared extension points, in declaration order.
    pub fn registered_extension_points(&self) -> impl Iterator<Item = &ExtensionPointId> {
        self.extension_points.all()
    }

    /// Whether `id` has been declared.
    #[must_use]
    pub fn is_extension_point_registered(&self, id: &ExtensionPointId) -> bool {
        self.extension_points.is_registered(id)
    }

    // -----------------------------------------------------------------------
    // Plugins
    // -----------------------------------------------------------------------

    /// Register a plugin directly, bypassing discovery.
    ///
    /// Each descriptor whose extension point is declared gets a fresh
    /// handle. Descriptors for undeclared extension points are skipped
    /// without affecting the rest of the plugin.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AlreadyRegistered`](crate::PluginError::AlreadyRegistered)
    /// if a plugin with `id` is already registered.
    pub fn register_plugin(&mut self, id: PluginId, plugin: Plugin) -> PluginResult<()> {
        let descriptors = plugin.extension_descriptors.clone();
        self.plugins.register(id.clone(), plugin)?;

        for descriptor in descriptors {
            if !self
                .extension_points
                .is_registered(&descriptor.extension_point_id)
            {
                debug!(
                    plugin_id = %id,
                    extension_point = %descriptor.extension_point_id,
                    "Skipping extension for undeclared extension point"
                );
                continue;
            }
            let handle = self.mint_handle();
            self.extensions.register(handle, id.clone(), descriptor)?;
        }
        Ok(())
    }

    /// Discover and register plugins providing `extension_point`.
    ///
    /// Returns the number of plugins newly registered. Plugins already
    /// registered under the same ID are skipped and not counted.
    ///
    /// # Errors
    ///
    /// Only registry conflicts surface; per-candidate failures are skipped.
    pub async fn register_plugins_by_extension_point(
        &mut self,
        extension_point: &ExtensionPointId,
    ) -> PluginResult<usize> {
        let stream = self.repository.plugins_by_extension_point(extension_point);
        self.register_discovered(stream).await
    }

    /// Discover and register plugins packaged as `name`, optionally inside
    /// `scope`.
    ///
    /// # Errors
    ///
    /// Only registry conflicts surface; per-candidate failures are skipped.
    pub async fn register_plugins_by_module_name(
        &mut self,
        name: &str,
        scope: Option<&str>,
    ) -> PluginResult<usize> {
        let stream = self.repository.plugins_by_module_name(name, scope);
        self.register_discovered(stream).await
    }

    /// Discover and register plugins packaged inside `scope`.
    ///
    /// # Errors
    ///
    /// Only registry conflicts surface; per-candidate failures are skipped.
    pub async fn register_plugins_by_module_scope(&mut self, scope: &str) -> PluginResult<usize> {
        let stream = self.repository.plugins_by_module_scope(scope);
        self.register_discovered(stream).await
    }

    /// Discover and register plugins packaged inside `scope` that provide
    /// `extension_point`.
    ///
    /// # Errors
    ///
    /// Only registry conflicts surface; per-candidate failures are skipped.
    pub async fn register_plugins_by_module_scope_and_extension_point(
        &mut self,
        scope: &str,
        extension_point: &ExtensionPointId,
    ) -> PluginResult<usize> {
        let stream = self
            .repository
            .plugins_by_module_scope_and_extension_point(scope, extension_point);
        self.register_discovered(stream).await
    }

    /// Discover and register every plugin the repository can find.
    ///
    /// # Errors
    ///
    /// Only registry conflicts surface; per-candidate failures are skipped.
    pub async fn register_all_plugins(&mut self) -> PluginResult<usize> {
        let stream = self.repository.all_plugins();
        self.register_discovered(stream).await
    }

    /// Registered plugins, in registration order.
    pub fn registered_plugins(&self) -> impl Iterator<Item = (&PluginId, &Plugin)> {
        self.plugins.all()
    }

    /// Look up a registered plugin.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`](crate::PluginError::NotFound) for an
    /// unknown ID.
    pub fn registered_plugin(&self, id: &PluginId) -> PluginResult<&Plugin> {
        self.plugins.get(id)
    }

    // -----------------------------------------------------------------------
    // Extensions
    // -----------------------------------------------------------------------

    /// Extensions registered for `extension_point`, in registration order.
    #[must_use]
    pub fn extensions(&self, extension_point: &ExtensionPointId) -> Vec<ExtensionInfo> {
        self.extensions
            .extensions(extension_point)
            .map(|entry| ExtensionInfo {
                extension_handle: entry.handle.clone(),
                plugin_id: entry.plugin_id.clone(),
                extension_data: entry.descriptor.extension_data.clone(),
                plugin_data: self
                    .plugins
                    .get(&entry.plugin_id)
                    .ok()
                    .and_then(|p| p.plugin_data.clone()),
            })
            .collect()
    }

    /// Create an instance of the extension behind `handle`.
    ///
    /// `host_data` is passed to the factory unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ExtensionNotFound`](crate::PluginError::ExtensionNotFound)
    /// for an unknown handle, without touching any factory. Factory errors
    /// are returned as-is.
    pub async fn instantiate(
        &self,
        handle: &ExtensionHandle,
        host_data: Option<Value>,
    ) -> PluginResult<ExtensionInstance> {
        let factory = Arc::clone(&self.extensions.get(handle)?.factory);
        debug!(extension_handle = %handle, "Instantiating extension");
        factory.create(host_data).await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn register_discovered(&mut self, mut stream: PluginStream) -> PluginResult<usize> {
        let mut registered: usize = 0;
        while let Some((id, plugin)) = stream.next().await {
            if self.plugins.is_registered(&id) {
                debug!(plugin_id = %id, "Plugin already registered, skipping");
                continue;
            }
            self.register_plugin(id, plugin)?;
            registered = registered.saturating_add(1);
        }
        info!(registered, "Plugin discovery finished");
        Ok(registered)
    }

    fn mint_handle(&self) -> ExtensionHandle {
        loop {
            let handle = ExtensionHandle::generate();
            if !self.extensions.is_registered(&handle) {
                return handle;
            }
        }
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("extension_points", &self.extension_points.len())
            .field("plugins", &self.plugins.len())
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}
