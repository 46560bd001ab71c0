//! Plugin registry.

use std::collections::HashMap;

use tracing::info;

use crate::error::{PluginError, PluginResult};
use crate::id::PluginId;
use crate::plugin::Plugin;

/// Registered plugins, keyed by [`PluginId`].
///
/// Stores plugins as given. Structural validation has already happened by
/// the time a plugin gets here.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    entries: Vec<(PluginId, Plugin)>,
    index: HashMap<PluginId, usize>,
}

impl PluginRegistry {
    /// Create an empty plugin registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AlreadyRegistered`] if a plugin with the same
    /// ID is already in the registry.
    pub fn register(&mut self, id: PluginId, plugin: Plugin) -> PluginResult<()> {
        if self.index.contains_key(&id) {
            return Err(PluginError::AlreadyRegistered(id));
        }

        info!(
            plugin_id = %id,
            extensions = plugin.extension_descriptors.len(),
            "Registered plugin"
        );
        self.index.insert(id.clone(), self.entries.len());
        self.entries.push((id, plugin));
        Ok(())
    }

    /// Whether a plugin with `id` is registered.
    #[must_use]
    pub fn is_registered(&self, id: &PluginId) -> bool {
        self.index.contains_key(id)
    }

    /// Get a plugin by ID.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] if no plugin with the given ID exists.
    pub fn get(&self, id: &PluginId) -> PluginResult<&Plugin> {
        self.index
            .get(id)
            .and_then(|&i| self.entries.get(i))
            .map(|(_, plugin)| plugin)
            .ok_or_else(|| PluginError::NotFound(id.clone()))
    }

    /// All registered plugins, in registration order.
    pub fn all(&self) -> impl Iterator<Item = (&PluginId, &Plugin)> {
        self.entries.iter().map(|(id, plugin)| (id, plugin))
    }

    /// Number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
