//! Extension registry.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{PluginError, PluginResult};
use crate::id::{ExtensionHandle, ExtensionPointId, PluginId};
use crate::plugin::ExtensionDescriptor;

/// One registered extension.
#[derive(Debug, Clone)]
pub struct RegisteredExtension {
    /// Handle the extension is registered under.
    pub handle: ExtensionHandle,
    /// Plugin that declared it.
    pub plugin_id: PluginId,
    /// The descriptor as declared.
    pub descriptor: ExtensionDescriptor,
}

/// Registered extensions, indexed by handle and by extension point.
///
/// Both indices are updated in the same call; every handle listed under an
/// extension point is present in the primary map.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    by_handle: HashMap<ExtensionHandle, RegisteredExtension>,
    by_extension_point: HashMap<ExtensionPointId, Vec<ExtensionHandle>>,
}

impl ExtensionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor`, declared by `plugin_id`, under `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ExtensionAlreadyRegistered`] if `handle` is
    /// already in use.
    pub fn register(
        &mut self,
        handle: ExtensionHandle,
        plugin_id: PluginId,
        descriptor: ExtensionDescriptor,
    ) -> PluginResult<()> {
        if self.by_handle.contains_key(&handle) {
            return Err(PluginError::ExtensionAlreadyRegistered(handle));
        }

        debug!(
            extension_handle = %handle,
            plugin_id = %plugin_id,
            extension_point = %descriptor.extension_point_id,
            "Registered extension"
        );

        self.by_extension_point
            .entry(descriptor.extension_point_id.clone())
            .or_default()
            .push(handle.clone());
        self.by_handle.insert(
            handle.clone(),
            RegisteredExtension {
                handle,
                plugin_id,
                descriptor,
            },
        );
        Ok(())
    }

    /// Whether `handle` is registered.
    #[must_use]
    pub fn is_registered(&self, handle: &ExtensionHandle) -> bool {
        self.by_handle.contains_key(handle)
    }

    /// Get the descriptor registered under `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ExtensionNotFound`] for an unknown handle.
    pub fn get(&self, handle: &ExtensionHandle) -> PluginResult<&ExtensionDescriptor> {
        self.entry(handle).map(|e| &e.descriptor)
    }

    /// Get the full entry registered under `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ExtensionNotFound`] for an unknown handle.
    pub fn entry(&self, handle: &ExtensionHandle) -> PluginResult<&RegisteredExtension> {
        self.by_handle
            .get(handle)
            .ok_or_else(|| PluginError::ExtensionNotFound(handle.clone()))
    }

    /// Extensions implementing `extension_point_id`, in registration order.
    ///
    /// Empty for an extension point with no extensions, registered or not.
    pub fn extensions<'a>(
        &'a self,
        extension_point_id: &ExtensionPointId,
    ) -> impl Iterator<Item = &'a RegisteredExtension> + use<'a> {
        self.by_extension_point
            .get(extension_point_id)
            .into_iter()
            .flatten()
            .filter_map(|handle| self.by_handle.get(handle))
    }

    /// Total number of registered extensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}
