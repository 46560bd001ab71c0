//! Plugin model: plugins, extension descriptors and factories.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::PluginResult;
use crate::id::{ExtensionHandle, ExtensionPointId, PluginId};

/// Value produced by an extension factory.
///
/// The concrete type is part of the contract between the host and the
/// extension point; this crate never inspects it. Hosts recover the concrete
/// type with [`Box::downcast`].
pub type ExtensionInstance = Box<dyn Any + Send + Sync>;

/// Creates instances of one extension.
#[async_trait]
pub trait ExtensionFactory: Send + Sync {
    /// Create an extension instance.
    ///
    /// `host_data` is forwarded unchanged from
    /// [`PluginManager::instantiate`](crate::PluginManager::instantiate).
    async fn create(&self, host_data: Option<Value>) -> PluginResult<ExtensionInstance>;
}

impl fmt::Debug for dyn ExtensionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExtensionFactory")
    }
}

/// One capability implementation declared by a plugin.
#[derive(Clone)]
pub struct ExtensionDescriptor {
    /// The extension point this descriptor implements.
    pub extension_point_id: ExtensionPointId,
    /// Factory producing extension instances.
    pub factory: Arc<dyn ExtensionFactory>,
    /// Optional data exposed to the host without instantiating the extension.
    pub extension_data: Option<Value>,
}

impl ExtensionDescriptor {
    /// Create a descriptor with no extension data.
    pub fn new(
        extension_point_id: impl Into<ExtensionPointId>,
        factory: Arc<dyn ExtensionFactory>,
    ) -> Self {
        Self {
            extension_point_id: extension_point_id.into(),
            factory,
            extension_data: None,
        }
    }

    /// Attach extension data.
    #[must_use]
    pub fn with_extension_data(mut self, data: Value) -> Self {
        self.extension_data = Some(data);
        self
    }
}

impl fmt::Debug for ExtensionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionDescriptor")
            .field("extension_point_id", &self.extension_point_id)
            .field("extension_data", &self.extension_data)
            .finish_non_exhaustive()
    }
}

/// A discoverable unit declaring zero or more extensions.
#[derive(Debug, Clone, Default)]
pub struct Plugin {
    /// Declared extensions, in declaration order.
    pub extension_descriptors: Vec<ExtensionDescriptor>,
    /// Optional plugin-level data visible to the host.
    pub plugin_data: Option<Value>,
}

impl Plugin {
    /// Create a plugin from its descriptors.
    #[must_use]
    pub fn new(extension_descriptors: Vec<ExtensionDescriptor>) -> Self {
        Self {
            extension_descriptors,
            plugin_data: None,
        }
    }

    /// Attach plugin data.
    #[must_use]
    pub fn with_plugin_data(mut self, data: Value) -> Self {
        self.plugin_data = Some(data);
        self
    }

    /// Whether any descriptor targets `extension_point_id`.
    #[must_use]
    pub fn provides(&self, extension_point_id: &ExtensionPointId) -> bool {
        self.extension_descriptors
            .iter()
            .any(|d| &d.extension_point_id == extension_point_id)
    }
}

/// Read-only view of a registered extension, returned by
/// [`PluginManager::extensions`](crate::PluginManager::extensions).
///
/// Rebuilt on every query by joining the extension and plugin registries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionInfo {
    /// Handle to pass to [`PluginManager::instantiate`](crate::PluginManager::instantiate).
    pub extension_handle: ExtensionHandle,
    /// Plugin that declared the extension.
    pub plugin_id: PluginId,
    /// The descriptor's extension data.
    pub extension_data: Option<Value>,
    /// The owning plugin's data.
    pub plugin_data: Option<Value>,
}
