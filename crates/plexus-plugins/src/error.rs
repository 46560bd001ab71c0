//! Plugin error types.

use crate::id::{ExtensionHandle, ExtensionPointId, PluginId};

/// Errors surfaced to callers of the registries and the manager.
///
/// Per-candidate discovery failures are not represented here; they are
/// [`DiscardReason`](crate::validator::DiscardReason)s and never leave the
/// repository.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// An extension point with this ID is already registered.
    #[error("extension point already registered: {0}")]
    ExtensionPointAlreadyRegistered(ExtensionPointId),

    /// A plugin with this ID is already registered.
    #[error("plugin already registered: {0}")]
    AlreadyRegistered(PluginId),

    /// An extension with this handle is already registered.
    #[error("extension already registered: {0}")]
    ExtensionAlreadyRegistered(ExtensionHandle),

    /// The requested plugin was not found in the registry.
    #[error("plugin not found: {0}")]
    NotFound(PluginId),

    /// The requested extension handle was not found in the registry.
    #[error("extension not found: {0}")]
    ExtensionNotFound(ExtensionHandle),

    /// An identifier failed validation.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// A module URL handed to the URL repository could not be parsed.
    #[error("invalid module url '{url}': {message}")]
    InvalidModuleUrl {
        /// The offending URL string.
        url: String,
        /// Parser message.
        message: String,
    },

    /// The loader could not resolve or evaluate a module.
    #[error("module load failed: {specifier} - {message}")]
    LoadFailed {
        /// Path or URL handed to the loader.
        specifier: String,
        /// Failure reason.
        message: String,
    },

    /// An extension factory failed to produce an instance.
    #[error("extension factory for {extension_point_id} failed: {message}")]
    ExtensionCreateFailed {
        /// Extension point the factory implements.
        extension_point_id: ExtensionPointId,
        /// Failure reason.
        message: String,
    },
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
