//! Structural view of a just-loaded module.
//!
//! A loader cannot hand back a typed [`Plugin`] because nothing about a
//! third-party module is trusted yet. It hands back a [`LoadedModule`]
//! instead, where every member the plugin contract requires is optional.
//! [`validate_plugin`](crate::validate_plugin) is the only code that turns
//! one into a [`Plugin`].

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::id::ExtensionPointId;
use crate::plugin::{ExtensionDescriptor, ExtensionFactory, Plugin};

/// Zero-argument constructor exported by a plugin module.
///
/// An `Err` means the constructor itself failed while running.
pub type PluginConstructor = Arc<dyn Fn() -> Result<CandidatePlugin, String> + Send + Sync>;

/// What a module exports as its default.
#[derive(Clone)]
pub enum ModuleExport {
    /// A constructible export.
    Constructor(PluginConstructor),
    /// Any non-constructible export (object literal, string, number, ...).
    Value(Value),
}

impl ModuleExport {
    /// Wrap a constructor closure.
    pub fn constructor<F>(f: F) -> Self
    where
        F: Fn() -> Result<CandidatePlugin, String> + Send + Sync + 'static,
    {
        Self::Constructor(Arc::new(f))
    }

    /// Export a well-formed plugin; each construction clones it.
    #[must_use]
    pub fn plugin(plugin: Plugin) -> Self {
        Self::constructor(move || Ok(CandidatePlugin::from(plugin.clone())))
    }
}

impl fmt::Debug for ModuleExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constructor(_) => f.write_str("Constructor(..)"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
        }
    }
}

/// A module as returned by a [`ModuleLoader`](crate::ModuleLoader).
#[derive(Debug, Clone, Default)]
pub struct LoadedModule {
    /// The default export, if the module has one.
    pub default_export: Option<ModuleExport>,
}

impl LoadedModule {
    /// A module whose default export is `export`.
    #[must_use]
    pub fn with_default(export: ModuleExport) -> Self {
        Self {
            default_export: Some(export),
        }
    }
}

/// An instance produced by a plugin constructor, not yet validated.
#[derive(Debug, Clone, Default)]
pub struct CandidatePlugin {
    /// `None` when the instance exposes no descriptor list at all.
    pub extension_descriptors: Option<Vec<CandidateDescriptor>>,
    /// Plugin-level data.
    pub plugin_data: Option<Value>,
}

impl From<Plugin> for CandidatePlugin {
    fn from(plugin: Plugin) -> Self {
        Self {
            extension_descriptors: Some(
                plugin
                    .extension_descriptors
                    .into_iter()
                    .map(CandidateDescriptor::from)
                    .collect(),
            ),
            plugin_data: plugin.plugin_data,
        }
    }
}

/// An extension descriptor, not yet validated.
#[derive(Debug, Clone, Default)]
pub struct CandidateDescriptor {
    /// Declared extension point.
    pub extension_point_id: Option<ExtensionPointId>,
    /// Declared factory object.
    pub factory: Option<CandidateFactory>,
    /// Extension data.
    pub extension_data: Option<Value>,
}

impl From<ExtensionDescriptor> for CandidateDescriptor {
    fn from(descriptor: ExtensionDescriptor) -> Self {
        Self {
            extension_point_id: Some(descriptor.extension_point_id),
            factory: Some(CandidateFactory {
                create: Some(descriptor.factory),
            }),
            extension_data: descriptor.extension_data,
        }
    }
}

/// A factory object; `create` is `None` when the object has no callable
/// `create` member.
#[derive(Clone, Default)]
pub struct CandidateFactory {
    /// The `create` operation.
    pub create: Option<Arc<dyn ExtensionFactory>>,
}

impl fmt::Debug for CandidateFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateFactory")
            .field("has_create", &self.create.is_some())
            .finish()
    }
}
