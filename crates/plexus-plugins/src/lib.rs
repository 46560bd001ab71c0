//! Plexus Plugins - Plugin discovery and extension registry.
//!
//! This crate provides:
//! - Typed identifiers for plugins, extension points and extension handles
//! - A structural [`validate_plugin`] check for untrusted loaded modules
//! - [`PluginRepository`] strategies over `node_modules` trees and URL lists
//! - [`PluginManager`], which ties discovery to the registries
//!
//! Loading a module (turning a path or URL into a [`LoadedModule`]) is
//! delegated to a host-supplied [`ModuleLoader`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use plexus_plugins::{ModuleExport, Plugin, PluginManager, StaticModuleLoader};
//!
//! # async fn run() -> plexus_plugins::PluginResult<()> {
//! let loader = StaticModuleLoader::new()
//!     .with_module("https://plugins.example.com/@acme/widgets", ModuleExport::plugin(Plugin::default()));
//! let mut manager =
//!     PluginManager::from_urls(["https://plugins.example.com/@acme/widgets"], Arc::new(loader))?;
//!
//! manager.register_extension_point("widgets".into())?;
//! let added = manager.register_plugins_by_module_scope("@acme").await?;
//! assert_eq!(added, 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod candidate;
pub mod error;
pub mod id;
pub mod loader;
pub mod manager;
pub mod plugin;
pub mod registry;
pub mod repository;
pub mod validator;

pub use candidate::{
    CandidateDescriptor, CandidateFactory, CandidatePlugin, LoadedModule, ModuleExport,
    PluginConstructor,
};
pub use error::{PluginError, PluginResult};
pub use id::{ExtensionHandle, ExtensionPointId, PluginId};
pub use loader::{ModuleLoader, StaticModuleLoader};
pub use manager::PluginManager;
pub use plugin::{ExtensionDescriptor, ExtensionFactory, ExtensionInfo, ExtensionInstance, Plugin};
pub use registry::{ExtensionPointRegistry, ExtensionRegistry, PluginRegistry, RegisteredExtension};
pub use repository::{
    NodeModulesRepository, PluginQuery, PluginRepository, PluginStream, UrlPluginRepository,
};
pub use validator::{DiscardReason, ValidatedPlugin, ValidationOutcome, validate_plugin};
