//! In-memory registries owned by the [`PluginManager`](crate::PluginManager).
//!
//! All three are append-only and keep insertion order. They hold no locks;
//! the manager is their only writer.

mod extension_points;
mod extensions;
mod plugins;

pub use extension_points::ExtensionPointRegistry;
pub use extensions::{ExtensionRegistry, RegisteredExtension};
pub use plugins::PluginRegistry;
