//! Extension point registry.

use std::collections::HashSet;

use tracing::info;

use crate::error::{PluginError, PluginResult};
use crate::id::ExtensionPointId;

/// The set of extension points the host declared it supports.
#[derive(Debug, Default)]
pub struct ExtensionPointRegistry {
    order: Vec<ExtensionPointId>,
    known: HashSet<ExtensionPointId>,
}

impl ExtensionPointRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension point.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidId`] for an empty or whitespace-only id
    /// and [`PluginError::ExtensionPointAlreadyRegistered`] if `id` is
    /// already present.
    pub fn register(&mut self, id: ExtensionPointId) -> PluginResult<()> {
        if id.as_str().trim().is_empty() {
            return Err(PluginError::InvalidId(
                "extension point id must not be empty".into(),
            ));
        }
        if !self.known.insert(id.clone()) {
            return Err(PluginError::ExtensionPointAlreadyRegistered(id));
        }
        info!(extension_point = %id, "Registered extension point");
        self.order.push(id);
        Ok(())
    }

    /// Whether `id` has been registered.
    #[must_use]
    pub fn is_registered(&self, id: &ExtensionPointId) -> bool {
        self.known.contains(id)
    }

    /// All registered extension points, in registration order.
    pub fn all(&self) -> impl Iterator<Item = &ExtensionPointId> {
        self.order.iter()
    }

    /// Number of registered extension points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_query() {
        let mut registry = ExtensionPointRegistry::new();
        let a = ExtensionPointId::from_static("a");

        assert!(!registry.is_registered(&a));
        registry.register(a.clone()).unwrap();
        assert!(registry.is_registered(&a));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = ExtensionPointRegistry::new();
        registry.register("a".into()).unwrap();

        let result = registry.register("a".into());
        assert!(matches!(
            result,
            Err(PluginError::ExtensionPointAlreadyRegistered(id)) if id.as_str() == "a"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_blank_id_rejected() {
        let mut registry = ExtensionPointRegistry::new();
        assert!(matches!(registry.register("".into()), Err(PluginError::InvalidId(_))));
        assert!(matches!(registry.register("  ".into()), Err(PluginError::InvalidId(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_all_is_ordered_and_restartable() {
        let mut registry = ExtensionPointRegistry::new();
        for id in ["c", "a", "b"] {
            registry.register(id.into()).unwrap();
        }

        let first: Vec<&str> = registry.all().map(ExtensionPointId::as_str).collect();
        let second: Vec<&str> = registry.all().map(ExtensionPointId::as_str).collect();
        assert_eq!(first, vec!["c", "a", "b"]);
        assert_eq!(first, second);
    }
}
