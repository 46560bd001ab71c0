//! Mock factories, loaders and repositories.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use serde_json::Value;

use plexus_plugins::{
    ExtensionFactory, ExtensionInstance, ExtensionPointId, LoadedModule, ModuleLoader, Plugin,
    PluginError, PluginId, PluginQuery, PluginRepository, PluginResult, PluginStream,
};

/// Factory whose instance is the `host_data` it was given.
///
/// Downcast the instance to `Option<Value>` to inspect it.
#[derive(Debug, Default)]
pub struct EchoFactory;

#[async_trait]
impl ExtensionFactory for EchoFactory {
    async fn create(&self, host_data: Option<Value>) -> PluginResult<ExtensionInstance> {
        Ok(Box::new(host_data))
    }
}

/// Factory that counts `create` calls.
#[derive(Debug, Clone, Default)]
pub struct CountingFactory {
    calls: Arc<AtomicUsize>,
}

impl CountingFactory {
    /// Create a factory with a zero count.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `create` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtensionFactory for CountingFactory {
    async fn create(&self, _host_data: Option<Value>) -> PluginResult<ExtensionInstance> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(()))
    }
}

/// Factory whose `create` always fails with
/// [`PluginError::ExtensionCreateFailed`].
#[derive(Debug, Clone)]
pub struct FailingFactory {
    extension_point_id: ExtensionPointId,
}

impl FailingFactory {
    /// A factory failing on behalf of `extension_point_id`.
    #[must_use]
    pub fn new(extension_point_id: impl Into<ExtensionPointId>) -> Self {
        Self {
            extension_point_id: extension_point_id.into(),
        }
    }
}

#[async_trait]
impl ExtensionFactory for FailingFactory {
    async fn create(&self, _host_data: Option<Value>) -> PluginResult<ExtensionInstance> {
        Err(PluginError::ExtensionCreateFailed {
            extension_point_id: self.extension_point_id.clone(),
            message: "extension refused to start".to_owned(),
        })
    }
}

/// Loader wrapper that records every specifier it is asked for.
#[derive(Clone)]
pub struct RecordingLoader {
    inner: Arc<dyn ModuleLoader>,
    specifiers: Arc<Mutex<Vec<String>>>,
}

impl RecordingLoader {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn ModuleLoader>) -> Self {
        Self {
            inner,
            specifiers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Specifiers requested so far, in order.
    #[must_use]
    pub fn specifiers(&self) -> Vec<String> {
        self.specifiers
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of load requests so far.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.specifiers.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for RecordingLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingLoader")
            .field("load_count", &self.load_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModuleLoader for RecordingLoader {
    async fn load(&self, specifier: &str) -> PluginResult<LoadedModule> {
        if let Ok(mut guard) = self.specifiers.lock() {
            guard.push(specifier.to_owned());
        }
        self.inner.load(specifier).await
    }
}

/// One entry of a [`StaticRepository`].
#[derive(Debug, Clone)]
struct StaticEntry {
    scope: Option<String>,
    name: String,
    plugin: Plugin,
}

/// In-memory repository serving pre-built plugins.
///
/// Honors every [`PluginQuery`] filter. Each entry's id is its module name,
/// prefixed with its scope when it has one.
#[derive(Debug, Clone, Default)]
pub struct StaticRepository {
    entries: Vec<StaticEntry>,
    queries: Arc<AtomicUsize>,
}

impl StaticRepository {
    /// An empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unscoped module.
    #[must_use]
    pub fn with_plugin(mut self, name: impl Into<String>, plugin: Plugin) -> Self {
        self.entries.push(StaticEntry {
            scope: None,
            name: name.into(),
            plugin,
        });
        self
    }

    /// Add a scoped module. `scope` may omit the leading `@`.
    #[must_use]
    pub fn with_scoped_plugin(
        mut self,
        scope: &str,
        name: impl Into<String>,
        plugin: Plugin,
    ) -> Self {
        self.entries.push(StaticEntry {
            scope: Some(plexus_plugins::repository::normalize_scope(scope)),
            name: name.into(),
            plugin,
        });
        self
    }

    /// Number of discovery requests served.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl PluginRepository for StaticRepository {
    fn plugins(&self, query: PluginQuery) -> PluginStream {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let matches: Vec<(PluginId, Plugin)> = self
            .entries
            .iter()
            .filter(|entry| query.matches_module(entry.scope.as_deref(), &entry.name))
            .filter(|entry| {
                query
                    .extension_point
                    .as_ref()
                    .is_none_or(|ep| entry.plugin.provides(ep))
            })
            .map(|entry| {
                let id = match &entry.scope {
                    Some(scope) => format!("{scope}/{}", entry.name),
                    None => entry.name.clone(),
                };
                (PluginId::from_static(&id), entry.plugin.clone())
            })
            .collect();

        stream::iter(matches).boxed()
    }
}

#[cfg(test)]
mod tests {
    use plexus_plugins::StaticModuleLoader;

    use super::*;
    use crate::fixtures::{EXTENSION_POINT_B, plugin_a, plugin_b};

    #[tokio::test]
    async fn test_recording_loader_records_misses() {
        let loader = RecordingLoader::new(Arc::new(StaticModuleLoader::new()));
        assert!(loader.load("nowhere").await.is_err());
        assert_eq!(loader.specifiers(), vec!["nowhere".to_owned()]);
    }

    #[tokio::test]
    async fn test_counting_factory() {
        let factory = CountingFactory::new();
        factory.create(None).await.unwrap();
        factory.create(None).await.unwrap();
        assert_eq!(factory.calls(), 2);
    }

    #[tokio::test]
    async fn test_static_repository_filters() {
        let repo = StaticRepository::new()
            .with_plugin("PluginA", plugin_a())
            .with_scoped_plugin("acme", "PluginB", plugin_b());

        let all: Vec<_> = repo.all_plugins().collect().await;
        assert_eq!(all.len(), 2);

        let scoped: Vec<_> = repo.plugins_by_module_scope("@acme").collect().await;
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].0.as_str(), "@acme/PluginB");

        let by_ep: Vec<_> = repo
            .plugins_by_extension_point(&EXTENSION_POINT_B.into())
            .collect()
            .await;
        assert_eq!(by_ep.len(), 1);
        assert_eq!(repo.query_count(), 3);
    }
}
