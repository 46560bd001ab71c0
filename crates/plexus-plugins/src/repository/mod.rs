//! Plugin repositories: where discovery looks for plugins.
//!
//! A repository turns a [`PluginQuery`] into a lazy stream of
//! `(PluginId, Plugin)` pairs. Two strategies are provided:
//!
//! - [`NodeModulesRepository`] walks npm-style `node_modules` trees.
//! - [`UrlPluginRepository`] filters a fixed list of module URLs.
//!
//! Both share the same candidate pipeline (load, validate, filter by
//! extension point). A candidate that fails anywhere in the pipeline is
//! dropped with a [`DiscardReason`] and the scan continues.

mod manifest;
mod node_modules;
mod url_list;

use futures::stream::BoxStream;
use tracing::debug;

use crate::id::{ExtensionPointId, PluginId};
use crate::loader::ModuleLoader;
use crate::plugin::Plugin;
use crate::validator::{DiscardReason, validate_plugin};

pub use manifest::{ES_MODULE_TYPE, MANIFEST_FILE, PackageManifest};
pub use node_modules::{NodeModulesRepository, default_search_paths};
pub use url_list::UrlPluginRepository;

/// Lazy stream of discovered plugins.
///
/// Nothing is read or loaded before the first poll. Dropping the stream
/// stops consumption; directory reads already in flight run to completion
/// and their results are discarded.
pub type PluginStream = BoxStream<'static, (PluginId, Plugin)>;

/// Filter applied during discovery.
///
/// All criteria are optional and combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginQuery {
    /// Package scope, always stored with its leading `@`.
    pub module_scope: Option<String>,
    /// Unscoped package name; compared for exact equality.
    pub module_name: Option<String>,
    /// Only yield plugins providing this extension point.
    pub extension_point: Option<ExtensionPointId>,
}

impl PluginQuery {
    /// A query matching every plugin.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a package scope. `acme` and `@acme` are equivalent.
    #[must_use]
    pub fn with_module_scope(mut self, scope: impl AsRef<str>) -> Self {
        self.module_scope = Some(normalize_scope(scope.as_ref()));
        self
    }

    /// Restrict to a package name.
    #[must_use]
    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = Some(name.into());
        self
    }

    /// Restrict to plugins providing `extension_point`.
    #[must_use]
    pub fn with_extension_point(mut self, extension_point: ExtensionPointId) -> Self {
        self.extension_point = Some(extension_point);
        self
    }

    /// Whether a package `[@scope/]name` passes the scope and name filters.
    #[must_use]
    pub fn matches_module(&self, scope: Option<&str>, name: &str) -> bool {
        let scope_ok = match &self.module_scope {
            Some(wanted) => scope == Some(wanted.as_str()),
            None => true,
        };
        let name_ok = self.module_name.as_deref().is_none_or(|wanted| wanted == name);
        scope_ok && name_ok
    }
}

/// Source of discoverable plugins.
///
/// Implementors provide [`plugins`](Self::plugins); the convenience methods
/// build the matching [`PluginQuery`].
pub trait PluginRepository: Send + Sync {
    /// Stream every plugin matching `query`.
    fn plugins(&self, query: PluginQuery) -> PluginStream;

    /// Stream every plugin.
    fn all_plugins(&self) -> PluginStream {
        self.plugins(PluginQuery::all())
    }

    /// Stream plugins providing `extension_point`.
    fn plugins_by_extension_point(&self, extension_point: &ExtensionPointId) -> PluginStream {
        self.plugins(PluginQuery::all().with_extension_point(extension_point.clone()))
    }

    /// Stream plugins packaged as `name`, optionally inside `scope`.
    fn plugins_by_module_name(&self, name: &str, scope: Option<&str>) -> PluginStream {
        let query = PluginQuery::all().with_module_name(name);
        match scope {
            Some(scope) => self.plugins(query.with_module_scope(scope)),
            None => self.plugins(query),
        }
    }

    /// Stream plugins packaged inside `scope`.
    fn plugins_by_module_scope(&self, scope: &str) -> PluginStream {
        self.plugins(PluginQuery::all().with_module_scope(scope))
    }

    /// Stream plugins packaged inside `scope` that provide `extension_point`.
    fn plugins_by_module_scope_and_extension_point(
        &self,
        scope: &str,
        extension_point: &ExtensionPointId,
    ) -> PluginStream {
        self.plugins(
            PluginQuery::all()
                .with_module_scope(scope)
                .with_extension_point(extension_point.clone()),
        )
    }
}

/// Add the leading `@` to a scope if the caller left it off.
#[must_use]
pub fn normalize_scope(scope: &str) -> String {
    if scope.starts_with('@') {
        scope.to_string()
    } else {
        format!("@{scope}")
    }
}

/// Load `specifier`, validate it and apply the extension point filter.
pub(crate) async fn evaluate_candidate(
    loader: &dyn ModuleLoader,
    specifier: &str,
    extension_point: Option<&ExtensionPointId>,
) -> Result<Plugin, DiscardReason> {
    let module = loader
        .load(specifier)
        .await
        .map_err(|e| DiscardReason::LoadFailed(e.to_string()))?;

    let validated = validate_plugin(&module, extension_point).into_result()?;
    match extension_point {
        Some(id) if !validated.matches_extension_point => {
            Err(DiscardReason::ExtensionPointNotProvided(id.clone()))
        },
        _ => Ok(validated.plugin),
    }
}

/// Log a dropped candidate.
pub(crate) fn log_discard(candidate: &str, reason: &DiscardReason) {
    debug!(candidate, reason = %reason, "Discarded plugin candidate");
}
