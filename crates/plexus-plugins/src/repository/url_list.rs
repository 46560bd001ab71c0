//! Discovery over a fixed list of module URLs.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use url::Url;

use super::{PluginQuery, PluginRepository, PluginStream, evaluate_candidate, log_discard};
use crate::error::{PluginError, PluginResult};
use crate::id::PluginId;
use crate::loader::ModuleLoader;

/// A module URL with its `[@scope/]name` already split out of the path.
///
/// `raw` is the string exactly as configured. It is the loader specifier and
/// the plugin id; the parsed form is only used to split the path.
#[derive(Debug, Clone)]
struct ModuleUrl {
    raw: String,
    scope: Option<String>,
    name: String,
}

impl ModuleUrl {
    fn parse(raw: &str) -> PluginResult<Self> {
        let url = Url::parse(raw).map_err(|e| PluginError::InvalidModuleUrl {
            url: raw.to_string(),
            message: e.to_string(),
        })?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let mut from_end = segments.iter().rev();
        let name = from_end.next().map(|s| (*s).to_string()).unwrap_or_default();
        let scope = from_end
            .next()
            .filter(|s| s.starts_with('@'))
            .map(|s| (*s).to_string());

        Ok(Self {
            raw: raw.to_string(),
            scope,
            name,
        })
    }
}

/// Repository over caller-supplied module URLs.
///
/// The last non-empty path segment of each URL is the module name; the
/// segment before it is the scope when it starts with `@`. So
/// `https://cdn.example.com/@acme/widgets` is `widgets` in scope `@acme`.
pub struct UrlPluginRepository {
    modules: Vec<ModuleUrl>,
    loader: Arc<dyn ModuleLoader>,
}

impl UrlPluginRepository {
    /// Create a repository over `urls`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidModuleUrl`] for the first URL that does
    /// not parse as an absolute URL. A bad URL is a configuration mistake,
    /// so it is reported up front rather than skipped during discovery.
    pub fn new<I, S>(urls: I, loader: Arc<dyn ModuleLoader>) -> PluginResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let modules = urls
            .into_iter()
            .map(|u| ModuleUrl::parse(u.as_ref()))
            .collect::<PluginResult<Vec<_>>>()?;
        Ok(Self { modules, loader })
    }

    /// Number of configured URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no URLs are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl std::fmt::Debug for UrlPluginRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let urls: Vec<&str> = self.modules.iter().map(|m| m.raw.as_str()).collect();
        f.debug_struct("UrlPluginRepository")
            .field("urls", &urls)
            .finish_non_exhaustive()
    }
}

impl PluginRepository for UrlPluginRepository {
    fn plugins(&self, query: PluginQuery) -> PluginStream {
        let candidates: Vec<ModuleUrl> = self
            .modules
            .iter()
            .filter(|m| query.matches_module(m.scope.as_deref(), &m.name))
            .cloned()
            .collect();
        let loader = Arc::clone(&self.loader);
        let extension_point = query.extension_point;

        stream::iter(candidates)
            .filter_map(move |module| {
                let loader = Arc::clone(&loader);
                let extension_point = extension_point.clone();
                async move {
                    let specifier = module.raw.as_str();
                    match evaluate_candidate(loader.as_ref(), specifier, extension_point.as_ref())
                        .await
                    {
                        Ok(plugin) => Some((PluginId::from_static(specifier), plugin)),
                        Err(reason) => {
                            log_discard(specifier, &reason);
                            None
                        },
                    }
                }
            })
            .boxed()
    }
}
