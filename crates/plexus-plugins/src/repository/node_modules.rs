//! Discovery over npm-style `node_modules` trees.
//!
//! The walk is two levels deep at most: `<root>/<name>` for unscoped
//! packages and `<root>/@<scope>/<name>` for scoped ones. Every directory
//! read runs on its own task and pushes surviving package directories into
//! a channel, so candidates come out in completion order, not lexical order.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, warn};

use super::manifest::PackageManifest;
use super::{PluginQuery, PluginRepository, PluginStream, evaluate_candidate, log_discard};
use crate::id::{ExtensionPointId, PluginId};
use crate::loader::ModuleLoader;
use crate::plugin::Plugin;

/// Name of the package folder searched under the working directory.
pub const NODE_MODULES_DIR: &str = "node_modules";

/// Repository scanning one or more `node_modules` directories.
pub struct NodeModulesRepository {
    search_paths: Vec<PathBuf>,
    loader: Arc<dyn ModuleLoader>,
    max_concurrent_reads: Option<usize>,
}

impl NodeModulesRepository {
    /// Scan the default locations (see [`default_search_paths`]).
    #[must_use]
    pub fn new(loader: Arc<dyn ModuleLoader>) -> Self {
        Self::with_search_paths(loader, default_search_paths(true))
    }

    /// Scan exactly `search_paths`.
    #[must_use]
    pub fn with_search_paths(loader: Arc<dyn ModuleLoader>, search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            loader,
            max_concurrent_reads: None,
        }
    }

    /// Cap the number of directory reads in flight at once.
    ///
    /// Unbounded by default. A limit of zero is treated as one.
    #[must_use]
    pub fn with_max_concurrent_reads(mut self, limit: usize) -> Self {
        self.max_concurrent_reads = Some(limit.max(1));
        self
    }

    /// The roots this repository scans.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl std::fmt::Debug for NodeModulesRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeModulesRepository")
            .field("search_paths", &self.search_paths)
            .field("max_concurrent_reads", &self.max_concurrent_reads)
            .finish_non_exhaustive()
    }
}

impl PluginRepository for NodeModulesRepository {
    fn plugins(&self, query: PluginQuery) -> PluginStream {
        let roots = self.search_paths.clone();
        let loader = Arc::clone(&self.loader);
        let limit = self.max_concurrent_reads;

        stream::once(async move {
            let filter = Arc::new(WalkFilter {
                scope: query.module_scope,
                name: query.module_name,
            });
            let extension_point = query.extension_point;

            walk(roots, filter, limit).filter_map(move |package_dir| {
                let loader = Arc::clone(&loader);
                let extension_point = extension_point.clone();
                async move {
                    evaluate_package(&package_dir, loader.as_ref(), extension_point.as_ref()).await
                }
            })
        })
        .flatten()
        .boxed()
    }
}

/// Default roots: `<cwd>/node_modules`, then the global package folder when
/// `include_global` is set and a Node installation can be located.
#[must_use]
pub fn default_search_paths(include_global: bool) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    match std::env::current_dir() {
        Ok(cwd) => paths.push(cwd.join(NODE_MODULES_DIR)),
        Err(e) => warn!(error = %e, "Cannot determine working directory"),
    }
    if include_global
        && let Some(global) = global_node_modules()
        && !paths.contains(&global)
    {
        paths.push(global);
    }
    paths
}

/// `$NPM_CONFIG_PREFIX` if set, else derived from the `node` binary on `PATH`.
fn global_node_modules() -> Option<PathBuf> {
    let prefix = std::env::var_os("NPM_CONFIG_PREFIX")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(node_prefix)?;
    Some(if cfg!(windows) {
        prefix.join(NODE_MODULES_DIR)
    } else {
        prefix.join("lib").join(NODE_MODULES_DIR)
    })
}

fn node_prefix() -> Option<PathBuf> {
    let node = which::which("node").ok()?;
    let node = node.canonicalize().unwrap_or(node);
    let bin_dir = node.parent()?;
    if cfg!(windows) {
        Some(bin_dir.to_path_buf())
    } else {
        bin_dir.parent().map(Path::to_path_buf)
    }
}

// ---------------------------------------------------------------------------
// Walk
// ---------------------------------------------------------------------------

struct WalkFilter {
    scope: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Root,
    Scope,
}

/// Start scanning every root and return the candidate stream.
fn walk(
    roots: Vec<PathBuf>,
    filter: Arc<WalkFilter>,
    limit: Option<usize>,
) -> impl Stream<Item = PathBuf> + Send + 'static {
    let (tx, rx) = mpsc::unbounded_channel();
    let permits = limit.map(|n| Arc::new(Semaphore::new(n)));

    for root in roots {
        tokio::spawn(scan_directory(
            root,
            Level::Root,
            Arc::clone(&filter),
            permits.clone(),
            tx.clone(),
        ));
    }

    // The stream ends once the last scan task drops its sender.
    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|path| (path, rx)) })
}

fn scan_directory(
    dir: PathBuf,
    level: Level,
    filter: Arc<WalkFilter>,
    permits: Option<Arc<Semaphore>>,
    tx: mpsc::UnboundedSender<PathBuf>,
) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        let entries = match list_directories(&dir, permits.as_deref()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %dir.display(), "Plugin search path does not exist");
                return;
            },
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Failed to read plugin directory");
                return;
            },
        };

        for (name, path) in entries {
            if name.starts_with('@') {
                let wanted = filter.scope.as_deref().is_none_or(|scope| scope == name);
                if level == Level::Root && wanted {
                    tokio::spawn(scan_directory(
                        path,
                        Level::Scope,
                        Arc::clone(&filter),
                        permits.clone(),
                        tx.clone(),
                    ));
                }
                continue;
            }

            // Unscoped packages never satisfy a scope filter.
            if level == Level::Root && filter.scope.is_some() {
                continue;
            }
            if filter.name.as_deref().is_some_and(|wanted| wanted != name) {
                continue;
            }
            if tx.send(path).is_err() {
                return;
            }
        }
    })
}

/// Names and paths of the subdirectories of `dir`, following symlinks.
async fn list_directories(
    dir: &Path,
    permits: Option<&Semaphore>,
) -> io::Result<Vec<(String, PathBuf)>> {
    let _permit = match permits {
        Some(semaphore) => Some(semaphore.acquire().await.map_err(io::Error::other)?),
        None => None,
    };

    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut dirs = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        let is_dir = match entry.file_type().await {
            Ok(ft) if ft.is_symlink() => tokio::fs::metadata(&path)
                .await
                .is_ok_and(|m| m.is_dir()),
            Ok(ft) => ft.is_dir(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping unreadable entry");
                false
            },
        };
        if is_dir {
            dirs.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }
    Ok(dirs)
}

// ---------------------------------------------------------------------------
// Candidate evaluation
// ---------------------------------------------------------------------------

async fn evaluate_package(
    package_dir: &Path,
    loader: &dyn ModuleLoader,
    extension_point: Option<&ExtensionPointId>,
) -> Option<(PluginId, Plugin)> {
    let candidate = package_dir.display().to_string();

    let result = async {
        let manifest = PackageManifest::read(package_dir).await?;
        let entry_point = manifest.entry_point(package_dir)?;
        evaluate_candidate(loader, &entry_point.to_string_lossy(), extension_point).await
    }
    .await;

    match result {
        Ok(plugin) => Some((PluginId::from_static(&candidate), plugin)),
        Err(reason) => {
            log_discard(&candidate, &reason);
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;

    use super::*;
    use crate::loader::StaticModuleLoader;
    use crate::plugin::ExtensionDescriptor;
    use crate::candidate::ModuleExport;
    use crate::test_support::UnitFactory;

    struct Tree {
        dir: tempfile::TempDir,
        root: PathBuf,
        loader: StaticModuleLoader,
    }

    impl Tree {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().join(NODE_MODULES_DIR);
            fs::create_dir_all(&root).unwrap();
            Self {
                dir,
                root,
                loader: StaticModuleLoader::new(),
            }
        }

        fn package(&mut self, relative: &str, manifest: &serde_json::Value) -> PathBuf {
            let dir = self.root.join(relative);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("package.json"), manifest.to_string()).unwrap();
            dir
        }

        fn plugin(&mut self, relative: &str, ep: &str) -> PathBuf {
            let dir = self.package(relative, &json!({"type": "module", "main": "index.js"}));
            let plugin = Plugin::new(vec![ExtensionDescriptor::new(ep, Arc::new(UnitFactory))]);
            self.loader.insert(
                dir.join("index.js").to_string_lossy(),
                ModuleExport::plugin(plugin),
            );
            dir
        }

        fn repository(&self) -> NodeModulesRepository {
            NodeModulesRepository::with_search_paths(
                Arc::new(self.loader.clone()),
                vec![self.root.clone()],
            )
        }
    }

    async fn ids(stream: PluginStream) -> Vec<String> {
        let mut ids: Vec<String> = stream.map(|(id, _)| id.to_string()).collect().await;
        ids.sort();
        ids
    }

    fn standard_tree() -> Tree {
        let mut tree = Tree::new();
        tree.plugin("@fooscope/foo", "a");
        tree.plugin("@fooscope/bar", "b");
        tree.plugin("@barscope/bar", "a");
        tree.plugin("foo", "a");
        tree.plugin("bar", "b");
        tree
    }

    #[tokio::test]
    async fn test_all_plugins() {
        let tree = standard_tree();
        let found = ids(tree.repository().all_plugins()).await;
        assert_eq!(found.len(), 5);
    }

    #[tokio::test]
    async fn test_scope_filter() {
        let tree = standard_tree();
        let found = ids(tree.repository().plugins_by_module_scope("@fooscope")).await;
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|id| id.contains("@fooscope")));

        let unprefixed = ids(tree.repository().plugins_by_module_scope("fooscope")).await;
        assert_eq!(found, unprefixed);
    }

    #[tokio::test]
    async fn test_name_filter_is_exact_and_crosses_scopes() {
        let mut tree = standard_tree();
        tree.plugin("barista", "a");

        let found = ids(tree.repository().plugins_by_module_name("bar", None)).await;
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|id| id.ends_with("bar")));
    }

    #[tokio::test]
    async fn test_scope_and_name_filter() {
        let tree = standard_tree();
        let found = ids(tree.repository().plugins_by_module_name("bar", Some("@barscope"))).await;
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("bar"));
        assert!(found[0].contains("@barscope"));
    }

    #[tokio::test]
    async fn test_extension_point_filter() {
        let tree = standard_tree();
        let found = ids(tree.repository().plugins_by_extension_point(&"a".into())).await;
        assert_eq!(found.len(), 3);

        let scoped = ids(
            tree.repository()
                .plugins_by_module_scope_and_extension_point("@fooscope", &"a".into()),
        )
        .await;
        assert_eq!(scoped.len(), 1);
    }

    #[tokio::test]
    async fn test_non_plugins_are_discarded() {
        let mut tree = standard_tree();
        tree.package("cjs", &json!({"type": "commonjs", "main": "index.js"}));
        tree.package("untyped", &json!({"main": "index.js"}));
        tree.package("nomain", &json!({"type": "module"}));
        tree.package("unloadable", &json!({"type": "module", "main": "index.js"}));
        tree.package("garbage", &json!("not an object"));
        fs::create_dir_all(tree.root.join("nomanifest")).unwrap();
        fs::write(tree.root.join("README.md"), "not a directory").unwrap();

        let found = ids(tree.repository().all_plugins()).await;
        assert_eq!(found.len(), 5);
    }

    #[tokio::test]
    async fn test_nested_scopes_are_not_recursed() {
        let mut tree = standard_tree();
        tree.plugin("@fooscope/@inner/deep", "a");

        let found = ids(tree.repository().all_plugins()).await;
        assert_eq!(found.len(), 5);
        assert!(!found.iter().any(|id| id.contains("@inner")));
    }

    #[tokio::test]
    async fn test_missing_roots_yield_nothing() {
        let tree = standard_tree();
        let repo = NodeModulesRepository::with_search_paths(
            Arc::new(tree.loader.clone()),
            vec![tree.root.join("does-not-exist"), tree.root.clone()],
        );
        let found = ids(repo.all_plugins()).await;
        assert_eq!(found.len(), 5);
    }

    #[tokio::test]
    async fn test_populated_roots_merge_into_one_stream() {
        let mut tree = standard_tree();
        let first = tree.root.clone();
        let second = tree.dir.path().join("vendor").join(NODE_MODULES_DIR);
        fs::create_dir_all(&second).unwrap();
        tree.root = second.clone();
        tree.plugin("@fooscope/extra", "a");
        tree.plugin("baz", "b");

        let repo = NodeModulesRepository::with_search_paths(
            Arc::new(tree.loader.clone()),
            vec![first.clone(), second.clone()],
        );
        let found = ids(repo.all_plugins()).await;
        assert_eq!(found.len(), 7);
        let first = first.to_string_lossy().into_owned();
        let second = second.to_string_lossy().into_owned();
        assert_eq!(found.iter().filter(|id| id.starts_with(&first)).count(), 5);
        assert_eq!(found.iter().filter(|id| id.starts_with(&second)).count(), 2);

        let scoped = ids(repo.plugins_by_module_scope("@fooscope")).await;
        assert_eq!(scoped.len(), 3);
    }

    #[tokio::test]
    async fn test_bounded_reads_find_the_same_plugins() {
        let tree = standard_tree();
        let unbounded = ids(tree.repository().all_plugins()).await;
        let bounded = ids(tree.repository().with_max_concurrent_reads(1).all_plugins()).await;
        assert_eq!(unbounded, bounded);
    }

    #[tokio::test]
    async fn test_restartable() {
        let tree = standard_tree();
        let repo = tree.repository();
        let first = ids(repo.all_plugins()).await;
        let second = ids(repo.all_plugins()).await;
        assert_eq!(first, second);
    }

    #[test]
    fn test_default_search_paths_start_with_cwd() {
        let paths = default_search_paths(false);
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(paths, vec![cwd.join(NODE_MODULES_DIR)]);
    }
}
