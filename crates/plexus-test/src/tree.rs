//! Throwaway `node_modules` trees backed by a [`StaticModuleLoader`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;

use plexus_plugins::{ModuleExport, NodeModulesRepository, Plugin, PluginManager, StaticModuleLoader};

use crate::fixtures::{FIXTURE_PACKAGES, plugin_a};

/// Entry file name written into every plugin package.
pub const ENTRY_FILE: &str = "index.js";

/// Builds a temporary `node_modules` directory and the loader that knows
/// its entry points.
///
/// Panics on filesystem errors; meant for tests only.
#[derive(Debug)]
pub struct NodeModulesBuilder {
    _dir: TempDir,
    root: PathBuf,
    loader: StaticModuleLoader,
}

impl Default for NodeModulesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeModulesBuilder {
    /// Create an empty `node_modules` directory in a fresh temp dir.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = dir.path().join("node_modules");
        fs::create_dir_all(&root).expect("create node_modules");
        Self {
            _dir: dir,
            root,
            loader: StaticModuleLoader::new(),
        }
    }

    /// Write a package with an arbitrary manifest and no loadable module.
    ///
    /// # Panics
    ///
    /// Panics on filesystem errors.
    #[must_use]
    pub fn with_package(self, relative: &str, manifest: &Value) -> Self {
        let dir = self.root.join(relative);
        fs::create_dir_all(&dir).expect("create package dir");
        fs::write(dir.join("package.json"), manifest.to_string()).expect("write package.json");
        self
    }

    /// Write an ES module package whose entry point exports `export`.
    #[must_use]
    pub fn with_export(mut self, relative: &str, export: ModuleExport) -> Self {
        let manifest = json!({
            "name": relative,
            "version": "1.0.0",
            "type": "module",
            "main": ENTRY_FILE,
        });
        self = self.with_package(relative, &manifest);
        let entry = self.root.join(relative).join(ENTRY_FILE);
        self.loader.insert(entry.to_string_lossy(), export);
        self
    }

    /// Write an ES module package exporting `plugin`.
    #[must_use]
    pub fn with_plugin(self, relative: &str, plugin: Plugin) -> Self {
        self.with_export(relative, ModuleExport::plugin(plugin))
    }

    /// Write every [`FIXTURE_PACKAGES`] entry as a copy of [`plugin_a`].
    #[must_use]
    pub fn with_fixture_tree(self) -> Self {
        FIXTURE_PACKAGES
            .iter()
            .fold(self, |tree, relative| tree.with_plugin(relative, plugin_a()))
    }

    /// The `node_modules` directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute directory of a package.
    #[must_use]
    pub fn package_dir(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// A clone of the loader holding every written entry point.
    #[must_use]
    pub fn loader(&self) -> StaticModuleLoader {
        self.loader.clone()
    }

    /// A repository scanning only this tree.
    #[must_use]
    pub fn repository(&self) -> NodeModulesRepository {
        NodeModulesRepository::with_search_paths(Arc::new(self.loader()), vec![self.root.clone()])
    }

    /// A manager discovering from this tree.
    #[must_use]
    pub fn manager(&self) -> PluginManager {
        PluginManager::new(Arc::new(self.repository()))
    }
}
