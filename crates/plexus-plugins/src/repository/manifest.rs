//! `package.json` handling for `node_modules` discovery.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::validator::DiscardReason;

/// Manifest file name inside a package directory.
pub const MANIFEST_FILE: &str = "package.json";

/// The `type` a package must declare to be considered.
pub const ES_MODULE_TYPE: &str = "module";

/// The subset of `package.json` discovery cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    /// Package name, informational only.
    #[serde(default)]
    pub name: Option<String>,
    /// Package version, informational only.
    #[serde(default)]
    pub version: Option<String>,
    /// Module system (`"module"` or `"commonjs"`).
    #[serde(default, rename = "type")]
    pub module_type: Option<String>,
    /// Entry point relative to the package directory.
    #[serde(default)]
    pub main: Option<String>,
}

impl PackageManifest {
    /// Parse manifest text.
    pub(crate) fn parse(text: &str) -> Result<Self, DiscardReason> {
        serde_json::from_str(text).map_err(|e| DiscardReason::ManifestInvalid(e.to_string()))
    }

    /// Read and parse `<package_dir>/package.json`.
    pub(crate) async fn read(package_dir: &Path) -> Result<Self, DiscardReason> {
        let path = package_dir.join(MANIFEST_FILE);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DiscardReason::ManifestUnreadable(format!("{}: {e}", path.display())))?;
        Self::parse(&text)
    }

    /// Resolve the loader specifier for this package.
    ///
    /// Fails unless the package is an ES module with a `main` entry.
    pub(crate) fn entry_point(&self, package_dir: &Path) -> Result<PathBuf, DiscardReason> {
        if self.module_type.as_deref() != Some(ES_MODULE_TYPE) {
            return Err(DiscardReason::NotEsModule {
                declared: self.module_type.clone(),
            });
        }
        let main = self
            .main
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or(DiscardReason::MissingEntryPoint)?;
        Ok(package_dir.join(relative_entry(main)))
    }
}

/// Keep only normal components so `main` always resolves under the
/// package directory. Root, prefix, `.` and `..` are dropped.
fn relative_entry(main: &str) -> PathBuf {
    Path::new(main)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}
