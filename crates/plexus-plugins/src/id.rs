//! Identifier types for plugins, extension points and extensions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PluginError, PluginResult};

/// Identifier of a plugin.
///
/// Discovered plugins are keyed by where they were found: the candidate
/// directory for `node_modules` discovery, the module URL for URL discovery.
/// Manually registered plugins use whatever the host picks. The only
/// structural requirement is that the ID is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PluginId(String);

impl<'de> Deserialize<'de> for PluginId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl PluginId {
    /// Create a new `PluginId`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidId`] if the ID is empty or only whitespace.
    pub fn new(id: impl Into<String>) -> PluginResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PluginError::InvalidId("plugin id must not be empty".into()));
        }
        Ok(Self(id))
    }

    /// Create a `PluginId` without validation (for tests and internal use).
    #[must_use]
    pub fn from_static(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PluginId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a capability contract the host knows how to consume.
///
/// Compared by value. Hosts usually keep these as constants:
///
/// ```
/// use plexus_plugins::ExtensionPointId;
///
/// const FORMATTER: &str = "formatter";
/// let id = ExtensionPointId::from_static(FORMATTER);
/// assert_eq!(id.as_str(), "formatter");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExtensionPointId(String);

impl<'de> Deserialize<'de> for ExtensionPointId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl ExtensionPointId {
    /// Create a new `ExtensionPointId`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidId`] if the ID is empty or only whitespace.
    pub fn new(id: impl Into<String>) -> PluginResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PluginError::InvalidId(
                "extension point id must not be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Create an `ExtensionPointId` without validation.
    #[must_use]
    pub fn from_static(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtensionPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExtensionPointId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unchecked conversion, like [`ExtensionPointId::from_static`].
///
/// Empty ids are rejected when registered with an
/// [`ExtensionPointRegistry`](crate::ExtensionPointRegistry); use
/// [`ExtensionPointId::new`] to validate up front.
impl From<&str> for ExtensionPointId {
    fn from(id: &str) -> Self {
        Self::from_static(id)
    }
}

/// Opaque token addressing one registered extension.
///
/// Minted by the manager at registration time. The value carries no
/// information about the plugin or descriptor it refers to; callers must
/// treat it as opaque and only hand it back to the manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionHandle(String);

impl ExtensionHandle {
    /// Mint a fresh random handle.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing token, e.g. one received back from a host over IPC.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtensionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
