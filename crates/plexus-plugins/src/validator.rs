//! Structural validation of loaded modules.

use crate::id::ExtensionPointId;
use crate::plugin::{ExtensionDescriptor, Plugin};
use crate::candidate::{CandidateDescriptor, LoadedModule, ModuleExport};

/// Why a discovery candidate was dropped.
///
/// These never reach the caller of a discovery operation. The repository
/// logs them and moves on to the next candidate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscardReason {
    /// `package.json` is missing or unreadable.
    #[error("manifest unreadable: {0}")]
    ManifestUnreadable(String),

    /// `package.json` is not valid JSON of the expected shape.
    #[error("manifest invalid: {0}")]
    ManifestInvalid(String),

    /// The package does not declare `"type": "module"`.
    #[error("not an ES module package (type = {declared:?})")]
    NotEsModule {
        /// The declared `type`, if any.
        declared: Option<String>,
    },

    /// The package declares no `main` entry point.
    #[error("manifest declares no entry point")]
    MissingEntryPoint,

    /// The loader rejected the specifier.
    #[error("load failed: {0}")]
    LoadFailed(String),

    /// The module has no default export.
    #[error("module has no default export")]
    NoDefaultExport,

    /// The default export cannot be constructed.
    #[error("default export is not constructible")]
    NotConstructible,

    /// The constructor ran and failed.
    #[error("plugin constructor failed: {0}")]
    ConstructorFailed(String),

    /// The instance does not expose an extension descriptor list.
    #[error("extension descriptors are not an array")]
    DescriptorsNotArray,

    /// A descriptor is missing a required member.
    #[error("descriptor {index} has no {missing}")]
    MalformedDescriptor {
        /// Position in the descriptor list.
        index: usize,
        /// Name of the missing member.
        missing: &'static str,
    },

    /// The plugin is well-formed but implements none of the requested
    /// extension point.
    #[error("plugin does not provide extension point {0}")]
    ExtensionPointNotProvided(ExtensionPointId),
}

/// A plugin that passed structural validation.
#[derive(Debug, Clone)]
pub struct ValidatedPlugin {
    /// The typed plugin.
    pub plugin: Plugin,
    /// Whether any descriptor targets the requested extension point.
    /// Always `false` when no extension point was requested.
    pub matches_extension_point: bool,
}

/// Result of [`validate_plugin`].
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    /// The module is a well-formed plugin.
    Valid(ValidatedPlugin),
    /// The module is not a plugin.
    Invalid(DiscardReason),
}

impl ValidationOutcome {
    /// Whether the module is a well-formed plugin.
    #[must_use]
    pub fn is_valid_plugin(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Whether the plugin provides the requested extension point.
    #[must_use]
    pub fn is_valid_extension_point(&self) -> bool {
        matches!(
            self,
            Self::Valid(ValidatedPlugin {
                matches_extension_point: true,
                ..
            })
        )
    }

    /// Convert into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the [`DiscardReason`] for invalid modules.
    pub fn into_result(self) -> Result<ValidatedPlugin, DiscardReason> {
        match self {
            Self::Valid(v) => Ok(v),
            Self::Invalid(reason) => Err(reason),
        }
    }
}

/// Check whether `module` satisfies the plugin contract.
///
/// The default export must be constructible, the constructed instance must
/// expose a descriptor list, and every descriptor must carry an extension
/// point ID and a factory with a `create` operation. A single malformed
/// descriptor rejects the whole plugin.
///
/// If `extension_point_id` is given, the outcome also records whether any
/// descriptor targets it. Never panics on malformed input.
#[must_use]
pub fn validate_plugin(
    module: &LoadedModule,
    extension_point_id: Option<&ExtensionPointId>,
) -> ValidationOutcome {
    match inspect(module) {
        Ok(plugin) => {
            let matches_extension_point = extension_point_id.is_some_and(|id| plugin.provides(id));
            ValidationOutcome::Valid(ValidatedPlugin {
                plugin,
                matches_extension_point,
            })
        },
        Err(reason) => ValidationOutcome::Invalid(reason),
    }
}

fn inspect(module: &LoadedModule) -> Result<Plugin, DiscardReason> {
    let constructor = match &module.default_export {
        None => return Err(DiscardReason::NoDefaultExport),
        Some(ModuleExport::Value(_)) => return Err(DiscardReason::NotConstructible),
        Some(ModuleExport::Constructor(c)) => c,
    };

    let instance = constructor().map_err(DiscardReason::ConstructorFailed)?;
    let candidates = instance
        .extension_descriptors
        .ok_or(DiscardReason::DescriptorsNotArray)?;

    let extension_descriptors = candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| descriptor(index, candidate))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Plugin {
        extension_descriptors,
        plugin_data: instance.plugin_data,
    })
}

fn descriptor(
    index: usize,
    candidate: CandidateDescriptor,
) -> Result<ExtensionDescriptor, DiscardReason> {
    let extension_point_id = candidate
        .extension_point_id
        .ok_or(DiscardReason::MalformedDescriptor {
            index,
            missing: "extension point id",
        })?;
    let factory = candidate.factory.ok_or(DiscardReason::MalformedDescriptor {
        index,
        missing: "factory",
    })?;
    let create = factory.create.ok_or(DiscardReason::MalformedDescriptor {
        index,
        missing: "factory.create",
    })?;

    Ok(ExtensionDescriptor {
        extension_point_id,
        factory: create,
        extension_data: candidate.extension_data,
    })
}
