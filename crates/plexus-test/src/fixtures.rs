//! Fixture plugins and discovery inputs.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use plexus_plugins::{
    CandidateDescriptor, CandidatePlugin, ExtensionDescriptor, ExtensionFactory,
    ExtensionInstance, ModuleExport, Plugin, PluginResult,
};

/// First fixture extension point.
pub const EXTENSION_POINT_A: &str = "extension-point-a";

/// Second fixture extension point.
pub const EXTENSION_POINT_B: &str = "extension-point-b";

/// Package paths of the fixture `node_modules` tree, relative to its root.
///
/// Four packages per scope plus two unscoped ones. The name `bar` appears
/// three times and `@fooscope/bar` once.
pub const FIXTURE_PACKAGES: [&str; 10] = [
    "@fooscope/foofoo",
    "@fooscope/foobar",
    "@fooscope/foo",
    "@fooscope/bar",
    "@barscope/barfoo",
    "@barscope/barbar",
    "@barscope/foo",
    "@barscope/bar",
    "foo",
    "bar",
];

/// Module URLs with the same shape as [`FIXTURE_PACKAGES`].
pub const FIXTURE_MODULE_URLS: [&str; 10] = [
    "https://foo.com/@fooscope/foobar",
    "https://foo.com/@fooscope/foofoo",
    "https://foo.com/@fooscope/foo",
    "https://foo.com/@fooscope/bar",
    "https://foo.com/@barscope/barbar",
    "https://foo.com/@barscope/barfoo",
    "https://foo.com/@barscope/foo",
    "https://foo.com/@barscope/bar",
    "https://foo.com/foo",
    "https://foo.com/bar",
];

/// Extension produced for [`EXTENSION_POINT_A`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeter;

impl Greeter {
    /// The greeting.
    #[must_use]
    pub fn say_hello(&self) -> &'static str {
        "hello"
    }
}

/// Extension produced for [`EXTENSION_POINT_B`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Farewell;

impl Farewell {
    /// The farewell.
    #[must_use]
    pub fn say_goodbye(&self) -> &'static str {
        "goodbye"
    }
}

/// Factory for [`Greeter`].
#[derive(Debug, Default)]
pub struct GreeterFactory;

#[async_trait]
impl ExtensionFactory for GreeterFactory {
    async fn create(&self, _host_data: Option<Value>) -> PluginResult<ExtensionInstance> {
        Ok(Box::new(Greeter))
    }
}

/// Factory for [`Farewell`].
#[derive(Debug, Default)]
pub struct FarewellFactory;

#[async_trait]
impl ExtensionFactory for FarewellFactory {
    async fn create(&self, _host_data: Option<Value>) -> PluginResult<ExtensionInstance> {
        Ok(Box::new(Farewell))
    }
}

/// Descriptor for [`EXTENSION_POINT_A`] carrying extension data `"foo"`.
#[must_use]
pub fn descriptor_a() -> ExtensionDescriptor {
    ExtensionDescriptor::new(EXTENSION_POINT_A, Arc::new(GreeterFactory))
        .with_extension_data(json!("foo"))
}

/// Descriptor for [`EXTENSION_POINT_B`] without extension data.
#[must_use]
pub fn descriptor_b() -> ExtensionDescriptor {
    ExtensionDescriptor::new(EXTENSION_POINT_B, Arc::new(FarewellFactory))
}

/// One extension for point A, plugin data `"bar"`.
#[must_use]
pub fn plugin_a() -> Plugin {
    Plugin::new(vec![descriptor_a()]).with_plugin_data(json!("bar"))
}

/// Extensions for points A and B, no plugin data.
#[must_use]
pub fn plugin_b() -> Plugin {
    Plugin::new(vec![descriptor_a(), descriptor_b()])
}

/// An export whose second descriptor has no factory.
///
/// Validation rejects the whole plugin, including its well-formed first
/// descriptor.
#[must_use]
pub fn malformed_export() -> ModuleExport {
    ModuleExport::constructor(|| {
        Ok(CandidatePlugin {
            extension_descriptors: Some(vec![
                CandidateDescriptor::from(descriptor_a()),
                CandidateDescriptor {
                    extension_point_id: Some(EXTENSION_POINT_B.into()),
                    factory: None,
                    extension_data: None,
                },
            ]),
            plugin_data: None,
        })
    })
}

/// An export that is a plain value rather than a constructor.
#[must_use]
pub fn value_export() -> ModuleExport {
    ModuleExport::Value(json!({ "extensionDescriptors": [] }))
}

/// An export whose constructor fails.
#[must_use]
pub fn failing_export() -> ModuleExport {
    ModuleExport::constructor(|| Err("constructor threw".to_owned()))
}
