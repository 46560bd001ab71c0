//! Plexus Test - Shared test utilities for plugin discovery.
//!
//! Fixture plugins, mock factories and loaders, and a builder for
//! throwaway `node_modules` trees.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! plexus-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use plexus_test::{NodeModulesBuilder, plugin_a};
//!
//! #[tokio::test]
//! async fn discovers_fixture_tree() {
//!     let tree = NodeModulesBuilder::new().with_fixture_tree();
//!     let mut manager = tree.manager();
//!     manager.register_extension_point(plexus_test::EXTENSION_POINT_A.into()).unwrap();
//!     assert_eq!(manager.register_all_plugins().await.unwrap(), 10);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;
pub mod tree;

pub use fixtures::*;
pub use mocks::*;
pub use tree::*;

/// Install a test-friendly subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
