//! Plexus Telemetry - Logging setup for plugin hosts.
//!
//! Discovery and registration emit `tracing` events. This crate installs a
//! subscriber for them with a chosen level, format and target.
//!
//! # Example
//!
//! ```rust,no_run
//! use plexus_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), plexus_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("plexus_plugins=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("plugin host starting");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging,
};
