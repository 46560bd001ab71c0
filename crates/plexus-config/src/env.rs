//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only fill fields that no
//! config file set.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, set_path};

/// How an environment variable's text becomes a TOML value.
#[derive(Debug, Clone, Copy)]
enum EnvKind {
    /// Plain string.
    String,
    /// Non-negative integer.
    Integer,
    /// Boolean (`true`/`false`/`1`/`0`).
    Bool,
    /// OS path list (`:` on Unix, `;` on Windows).
    PathList,
    /// Comma-separated list.
    CommaList,
}

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: EnvKind,
}

/// All supported `PLEXUS_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "PLEXUS_SEARCH_PATHS",
        field_path: "discovery.search_paths",
        kind: EnvKind::PathList,
    },
    EnvMapping {
        var_name: "PLEXUS_INCLUDE_GLOBAL_PACKAGES",
        field_path: "discovery.include_global_packages",
        kind: EnvKind::Bool,
    },
    EnvMapping {
        var_name: "PLEXUS_MODULE_URLS",
        field_path: "discovery.module_urls",
        kind: EnvKind::CommaList,
    },
    EnvMapping {
        var_name: "PLEXUS_MAX_CONCURRENT_READS",
        field_path: "discovery.max_concurrent_reads",
        kind: EnvKind::Integer,
    },
    EnvMapping {
        var_name: "PLEXUS_LOG_LEVEL",
        field_path: "logging.level",
        kind: EnvKind::String,
    },
    EnvMapping {
        var_name: "PLEXUS_LOG_FORMAT",
        field_path: "logging.format",
        kind: EnvKind::String,
    },
];

/// Snapshot the `PLEXUS_*` environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("PLEXUS_"))
        .collect()
}

/// Apply environment variable fallbacks to fields not set by a file layer.
///
/// Returns the number of env vars applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a variable cannot be converted to
/// its field's type.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }

        if let Some(raw) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            let value = convert(mapping, raw)?;
            set_path(merged, mapping.field_path, value);
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    Ok(count)
}

fn convert(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    let err = |message: String| ConfigError::EnvError {
        var_name: mapping.var_name.to_owned(),
        message,
    };

    Ok(match mapping.kind {
        EnvKind::String => toml::Value::String(raw.to_owned()),
        EnvKind::Integer => {
            let n: i64 = raw
                .trim()
                .parse()
                .map_err(|e| err(format!("expected an integer: {e}")))?;
            toml::Value::Integer(n)
        },
        EnvKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => toml::Value::Boolean(true),
            "false" | "0" | "no" => toml::Value::Boolean(false),
            other => return Err(err(format!("expected a boolean, got '{other}'"))),
        },
        EnvKind::PathList => toml::Value::Array(
            std::env::split_paths(raw)
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p: PathBuf| toml::Value::String(p.to_string_lossy().into_owned()))
                .collect(),
        ),
        EnvKind::CommaList => toml::Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| toml::Value::String(s.to_owned()))
                .collect(),
        ),
    })
}
