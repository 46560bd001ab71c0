//! Layered configuration merging with source tracking.

use std::collections::HashMap;
use std::fmt;

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Embedded `defaults.toml`.
    Defaults,
    /// `~/.plexus/config.toml`.
    User,
    /// `{workspace}/.plexus/config.toml`.
    Workspace,
    /// A `PLEXUS_*` environment variable.
    Environment,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Defaults => "defaults",
            Self::User => "user",
            Self::Workspace => "workspace",
            Self::Environment => "environment",
        })
    }
}

/// Dotted field path (e.g. `discovery.search_paths`) to the layer that set it.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// Deep-merge `overlay` into `base`, recording which layer set each leaf.
///
/// Tables merge per key. Scalars and arrays from the overlay replace the
/// base value.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join_path(prefix, key);
                match base_table.get_mut(key) {
                    Some(base_val) if overlay_val.is_table() => {
                        deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
                    },
                    Some(base_val) => {
                        *base_val = overlay_val.clone();
                        sources.insert(path, layer.clone());
                    },
                    None => {
                        base_table.insert(key.clone(), overlay_val.clone());
                        record_leaves(overlay_val, &path, layer, sources);
                    },
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            sources.insert(prefix.to_owned(), layer.clone());
        },
    }
}

/// Record every leaf under `val` as coming from `layer`.
pub fn record_leaves(val: &toml::Value, prefix: &str, layer: &ConfigLayer, sources: &mut FieldSources) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join_path(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer.clone());
    }
}

/// Set a dotted `path` in `root`, creating intermediate tables.
pub(crate) fn set_path(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut current = root;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        if parts.peek().is_none() {
            table.insert(part.to_owned(), value);
            return;
        }
        current = table
            .entry(part.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_tables_merge_and_arrays_replace() {
        let mut base = parse(
            r#"
            [discovery]
            search_paths = ["/a", "/b"]
            include_global_packages = true
        "#,
        );
        let overlay = parse(
            r#"
            [discovery]
            search_paths = ["/c"]
        "#,
        );

        let mut sources = FieldSources::new();
        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::User, &mut sources);

        let discovery = base.get("discovery").unwrap();
        assert_eq!(
            discovery.get("search_paths").unwrap().as_array().unwrap().len(),
            1
        );
        assert_eq!(
            discovery.get("include_global_packages").unwrap().as_bool(),
            Some(true)
        );
        assert_eq!(
            sources.get("discovery.search_paths"),
            Some(&ConfigLayer::User)
        );
        assert!(!sources.contains_key("discovery.include_global_packages"));
    }

    #[test]
    fn test_new_tables_record_all_leaves() {
        let mut base = parse("[discovery]\n");
        let overlay = parse(
            r#"
            [logging]
            level = "debug"
            format = "json"
        "#,
        );

        let mut sources = FieldSources::new();
        deep_merge_tracking(
            &mut base,
            &overlay,
            "",
            &ConfigLayer::Workspace,
            &mut sources,
        );
        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::Workspace));
        assert_eq!(sources.get("logging.format"), Some(&ConfigLayer::Workspace));
    }

    #[test]
    fn test_set_path_creates_tables() {
        let mut root = parse("");
        set_path(&mut root, "logging.level", toml::Value::String("warn".into()));
        assert_eq!(
            root.get("logging").and_then(|l| l.get("level")).and_then(|v| v.as_str()),
            Some("warn")
        );
    }
}
