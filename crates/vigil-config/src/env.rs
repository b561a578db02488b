//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only apply to fields that no
//! config file set. Values from the embedded defaults do not block them.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// All supported `VIGIL_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "VIGIL_DEFAULT_MODE",
        field_path: "confirmation.default_mode",
    },
    EnvMapping {
        var_name: "VIGIL_CONFIRMATION_TIMEOUT_SECONDS",
        field_path: "confirmation.confirmation_timeout_seconds",
    },
    EnvMapping {
        var_name: "VIGIL_ALLOW_BULK_ACTIONS",
        field_path: "confirmation.allow_bulk_actions",
    },
    EnvMapping {
        var_name: "VIGIL_REMEMBER_PREFERENCES",
        field_path: "confirmation.remember_preferences",
    },
    EnvMapping {
        var_name: "VIGIL_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "VIGIL_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Apply environment variable fallbacks to fields that were **not** set by
/// any config file layer.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );

            set_field_from_string(merged, mapping.field_path, val);
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Set a field in the TOML tree from a string value, coercing known numeric
/// and boolean fields.
fn set_field_from_string(root: &mut toml::Value, path: &str, val: &str) {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };

    let toml_val = coerce_to_toml_value(path, val);

    let mut current = root;
    for segment in parents {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry((*segment).to_owned())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    if let Some(table) = current.as_table_mut() {
        table.insert((*leaf).to_owned(), toml_val);
    }
}

/// Coerce a string env var value to the TOML type of the target field.
fn coerce_to_toml_value(path: &str, val: &str) -> toml::Value {
    if path == "confirmation.confirmation_timeout_seconds"
        && let Ok(i) = val.trim().parse::<i64>()
    {
        return toml::Value::Integer(i);
    }

    if matches!(
        path,
        "confirmation.allow_bulk_actions" | "confirmation.remember_preferences"
    ) && let Ok(b) = val.trim().parse::<bool>()
    {
        return toml::Value::Boolean(b);
    }

    toml::Value::String(val.to_owned())
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_apply_env_fallbacks() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let env = make_env(&[
            ("VIGIL_DEFAULT_MODE", "preventive"),
            ("VIGIL_CONFIRMATION_TIMEOUT_SECONDS", "45"),
            ("VIGIL_ALLOW_BULK_ACTIONS", "false"),
        ]);

        let count = apply_env_fallbacks(&mut merged, &mut sources, &env);

        assert_eq!(count, 3);
        assert_eq!(
            merged["confirmation"]["default_mode"].as_str(),
            Some("preventive")
        );
        assert_eq!(
            merged["confirmation"]["confirmation_timeout_seconds"].as_integer(),
            Some(45)
        );
        assert_eq!(
            merged["confirmation"]["allow_bulk_actions"].as_bool(),
            Some(false)
        );
        assert_eq!(
            sources.get("confirmation.default_mode"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_env_fallback_skips_file_values() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".to_owned(), ConfigLayer::User);
        let env = make_env(&[("VIGIL_LOG_LEVEL", "trace")]);

        let count = apply_env_fallbacks(&mut merged, &mut sources, &env);

        assert_eq!(count, 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_env_fallback_overrides_defaults() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"info\"").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".to_owned(), ConfigLayer::Defaults);
        let env = make_env(&[("VIGIL_LOG_LEVEL", "debug")]);

        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 1);
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
    }

    #[test]
    fn test_coerce_unparseable_integer_stays_string() {
        let val = coerce_to_toml_value("confirmation.confirmation_timeout_seconds", "soon");
        assert_eq!(val.as_str(), Some("soon"));
    }
}
