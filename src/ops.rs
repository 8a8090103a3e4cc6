//! Settings operations: key lookup, listing, and result types.
//!
//! Provides the logic behind `config list`, `config show`, `config get`, and
//! the `ConfigResult` enum that callers use to display results.

use std::fmt;

use crate::dict::ConfigDict;
use crate::engine::RuledContainer;
use crate::error::ConfigError;

/// Result of a settings operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// The full serialized settings text.
    Text(String),
    /// A key's value and its rule description.
    KeyValue {
        key: String,
        value: String,
        doc: Vec<String>,
    },
    /// Confirmation that a value was checked, stored and saved.
    ValueSet { key: String, value: String },
    /// Every scalar setting as flattened dotted key-value pairs.
    Listing { entries: Vec<(String, String)> },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::Text(t) => write!(f, "{t}"),
            ConfigResult::KeyValue { key, value, doc } => {
                for line in doc {
                    writeln!(f, "# {line}")?;
                }
                write!(f, "{key} = {value}")
            }
            ConfigResult::ValueSet { key, value } => write!(f, "Set {key} = {value}"),
            ConfigResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
        }
    }
}

/// Get a value by dotted key, with its rule description.
pub fn get_value(root: &ConfigDict, key: &str) -> Result<ConfigResult, ConfigError> {
    let value = root.get_path(key)?.to_string();
    let doc = lookup_doc(root, key);
    Ok(ConfigResult::KeyValue {
        key: key.into(),
        value,
        doc,
    })
}

/// List every scalar under `root` as dotted key-value pairs. Declared keys
/// with neither a value nor a default show as `<not set>`.
pub fn list_values(root: &dyn RuledContainer) -> ConfigResult {
    let mut entries = Vec::new();
    collect_leaves(root, "", &mut entries);
    ConfigResult::Listing { entries }
}

fn collect_leaves(container: &dyn RuledContainer, prefix: &str, out: &mut Vec<(String, String)>) {
    for key in container.emit_keys() {
        let dotted = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match container.get(&key) {
            Some(value) => match value.as_container() {
                Some(child) => collect_leaves(child, &dotted, out),
                None => out.push((dotted, value.to_string())),
            },
            None => out.push((dotted, "<not set>".to_string())),
        }
    }
}

fn lookup_doc(root: &ConfigDict, dotted_key: &str) -> Vec<String> {
    match root.rule_for_path(dotted_key) {
        Ok(rule) => rule.description.lines().map(str::to_string).collect(),
        Err(_) => vec![],
    }
}
