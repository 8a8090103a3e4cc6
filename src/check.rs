//! Primitive value checkers and the type-tag table that names them.
//!
//! A checker takes a raw input value and either returns its canonical typed
//! form or a human-readable reason for rejecting it. The rule engine wraps
//! rejections into [`ConfigError::InvalidValue`](crate::ConfigError) with the
//! full path of the slot being written.

use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;

use crate::b36::b36_to_int;
use crate::value::Value;

/// A primitive coercion, selected by a type tag in a rule definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Bool,
    Int,
    Float,
    Str,
    /// An existing file or directory, made absolute.
    Path,
    /// An existing regular file, made absolute.
    File,
    /// An existing directory, made absolute.
    Dir,
    /// A path whose parent directory exists, made absolute.
    NewPath,
    /// A DNS-safe host name, lowercased.
    Hostname,
    /// A URL-safe slug, kept as written.
    Slug,
    /// A base-36 integer, kept as a lowercase string.
    B36,
}

impl Check {
    /// Look up a type tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Check> {
        let check = match tag {
            "bool" => Check::Bool,
            "int" | "long" => Check::Int,
            "float" => Check::Float,
            "str" | "unicode" | "multiline" | "email" | "mailroute" => Check::Str,
            "path" => Check::Path,
            "file" => Check::File,
            "dir" | "directory" => Check::Dir,
            "new file" | "new dir" | "new directory" => Check::NewPath,
            "hostname" => Check::Hostname,
            "slug" => Check::Slug,
            "b36" => Check::B36,
            _ => return None,
        };
        Some(check)
    }

    /// The canonical tag for this checker.
    pub fn tag(&self) -> &'static str {
        match self {
            Check::Bool => "bool",
            Check::Int => "int",
            Check::Float => "float",
            Check::Str => "str",
            Check::Path => "path",
            Check::File => "file",
            Check::Dir => "dir",
            Check::NewPath => "new file",
            Check::Hostname => "hostname",
            Check::Slug => "slug",
            Check::B36 => "b36",
        }
    }

    /// Coerce `raw` into its canonical form.
    pub fn apply(&self, raw: &JsonValue) -> Result<Value, String> {
        match self {
            Check::Bool => check_bool(raw).map(Value::Bool),
            Check::Int => check_int(raw).map(Value::Int),
            Check::Float => check_float(raw).map(Value::Float),
            Check::Str => check_str(raw).map(Value::Str),
            Check::Path => check_path(text(raw)?).map(Value::Str),
            Check::File => check_file(text(raw)?).map(Value::Str),
            Check::Dir => check_dir(text(raw)?).map(Value::Str),
            Check::NewPath => check_new_path(text(raw)?).map(Value::Str),
            Check::Hostname => check_hostname(text(raw)?).map(Value::Str),
            Check::Slug => check_slug(text(raw)?).map(Value::Str),
            Check::B36 => check_b36(text(raw)?).map(Value::Str),
        }
    }
}

fn text(raw: &JsonValue) -> Result<&str, String> {
    raw.as_str().ok_or_else(|| format!("expected a string, got {raw}"))
}

fn check_bool(raw: &JsonValue) -> Result<bool, String> {
    match raw {
        JsonValue::Bool(b) => Ok(*b),
        JsonValue::Number(n) => Ok(n.as_f64() != Some(0.0)),
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(format!("not a boolean: {s}")),
        },
        other => Err(format!("not a boolean: {other}")),
    }
}

fn check_int(raw: &JsonValue) -> Result<i64, String> {
    match raw {
        JsonValue::Number(n) => n.as_i64().ok_or_else(|| format!("not an integer: {n}")),
        JsonValue::String(s) => s.trim().parse::<i64>().map_err(|e| e.to_string()),
        other => Err(format!("not an integer: {other}")),
    }
}

fn check_float(raw: &JsonValue) -> Result<f64, String> {
    match raw {
        JsonValue::Number(n) => n.as_f64().ok_or_else(|| format!("not a number: {n}")),
        JsonValue::String(s) => s.trim().parse::<f64>().map_err(|e| e.to_string()),
        other => Err(format!("not a number: {other}")),
    }
}

fn check_str(raw: &JsonValue) -> Result<String, String> {
    match raw {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected text, got {other}")),
    }
}

fn is_dns_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')
}

fn check_slug(slug: &str) -> Result<String, String> {
    if !slug.chars().all(is_dns_char) {
        return Err(format!("Invalid URL slug: {slug}"));
    }
    Ok(slug.to_string())
}

fn check_hostname(host: &str) -> Result<String, String> {
    if !host.chars().all(is_dns_char) {
        return Err(format!("Invalid hostname: {host}"));
    }
    Ok(host.to_ascii_lowercase())
}

fn check_b36(value: &str) -> Result<String, String> {
    b36_to_int(value).ok_or_else(|| format!("invalid base-36 integer: {value}"))?;
    Ok(value.to_ascii_lowercase())
}

/// Expand a leading `~` to the user's home directory.
fn expand_user(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match directories::UserDirs::new() {
        Some(user) => user.home_dir().join(rest),
        None => PathBuf::from(path),
    }
}

fn absolute(path: &Path) -> Result<PathBuf, String> {
    std::fs::canonicalize(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn check_path(path: &str) -> Result<String, String> {
    let expanded = expand_user(path);
    if !expanded.exists() {
        return Err(format!("File/directory does not exist: {}", expanded.display()));
    }
    Ok(absolute(&expanded)?.display().to_string())
}

fn check_file(path: &str) -> Result<String, String> {
    let checked = check_path(path)?;
    if !Path::new(&checked).is_file() {
        return Err(format!("Not a file: {checked}"));
    }
    Ok(checked)
}

fn check_dir(path: &str) -> Result<String, String> {
    let checked = check_path(path)?;
    if !Path::new(&checked).is_dir() {
        return Err(format!("Not a directory: {checked}"));
    }
    Ok(checked)
}

fn check_new_path(path: &str) -> Result<String, String> {
    let expanded = expand_user(path);
    let name = expanded
        .file_name()
        .ok_or_else(|| format!("Not a usable path: {path}"))?
        .to_owned();
    let parent = match expanded.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.exists() {
        return Err(format!("File/directory does not exist: {}", parent.display()));
    }
    Ok(absolute(&parent)?.join(name).display().to_string())
}
