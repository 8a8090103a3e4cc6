//! The sectioned text format.
//!
//! Each container is written as a section headed by its slash path, followed
//! by one `key = value` line per scalar:
//!
//! ```text
//! [config: Pot settings]
//! potatoes = 5             ; How many potatoes?
//! ;carrots = 99            ; (default) How many carrots?
//!
//! [config/tags/0]
//! x = woots                ; X
//! ```
//!
//! Values are percent-escaped so every value fits on one line and
//! `;` cannot start a comment inside a value. Keys and path segments are
//! escaped more strictly, since `=`, `/` and `:` are structural there.
//! Unset keys with a non-empty default are emitted commented out so the file
//! documents them.

use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::engine::RuledContainer;
use crate::value::Value;

/// Characters left unescaped in values. A space is kept except at either
/// end, where trimming on read would lose it.
const VALUE_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b' ')
    .remove(b'/')
    .remove(b'_')
    .remove(b'.')
    .remove(b'-');

/// Characters left unescaped in keys and section path segments.
const KEY_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'.').remove(b'-');

/// Column at which trailing comments start.
const COMMENT_COLUMN: usize = 25;

/// Percent-escape a value for one line of the text format.
pub fn escape(value: &str) -> String {
    let mut escaped = utf8_percent_encode(value, VALUE_ESCAPES).to_string();
    if escaped.starts_with(' ') {
        escaped.replace_range(..1, "%20");
    }
    if escaped.ends_with(' ') {
        escaped.pop();
        escaped.push_str("%20");
    }
    escaped
}

/// Percent-escape a key or one segment of a section path.
pub fn escape_key(key: &str) -> Cow<'_, str> {
    utf8_percent_encode(key, KEY_ESCAPES).into()
}

/// Reverse [`escape_key`]. Keys are only ever written escaped, so invalid
/// UTF-8 is replaced rather than rejected.
fn unescape_key(key: &str) -> Cow<'_, str> {
    percent_decode_str(key).decode_utf8_lossy()
}

/// Reverse [`escape`].
pub fn unescape(value: &str) -> Result<String, std::str::Utf8Error> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
}

pub(crate) fn serialize(root: &dyn RuledContainer) -> String {
    let mut out = String::new();
    let path = root
        .name()
        .split('/')
        .map(escape_key)
        .collect::<Vec<_>>()
        .join("/");
    write_container(root, &path, false, &mut out);
    out
}

/// Write `container` under the escaped section `path`, then its child
/// containers, depth-first in key order. `dynamic` forces a header even with
/// no entries, so a reload recreates children that only exist because of a
/// wildcard.
fn write_container(container: &dyn RuledContainer, path: &str, dynamic: bool, out: &mut String) {
    let keys = container.emit_keys();

    let mut lines = Vec::new();
    for key in &keys {
        let Some(value) = container.get(key) else {
            continue;
        };
        if value.is_container() {
            continue;
        }
        let text = value.to_string();
        let is_set = container.contains_key(key);
        if !is_set && text.is_empty() {
            continue;
        }
        let description = container
            .rules()
            .get(key)
            .map(|rule| rule.description.as_str())
            .unwrap_or("");
        lines.push(entry_line(key, &text, description, !is_set));
    }

    if !lines.is_empty() || dynamic {
        out.push_str(&section_header(path, container.comment()));
        out.push('\n');
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
    }

    let children_dynamic = container.rules().has_wildcard();
    for key in &keys {
        if let Some(child) = container.lookup(key).and_then(Value::as_container) {
            let dynamic = children_dynamic && container.rules().get(key).is_none();
            let child_path = format!("{path}/{}", escape_key(key));
            write_container(child, &child_path, dynamic, out);
        }
    }
}

fn section_header(name: &str, comment: Option<&str>) -> String {
    match comment.map(one_line).filter(|c| !c.is_empty()) {
        Some(comment) => format!("[{name}: {comment}]"),
        None => format!("[{name}]"),
    }
}

fn entry_line(key: &str, text: &str, description: &str, is_default: bool) -> String {
    let key = if is_default {
        format!(";{}", escape_key(key))
    } else {
        escape_key(key).into_owned()
    };
    let value = escape(text);
    let description = one_line(description);
    let comment = match (is_default, description.is_empty()) {
        (true, true) => "(default)".to_string(),
        (true, false) => format!("(default) {description}"),
        (false, _) => description,
    };
    if comment.is_empty() {
        return format!("{key} = {value}");
    }
    let used = key.len() + 3 + value.len();
    let pad = COMMENT_COLUMN.saturating_sub(used);
    format!("{key} = {value}{:pad$} ; {comment}", "")
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A `[header]` and the entries that follow it.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Header text between the brackets, comment included.
    pub header: String,
    pub line: usize,
    pub entries: Vec<Entry>,
}

impl Section {
    /// Unescaped path segments of the header, e.g. `["config", "tags", "0"]`.
    pub fn path(&self) -> Vec<Cow<'_, str>> {
        self.name().split('/').map(|s| unescape_key(s.trim())).collect()
    }

    /// Header without its comment.
    pub fn name(&self) -> &str {
        match self.header.split_once(':') {
            Some((name, _)) => name.trim(),
            None => self.header.trim(),
        }
    }
}

/// One `key = value` line. The key is unescaped; the value is still escaped.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub line: usize,
}

/// Sections in file order plus any lines that could not be read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parsed {
    pub sections: Vec<Section>,
    pub problems: Vec<String>,
}

/// Split text into sections and entries. Blank lines and lines starting
/// with `;` or `#` are skipped.
pub fn parse(text: &str) -> Parsed {
    let mut parsed = Parsed::default();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
            continue;
        }
        if trimmed.starts_with('[') {
            match trimmed.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
                Some(header) => parsed.sections.push(Section {
                    header: header.trim().to_string(),
                    line,
                    entries: Vec::new(),
                }),
                None => parsed
                    .problems
                    .push(format!("line {line}: malformed section header")),
            }
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            parsed
                .problems
                .push(format!("line {line}: expected 'key = value'"));
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            parsed.problems.push(format!("line {line}: missing key"));
            continue;
        }
        let Some(section) = parsed.sections.last_mut() else {
            parsed
                .problems
                .push(format!("line {line}: entry outside of any section"));
            continue;
        };
        section.entries.push(Entry {
            key: unescape_key(key).into_owned(),
            value: strip_comment(value).trim().to_string(),
            line,
        });
    }
    parsed
}

/// Cut a trailing `; comment`. Escaped values never contain `;`, so the
/// first one preceded by whitespace starts the comment.
fn strip_comment(value: &str) -> &str {
    let bytes = value.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b';' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            return &value[..i];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Check;
    use crate::dict::ConfigDict;
    use crate::fixtures::test::pot;
    use crate::rules::{Checker, Rule, RuleSet};
    use serde_json::json;

    #[test]
    fn escape_round_trips_awkward_text() {
        for text in ["a;b", "line\nbreak", "100%", " leading", "trailing ", "m\u{e1}ny", "a = b", ""] {
            assert_eq!(unescape(&escape(text)).unwrap(), text);
        }
    }

    #[test]
    fn escape_keeps_readable_characters() {
        assert_eq!(escape("/tmp/some dir/file_1.txt"), "/tmp/some dir/file_1.txt");
        assert_eq!(escape("a;b"), "a%3Bb");
        assert_eq!(escape(" x"), "%20x");
        assert_eq!(escape("x "), "x%20");
        assert_eq!(escape(" "), "%20");
        assert!(!escape("x\ny").contains('\n'));
    }

    #[test]
    fn keys_escape_structural_characters() {
        assert_eq!(escape_key("http_port"), "http_port");
        assert_eq!(escape_key("a=b"), "a%3Db");
        assert_eq!(escape_key("sub/dir: x"), "sub%2Fdir%3A%20x");
        assert_eq!(entry_line("[odd", "v", "", false), "%5Bodd = v");
        assert_eq!(entry_line(";k", "v", "", true).split(' ').next(), Some(";%3Bk"));

        let parsed = parse("[config/sub%2Fdir%3A%20x: Comment]\na%3Db = v\n");
        let section = &parsed.sections[0];
        assert_eq!(section.path(), vec!["config", "sub/dir: x"]);
        assert_eq!(section.entries[0].key, "a=b");
    }

    #[test]
    fn unescape_rejects_invalid_utf8() {
        assert!(unescape("%FF").is_err());
    }

    #[test]
    fn entry_padding_and_default_marker() {
        assert_eq!(entry_line("potatoes", "5", "How many?", false), format!("potatoes = 5{} ; How many?", " ".repeat(13)));
        assert_eq!(entry_line("k", "v", "", false), "k = v");
        assert_eq!(entry_line("k", "v", "", true), format!(";k = v{} ; (default)", " ".repeat(19)));
        let long = "x".repeat(40);
        assert_eq!(entry_line("k", &long, "d", false), format!("k = {long} ; d"));
    }

    #[test]
    fn serialize_pot() {
        let mut pot = pot();
        pot.set("potatoes", 5).unwrap();
        pot.list_mut("tags").unwrap().append(json!({"x": "woots"})).unwrap();
        pot.list_mut("colors").unwrap().append("red").unwrap();
        let text = pot.to_config_string();

        assert!(text.starts_with("[config]\n"));
        assert!(text.contains("potatoes = 5"));
        assert!(text.contains(";carrots = 99"));
        assert!(text.contains("(default) How many carrots?"));
        assert!(text.contains("[config/colors: Colors]\n0 = red"));
        assert!(text.contains("[config/tags/0]\n"));
        assert!(text.contains("x = woots"));
        // nothing set and no defaults worth showing
        assert!(!text.contains("[config/tags: Tags]"));
        assert!(text.contains(";vodka = 12"));
    }

    #[test]
    fn dynamic_children_get_headers_when_empty() {
        let element = RuleSet::new().with("x", Rule::new("X", Check::Str, "")).unwrap();
        let rules = RuleSet::new()
            .with("groups", Rule::list_of("Groups", Checker::nested(element)))
            .unwrap();
        let mut dict = ConfigDict::new("config", rules);
        dict.list_mut("groups").unwrap().append(json!({})).unwrap();
        assert_eq!(dict.to_config_string(), "[config/groups/0]\n\n");
    }

    #[test]
    fn list_sections_in_numeric_order() {
        let mut pot = pot();
        let tags = pot.list_mut("tags").unwrap();
        for i in 0..12 {
            tags.append(json!({"c": i})).unwrap();
        }
        let text = pot.to_config_string();
        let nine = text.find("[config/tags/9]").unwrap();
        let ten = text.find("[config/tags/a]").unwrap();
        let one = text.find("[config/tags/1]").unwrap();
        assert!(one < nine && nine < ten);
    }

    #[test]
    fn explicit_empty_string_is_written() {
        let mut dict = ConfigDict::new(
            "config",
            RuleSet::new().with("name", Rule::new("Name", Check::Str, "bob")).unwrap(),
        );
        dict.set("name", "").unwrap();
        assert!(dict.to_config_string().contains("\nname = "));
    }

    #[test]
    fn parse_sections_and_entries() {
        let parsed = parse(
            "; leading comment\n[config: Things]\na = 1 ; note\n;b = 2\n\n[config/sub]\nc = x%3By\nd =\n",
        );
        assert!(parsed.problems.is_empty());
        assert_eq!(parsed.sections.len(), 2);
        let first = &parsed.sections[0];
        assert_eq!(first.name(), "config");
        assert_eq!(first.path(), vec!["config"]);
        assert_eq!(first.entries.len(), 1);
        assert_eq!(first.entries[0].value, "1");
        let second = &parsed.sections[1];
        assert_eq!(second.path(), vec!["config", "sub"]);
        assert_eq!(second.entries[0].value, "x%3By");
        assert_eq!(second.entries[1].value, "");
        assert_eq!(second.entries[1].line, 8);
    }

    #[test]
    fn parse_reports_unreadable_lines() {
        let parsed = parse("orphan = 1\n[config\n[config]\nno equals here\n= 3\n");
        assert_eq!(parsed.problems.len(), 4);
        assert!(parsed.problems[0].contains("outside of any section"));
        assert!(parsed.problems[1].contains("malformed section header"));
    }

    #[test]
    fn strip_comment_requires_whitespace() {
        assert_eq!(strip_comment(" a;b ; c"), " a;b ");
        assert_eq!(strip_comment(" ; only comment"), " ");
        assert_eq!(strip_comment(" plain"), " plain");
    }
}
