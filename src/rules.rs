//! Declarative rule definitions: what keys a container accepts, how values
//! are checked, and what the defaults are.
//!
//! A [`RuleSet`] can be assembled in code:
//!
//! ```ignore
//! let rules = RuleSet::new()
//!     .with("count", Rule::new("How many?", Check::Int, 0))?
//!     .with("colors", Rule::list_of("Colors we like", Checker::one_of(["red", "blue"])))?;
//! ```
//!
//! or read from a JSON/TOML document using the compact list form
//! `key = [description, checker, default]`:
//!
//! ```text
//! {
//!   "count":  ["How many?", "int", 0],
//!   "sys":    ["System settings", false, {"port": ["Port", "int", 8080]}],
//!   "tags":   ["Tags", {"name": ["Name", "str", ""]}, []],
//!   "colors": ["Colors", ["red", "blue"], []],
//!   "_any":   ["Anything else", "str", null]
//! }
//! ```
//!
//! The checker slot holds a type tag (see [`Check::from_tag`]), `true`
//! (accept verbatim), `false` (immutable), an array of allowed values, or a
//! nested rule object. The default slot holds `null`, a scalar, a non-empty
//! object (a nested section), `{}` (a map of checked values) or `[]` (a list
//! of checked values).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::check::Check;
use crate::dict::ConfigDict;
use crate::error::ConfigError;
use crate::list::ConfigList;
use crate::value::Value;

/// Reserved rule key governing every key not listed explicitly.
pub const WILDCARD: &str = "_any";

/// How a rule checks values written to its key.
#[derive(Debug, Clone, PartialEq)]
pub enum Checker {
    /// Store the value as given. Scalars are written as text, so after a
    /// reload an `Int(3)` stored here reads back as `Str("3")`.
    Any,
    /// Reject every write.
    Immutable,
    /// Coerce through a primitive checker.
    Coerce(Check),
    /// Accept only one of a fixed set of values.
    OneOf(Vec<String>),
    /// Values are maps checked against a nested rule set.
    Nested(Arc<RuleSet>),
}

impl Checker {
    /// Resolve a type tag, including the `true`/`false` spellings.
    pub fn from_tag(tag: &str) -> Result<Checker, ConfigError> {
        match tag {
            "true" | "True" => Ok(Checker::Any),
            "false" | "False" => Ok(Checker::Immutable),
            other => Check::from_tag(other)
                .map(Checker::Coerce)
                .ok_or_else(|| ConfigError::rule(other, "unknown checker tag")),
        }
    }

    pub fn one_of<I, S>(members: I) -> Checker
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Checker::OneOf(members.into_iter().map(Into::into).collect())
    }

    pub fn nested(rules: RuleSet) -> Checker {
        Checker::Nested(Arc::new(rules))
    }
}

impl From<Check> for Checker {
    fn from(check: Check) -> Self {
        Checker::Coerce(check)
    }
}

/// The default slot of a rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RuleDefault {
    #[default]
    None,
    /// A scalar returned by `get` while the key is unset.
    Value(Value),
    /// A nested section with its own rules, built at registration.
    Section(Arc<RuleSet>),
    /// A map whose entries all obey this rule's checker.
    Map,
    /// A list whose elements all obey this rule's checker.
    List,
}

impl RuleDefault {
    fn is_container(&self) -> bool {
        matches!(
            self,
            RuleDefault::Section(_) | RuleDefault::Map | RuleDefault::List
        )
    }
}

impl From<Value> for RuleDefault {
    fn from(v: Value) -> Self {
        RuleDefault::Value(v)
    }
}

impl From<bool> for RuleDefault {
    fn from(b: bool) -> Self {
        RuleDefault::Value(Value::Bool(b))
    }
}

impl From<i64> for RuleDefault {
    fn from(i: i64) -> Self {
        RuleDefault::Value(Value::Int(i))
    }
}

impl From<i32> for RuleDefault {
    fn from(i: i32) -> Self {
        RuleDefault::Value(Value::Int(i.into()))
    }
}

impl From<f64> for RuleDefault {
    fn from(x: f64) -> Self {
        RuleDefault::Value(Value::Float(x))
    }
}

impl From<&str> for RuleDefault {
    fn from(s: &str) -> Self {
        RuleDefault::Value(Value::from(s))
    }
}

impl From<RuleSet> for RuleDefault {
    fn from(rules: RuleSet) -> Self {
        RuleDefault::Section(Arc::new(rules))
    }
}

/// A single key's description, checker, and default.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub description: String,
    pub checker: Checker,
    pub default: RuleDefault,
}

impl Rule {
    pub fn new(
        description: impl Into<String>,
        checker: impl Into<Checker>,
        default: impl Into<RuleDefault>,
    ) -> Self {
        Rule {
            description: description.into(),
            checker: checker.into(),
            default: default.into(),
        }
    }

    /// A nested section governed by `rules`.
    pub fn section(description: impl Into<String>, rules: RuleSet) -> Self {
        Rule::new(description, Checker::Immutable, rules)
    }

    /// A list whose elements obey `checker`.
    pub fn list_of(description: impl Into<String>, checker: impl Into<Checker>) -> Self {
        Rule::new(description, checker, RuleDefault::List)
    }

    /// A map whose entries obey `checker`.
    pub fn map_of(description: impl Into<String>, checker: impl Into<Checker>) -> Self {
        Rule::new(description, checker, RuleDefault::Map)
    }

    /// The checker applied on writes. Keys holding a container are never
    /// replaced wholesale, whatever checker was declared.
    pub fn effective_checker(&self) -> &Checker {
        if self.default.is_container() {
            &Checker::Immutable
        } else {
            &self.checker
        }
    }

    /// Rules for the elements of a map or list built from this rule.
    fn element_rules(&self) -> RuleSet {
        RuleSet::wildcard(Rule::new(
            self.description.clone(),
            self.checker.clone(),
            RuleDefault::None,
        ))
    }

    /// Build the empty container this rule's default describes, named `path`.
    pub(crate) fn materialize(&self, path: &str) -> Option<Value> {
        let comment = Some(self.description.clone()).filter(|c| !c.is_empty());
        match &self.default {
            RuleDefault::Section(rules) => Some(Value::Dict(ConfigDict::from_shared(
                path,
                comment,
                Arc::clone(rules),
            ))),
            RuleDefault::Map => Some(Value::Dict(ConfigDict::from_shared(
                path,
                comment,
                Arc::new(self.element_rules()),
            ))),
            RuleDefault::List => Some(Value::List(ConfigList::from_shared(
                path,
                comment,
                Arc::new(self.element_rules()),
            ))),
            RuleDefault::None | RuleDefault::Value(_) => None,
        }
    }
}

/// A container's schema: rules by key, plus an optional [`WILDCARD`] rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: BTreeMap<String, Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A rule set whose only rule is the wildcard.
    pub fn wildcard(rule: Rule) -> Self {
        let mut rules = BTreeMap::new();
        rules.insert(WILDCARD.to_string(), rule);
        RuleSet { rules }
    }

    /// Build from `(key, rule)` pairs, rejecting illegal or duplicate keys.
    pub fn from_rules<I, K>(rules: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, Rule)>,
        K: Into<String>,
    {
        let mut set = RuleSet::new();
        for (key, rule) in rules {
            set.insert(key, rule)?;
        }
        Ok(set)
    }

    /// Register a rule. Keys must be made of ASCII letters, digits and `_`.
    pub fn insert(&mut self, key: impl Into<String>, rule: Rule) -> Result<(), ConfigError> {
        let key = key.into();
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::rule(key, "keys may only contain letters, digits and '_'"));
        }
        if self.rules.contains_key(&key) {
            return Err(ConfigError::rule(key, "duplicate key"));
        }
        if let RuleDefault::Value(v) = &rule.default
            && v.is_container()
        {
            return Err(ConfigError::rule(key, "invalid type for default"));
        }
        self.rules.insert(key, rule);
        Ok(())
    }

    /// Chaining form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, rule: Rule) -> Result<Self, ConfigError> {
        self.insert(key, rule)?;
        Ok(self)
    }

    /// The rule registered for exactly `key`.
    pub fn get(&self, key: &str) -> Option<&Rule> {
        self.rules.get(key)
    }

    pub fn wildcard_rule(&self) -> Option<&Rule> {
        self.rules.get(WILDCARD)
    }

    pub fn has_wildcard(&self) -> bool {
        self.rules.contains_key(WILDCARD)
    }

    /// Explicitly declared keys, sorted, without the wildcard.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str).filter(|k| *k != WILDCARD)
    }

    /// Explicit `(key, rule)` pairs, sorted, without the wildcard.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules
            .iter()
            .filter(|(k, _)| k.as_str() != WILDCARD)
            .map(|(k, r)| (k.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule for `key`, falling back to the wildcard; `container` names the
    /// owner in the error.
    pub fn lookup(&self, container: &str, key: &str) -> Result<&Rule, ConfigError> {
        self.rules
            .get(key)
            .or_else(|| self.wildcard_rule())
            .ok_or_else(|| ConfigError::InvalidKey {
                container: container.to_string(),
                key: key.to_string(),
            })
    }

    /// Read a rule set from a JSON object in the compact list form.
    pub fn from_json(doc: &JsonValue) -> Result<Self, ConfigError> {
        let object = doc
            .as_object()
            .ok_or_else(|| ConfigError::rule("<root>", "rule set must be an object"))?;
        let mut set = RuleSet::new();
        for (key, spec) in object {
            set.insert(key.clone(), rule_from_json(key, spec)?)?;
        }
        Ok(set)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let doc: JsonValue =
            serde_json::from_str(text).map_err(|e| ConfigError::rule("<document>", e.to_string()))?;
        Self::from_json(&doc)
    }

    /// Read a rule set from TOML, e.g. `port = ["Port", "int", 8080]`.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let doc: JsonValue =
            toml::from_str(text).map_err(|e| ConfigError::rule("<document>", e.to_string()))?;
        Self::from_json(&doc)
    }
}

fn rule_from_json(key: &str, spec: &JsonValue) -> Result<Rule, ConfigError> {
    let parts = match spec.as_array() {
        Some(parts) if parts.len() == 3 => parts,
        _ => {
            return Err(ConfigError::rule(
                key,
                "expected [description, checker, default]",
            ));
        }
    };

    let description = parts[0]
        .as_str()
        .ok_or_else(|| ConfigError::rule(key, "description must be a string"))?;

    let checker = match &parts[1] {
        JsonValue::Bool(true) => Checker::Any,
        JsonValue::Bool(false) => Checker::Immutable,
        JsonValue::String(tag) => {
            Checker::from_tag(tag).map_err(|_| ConfigError::rule(key, format!("unknown checker tag '{tag}'")))?
        }
        JsonValue::Array(members) => Checker::OneOf(
            members
                .iter()
                .map(|m| match m {
                    JsonValue::String(s) => Ok(s.clone()),
                    JsonValue::Number(_) | JsonValue::Bool(_) => Ok(m.to_string()),
                    _ => Err(ConfigError::rule(key, "allowed values must be scalars")),
                })
                .collect::<Result<_, _>>()?,
        ),
        JsonValue::Object(_) => Checker::nested(RuleSet::from_json(&parts[1])?),
        JsonValue::Null | JsonValue::Number(_) => {
            return Err(ConfigError::rule(key, "unsupported checker"));
        }
    };

    let default = match &parts[2] {
        JsonValue::Null => RuleDefault::None,
        JsonValue::Bool(b) => RuleDefault::from(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => RuleDefault::from(i),
            None => RuleDefault::from(n.as_f64().unwrap_or_default()),
        },
        JsonValue::String(s) => RuleDefault::from(s.as_str()),
        JsonValue::Object(o) if o.is_empty() => RuleDefault::Map,
        JsonValue::Object(_) => RuleDefault::from(RuleSet::from_json(&parts[2])?),
        JsonValue::Array(a) if a.is_empty() => RuleDefault::List,
        JsonValue::Array(_) => return Err(ConfigError::rule(key, "list defaults must be empty")),
    };

    Ok(Rule {
        description: description.to_string(),
        checker,
        default,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_falls_back_to_wildcard() {
        let rules = RuleSet::new()
            .with("port", Rule::new("Port", Check::Int, 8080))
            .unwrap()
            .with(WILDCARD, Rule::new("Other", Check::Str, RuleDefault::None))
            .unwrap();
        assert_eq!(rules.lookup("config", "port").unwrap().description, "Port");
        assert_eq!(rules.lookup("config", "whatever").unwrap().description, "Other");
        assert_eq!(rules.keys().collect::<Vec<_>>(), vec!["port"]);
    }

    #[test]
    fn lookup_without_wildcard_is_invalid_key() {
        let rules = RuleSet::new().with("port", Rule::new("Port", Check::Int, 0)).unwrap();
        let err = rules.lookup("config", "evil").unwrap_err();
        assert_eq!(err.to_string(), "Invalid key for config: evil");
    }

    #[test]
    fn duplicate_and_illegal_keys_rejected() {
        let dup = RuleSet::from_rules([
            ("a", Rule::new("A", Check::Int, 0)),
            ("a", Rule::new("A again", Check::Int, 1)),
        ]);
        assert!(matches!(dup, Err(ConfigError::RuleDefinition { .. })));

        let illegal = RuleSet::new().with("bad key", Rule::new("x", Check::Int, 0));
        assert!(matches!(illegal, Err(ConfigError::RuleDefinition { .. })));
    }

    #[test]
    fn container_scalar_default_rejected() {
        let nested = ConfigDict::new("x", RuleSet::new());
        let result = RuleSet::new().with("x", Rule::new("x", Checker::Any, Value::Dict(nested)));
        assert!(matches!(result, Err(ConfigError::RuleDefinition { .. })));
    }

    #[test]
    fn unknown_tag_fails_at_registration() {
        let err = RuleSet::from_json(&json!({"n": ["Number", "integer-ish", 0]})).unwrap_err();
        assert!(err.to_string().contains("unknown checker tag"));
        assert!(Checker::from_tag("nope").is_err());
    }

    #[test]
    fn json_forms_map_to_variants() {
        let rules = RuleSet::from_json(&json!({
            "potatoes": ["How many potatoes?", "int", 0],
            "liquids": ["Fluids we like", false, {"water": ["Liters", "int", 0]}],
            "tags": ["Tags", {"c": ["C", "int", 0]}, []],
            "colors": ["Colors", ["red", "blue"], []],
            "paths": ["Paths", "str", {}],
            "anything": ["Whatever", true, null]
        }))
        .unwrap();

        let potatoes = rules.get("potatoes").unwrap();
        assert_eq!(potatoes.checker, Checker::Coerce(Check::Int));
        assert_eq!(potatoes.default, RuleDefault::Value(Value::Int(0)));

        assert!(matches!(rules.get("liquids").unwrap().default, RuleDefault::Section(_)));
        assert!(matches!(rules.get("tags").unwrap().checker, Checker::Nested(_)));
        assert_eq!(rules.get("tags").unwrap().default, RuleDefault::List);
        assert_eq!(rules.get("colors").unwrap().checker, Checker::one_of(["red", "blue"]));
        assert_eq!(rules.get("paths").unwrap().default, RuleDefault::Map);
        assert_eq!(rules.get("anything").unwrap().checker, Checker::Any);
    }

    #[test]
    fn malformed_json_rules() {
        assert!(RuleSet::from_json(&json!(["not", "an", "object"])).is_err());
        assert!(RuleSet::from_json(&json!({"a": ["too short", "int"]})).is_err());
        assert!(RuleSet::from_json(&json!({"a": ["A", "int", [1, 2]]})).is_err());
    }

    #[test]
    fn toml_rule_document() {
        let rules = RuleSet::from_toml_str(
            r#"
            port = ["Listening port", "int", 8080]
            host = ["Listening host", "hostname", "localhost"]
            sys = ["System", false, { debug = ["Debug flags", "str", ""] }]
            "#,
        )
        .unwrap();
        assert_eq!(rules.get("port").unwrap().default, RuleDefault::from(8080));
        assert!(matches!(rules.get("sys").unwrap().default, RuleDefault::Section(_)));
    }

    #[test]
    fn container_defaults_are_immutable() {
        let rule = Rule::list_of("Numbers", Check::Int);
        assert_eq!(rule.effective_checker(), &Checker::Immutable);
        let plain = Rule::new("n", Check::Int, 0);
        assert_eq!(plain.effective_checker(), &Checker::Coerce(Check::Int));
    }
}
