//! The rule engine shared by dictionaries and lists.
//!
//! [`RuledContainer`] is the seam between the two container kinds: each kind
//! supplies raw storage (lookup, insertion, key canonicalization) and the
//! trait's provided methods layer rule resolution, defaults and
//! serialization on top. [`coerce`] is the single place where raw input
//! becomes a stored [`Value`].

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::codec;
use crate::dict::ConfigDict;
use crate::error::ConfigError;
use crate::list::ConfigList;
use crate::rules::{Checker, Rule, RuleDefault, RuleSet};
use crate::value::{Value, raw_text};

/// Name, comment and rules common to every container.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Slash-joined path from the root, e.g. `config/tags/0`.
    pub(crate) name: String,
    pub(crate) comment: Option<String>,
    pub(crate) rules: Arc<RuleSet>,
}

impl Header {
    pub(crate) fn new(name: impl Into<String>, comment: Option<String>, rules: Arc<RuleSet>) -> Self {
        Header {
            name: name.into(),
            comment,
            rules,
        }
    }

    /// Path of the child stored under `key`.
    pub(crate) fn child_path(&self, key: &str) -> String {
        format!("{}/{key}", self.name)
    }
}

/// Behaviour shared by [`ConfigDict`] and [`ConfigList`].
pub trait RuledContainer {
    fn header(&self) -> &Header;

    /// Keys of materialized values in emission order.
    fn materialized_keys(&self) -> Vec<String>;

    /// The stored value at `key`, without consulting defaults.
    fn lookup(&self, key: &str) -> Option<&Value>;

    fn lookup_mut(&mut self, key: &str) -> Option<&mut Value>;

    /// Check `raw` against the rule for `key` and store the result.
    fn assign(&mut self, key: &str, raw: JsonValue) -> Result<(), ConfigError>;

    /// Create the empty child container a wildcard rule describes and return
    /// the key it was stored under. Lists always append, so the returned key
    /// is the new address rather than `key`.
    fn materialize(&mut self, key: &str) -> Result<String, ConfigError>;

    /// Store an entry read back from serialized text.
    fn load_entry(&mut self, key: &str, raw: JsonValue) -> Result<(), ConfigError> {
        self.assign(key, raw)
    }

    /// Keys written when serializing: declared keys plus materialized ones.
    fn emit_keys(&self) -> Vec<String> {
        self.materialized_keys()
    }

    fn name(&self) -> &str {
        &self.header().name
    }

    fn comment(&self) -> Option<&str> {
        self.header().comment.as_deref()
    }

    fn rules(&self) -> &RuleSet {
        &self.header().rules
    }

    fn get_rule(&self, key: &str) -> Result<&Rule, ConfigError> {
        self.rules().lookup(self.name(), key)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// The stored value, else the explicitly declared scalar default.
    fn get(&self, key: &str) -> Option<Cow<'_, Value>> {
        if let Some(v) = self.lookup(key) {
            return Some(Cow::Borrowed(v));
        }
        match self.rules().get(key).map(|r| &r.default) {
            Some(RuleDefault::Value(v)) => Some(Cow::Owned(v.clone())),
            _ => None,
        }
    }

    /// Like [`get`](Self::get), falling back to `default`.
    fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> Cow<'a, Value> {
        self.get(key).unwrap_or(Cow::Borrowed(default))
    }

    /// Serialize this container and everything below it.
    fn to_config_string(&self) -> String {
        codec::serialize(self.as_dyn())
    }

    fn as_dyn(&self) -> &dyn RuledContainer;
}

/// Check `raw` against `rule` for the slot at `path`.
pub(crate) fn coerce(rule: &Rule, path: &str, raw: JsonValue) -> Result<Value, ConfigError> {
    match rule.effective_checker() {
        Checker::Immutable => Err(ConfigError::ImmutableField {
            path: path.to_string(),
        }),
        Checker::Any => verbatim(path, raw),
        Checker::OneOf(members) => {
            let text = raw_text(&raw);
            if raw.is_object() || raw.is_array() || !members.iter().any(|m| *m == text) {
                return Err(ConfigError::invalid_value(
                    path,
                    text,
                    format!("expected one of: {}", members.join(", ")),
                ));
            }
            Ok(Value::Str(text))
        }
        Checker::Coerce(check) => check
            .apply(&raw)
            .map_err(|reason| ConfigError::invalid_value(path, raw_text(&raw), reason)),
        Checker::Nested(_) if raw.is_null() => {
            Err(ConfigError::invalid_value(path, "null", "no value given"))
        }
        Checker::Nested(rules) => {
            let shown = raw_text(&raw);
            let mut dict = ConfigDict::from_shared(path, None, Arc::clone(rules));
            dict.update(raw)
                .map_err(|e| ConfigError::invalid_value(path, shown, e.to_string()))?;
            Ok(Value::Dict(dict))
        }
    }
}

/// Store `raw` as-is. Maps and arrays become containers that accept anything.
/// Scalars keep their JSON type only until the next reload, which reads them
/// back as strings.
fn verbatim(path: &str, raw: JsonValue) -> Result<Value, ConfigError> {
    let anything = || {
        Arc::new(RuleSet::wildcard(Rule::new(
            "",
            Checker::Any,
            RuleDefault::None,
        )))
    };
    match raw {
        JsonValue::Bool(b) => Ok(Value::Bool(b)),
        JsonValue::Number(n) => Ok(match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or_default()),
        }),
        JsonValue::String(s) => Ok(Value::Str(s)),
        JsonValue::Object(_) => {
            let mut dict = ConfigDict::from_shared(path, None, anything());
            dict.update(raw)?;
            Ok(Value::Dict(dict))
        }
        JsonValue::Array(items) => {
            let mut list = ConfigList::from_shared(path, None, anything());
            list.extend(items)?;
            Ok(Value::List(list))
        }
        JsonValue::Null => Err(ConfigError::invalid_value(path, "null", "no value given")),
    }
}

/// Build an empty child for a key covered by `rule`, for lazy
/// materialization under a wildcard.
pub(crate) fn empty_child(rule: &Rule, path: &str) -> Result<Value, ConfigError> {
    if let Some(child) = rule.materialize(path) {
        return Ok(child);
    }
    match &rule.checker {
        Checker::Nested(_) | Checker::Any => {
            coerce(rule, path, JsonValue::Object(serde_json::Map::new()))
        }
        _ => Err(ConfigError::NotAContainer {
            path: path.to_string(),
        }),
    }
}
