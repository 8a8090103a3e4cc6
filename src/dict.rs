//! Key-unique containers whose every write passes through the rule engine.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::engine::{self, Header, RuledContainer};
use crate::error::ConfigError;
use crate::list::ConfigList;
use crate::loader;
use crate::rules::{Rule, RuleSet};
use crate::value::{Value, raw_text};

/// A sanity-checking, self-documenting dictionary of settings.
///
/// Keys and their legal values are declared up front in a [`RuleSet`]. Nested
/// sections, maps and lists declared by the rules exist from construction;
/// keys under a wildcard rule are created on first write.
///
/// ```ignore
/// let mut pot = ConfigDict::new("config", rules);
/// pot.set("potatoes", "123")?;
/// assert_eq!(pot.get("potatoes").unwrap().as_int(), Some(123));
/// pot.set("evil", 1).unwrap_err(); // Invalid key for config: evil
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDict {
    header: Header,
    data: BTreeMap<String, Value>,
}

impl ConfigDict {
    pub fn new(name: impl Into<String>, rules: RuleSet) -> Self {
        Self::from_shared(name, None, Arc::new(rules))
    }

    pub(crate) fn from_shared(
        name: impl Into<String>,
        comment: Option<String>,
        rules: Arc<RuleSet>,
    ) -> Self {
        let mut dict = ConfigDict {
            header: Header::new(name, comment, rules),
            data: BTreeMap::new(),
        };
        dict.reset();
        dict
    }

    /// Build a dictionary and seed it through [`update`](Self::update).
    pub fn construct(
        name: impl Into<String>,
        rules: RuleSet,
        seed: impl Into<JsonValue>,
    ) -> Result<Self, ConfigError> {
        let mut dict = Self::new(name, rules);
        dict.update(seed)?;
        Ok(dict)
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.header.comment = Some(comment.into());
        self
    }

    /// Replace the rules, discarding all data.
    pub fn set_rules(&mut self, rules: RuleSet) {
        self.header.rules = Arc::new(rules);
        self.reset();
    }

    /// Drop all data and rebuild the containers the rules declare.
    pub fn reset(&mut self) {
        self.data.clear();
        let rules = Arc::clone(&self.header.rules);
        for (key, rule) in rules.iter() {
            if let Some(child) = rule.materialize(&self.header.child_path(key)) {
                self.data.insert(key.to_string(), child);
            }
        }
    }

    /// Check and store `value` under `key`.
    pub fn set(&mut self, key: &str, value: impl Into<JsonValue>) -> Result<(), ConfigError> {
        self.assign(key, value.into())
    }

    /// Keys are never removed from a dictionary.
    pub fn remove(&mut self, _key: &str) -> Result<Value, ConfigError> {
        Err(ConfigError::DeleteNotAllowed {
            container: self.header.name.clone(),
        })
    }

    /// Write every entry of a JSON object, or of a list of `[key, value]`
    /// pairs. Stops at the first failure; earlier writes are kept.
    pub fn update(&mut self, source: impl Into<JsonValue>) -> Result<(), ConfigError> {
        match source.into() {
            JsonValue::Null => Ok(()),
            JsonValue::Object(map) => {
                for (key, value) in map {
                    self.assign(&key, value)?;
                }
                Ok(())
            }
            JsonValue::Array(pairs) => {
                for pair in pairs {
                    let (key, value) = split_pair(&self.header.name, pair)?;
                    self.assign(&key, value)?;
                }
                Ok(())
            }
            other => Err(ConfigError::invalid_value(
                self.header.name.clone(),
                raw_text(&other),
                "expected a map or a list of pairs",
            )),
        }
    }

    /// Materialized keys merged with every declared key.
    pub fn all_keys(&self) -> Vec<String> {
        let mut keys: BTreeSet<String> = self.data.keys().cloned().collect();
        keys.extend(self.header.rules.keys().map(str::to_string));
        keys.into_iter().collect()
    }

    /// Materialized keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dict(&self, key: &str) -> Result<&ConfigDict, ConfigError> {
        self.get_rule(key)?;
        self.data
            .get(key)
            .and_then(Value::as_dict)
            .ok_or_else(|| self.not_a_container(key))
    }

    pub fn dict_mut(&mut self, key: &str) -> Result<&mut ConfigDict, ConfigError> {
        self.get_rule(key)?;
        let err = self.not_a_container(key);
        self.data.get_mut(key).and_then(Value::as_dict_mut).ok_or(err)
    }

    pub fn list(&self, key: &str) -> Result<&ConfigList, ConfigError> {
        self.get_rule(key)?;
        self.data
            .get(key)
            .and_then(Value::as_list)
            .ok_or_else(|| self.not_a_container(key))
    }

    pub fn list_mut(&mut self, key: &str) -> Result<&mut ConfigList, ConfigError> {
        self.get_rule(key)?;
        let err = self.not_a_container(key);
        self.data.get_mut(key).and_then(Value::as_list_mut).ok_or(err)
    }

    /// Resolve a dotted name such as `sys.http_port` or `tags.0.name`.
    ///
    /// Returns the stored value or the declared default; a covered key with
    /// neither is [`ConfigError::KeyNotFound`].
    pub fn get_path(&self, dotted: &str) -> Result<Cow<'_, Value>, ConfigError> {
        let (parent, leaf) = self.parent_of(dotted)?;
        parent.get_rule(leaf)?;
        parent
            .get(leaf)
            .ok_or_else(|| ConfigError::KeyNotFound(dotted.to_string()))
    }

    /// Write through a dotted name, checking against the owning container's rules.
    pub fn set_path(&mut self, dotted: &str, value: impl Into<JsonValue>) -> Result<(), ConfigError> {
        let (parents, leaf) = split_dotted(dotted);
        let mut current: &mut dyn RuledContainer = self;
        for segment in parents {
            current = child_mut(current, segment)?;
        }
        current.assign(leaf, value.into())
    }

    /// The rule governing a dotted name.
    pub fn rule_for_path(&self, dotted: &str) -> Result<&Rule, ConfigError> {
        let (parent, leaf) = self.parent_of(dotted)?;
        parent.get_rule(leaf)
    }

    /// Apply serialized settings, tolerating bad sections and entries.
    ///
    /// Every problem is reported through `on_warning` (and logged); loading
    /// carries on with the next entry. Returns `false` if anything was
    /// rejected. Accepted values stay applied either way.
    pub fn parse_config(
        &mut self,
        data: &str,
        source: &str,
        mut on_warning: impl FnMut(&str),
    ) -> bool {
        loader::load(self, data, source, &mut on_warning)
    }

    fn parent_of<'d>(
        &self,
        dotted: &'d str,
    ) -> Result<(&dyn RuledContainer, &'d str), ConfigError> {
        let (parents, leaf) = split_dotted(dotted);
        let mut current: &dyn RuledContainer = self;
        for segment in parents {
            current = child(current, segment)?;
        }
        Ok((current, leaf))
    }

    fn not_a_container(&self, key: &str) -> ConfigError {
        ConfigError::NotAContainer {
            path: self.header.child_path(key),
        }
    }
}

fn split_dotted(dotted: &str) -> (Vec<&str>, &str) {
    match dotted.rsplit_once('.') {
        Some((path, leaf)) => (path.split('.').collect(), leaf),
        None => (Vec::new(), dotted),
    }
}

fn child<'a>(
    container: &'a dyn RuledContainer,
    segment: &str,
) -> Result<&'a dyn RuledContainer, ConfigError> {
    container.get_rule(segment)?;
    container
        .lookup(segment)
        .and_then(Value::as_container)
        .ok_or_else(|| ConfigError::NotAContainer {
            path: container.header().child_path(segment),
        })
}

fn child_mut<'a>(
    container: &'a mut dyn RuledContainer,
    segment: &str,
) -> Result<&'a mut dyn RuledContainer, ConfigError> {
    container.get_rule(segment)?;
    let err = ConfigError::NotAContainer {
        path: container.header().child_path(segment),
    };
    container
        .lookup_mut(segment)
        .and_then(Value::as_container_mut)
        .ok_or(err)
}

fn split_pair(container: &str, pair: JsonValue) -> Result<(String, JsonValue), ConfigError> {
    if let JsonValue::Array(items) = &pair
        && let [JsonValue::String(key), value] = items.as_slice()
    {
        return Ok((key.clone(), value.clone()));
    }
    Err(ConfigError::invalid_value(
        container,
        raw_text(&pair),
        "expected a [key, value] pair",
    ))
}

impl RuledContainer for ConfigDict {
    fn header(&self) -> &Header {
        &self.header
    }

    fn materialized_keys(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    fn emit_keys(&self) -> Vec<String> {
        self.all_keys()
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    fn lookup_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    fn assign(&mut self, key: &str, raw: JsonValue) -> Result<(), ConfigError> {
        let rules = Arc::clone(&self.header.rules);
        let rule = rules.lookup(&self.header.name, key)?;
        let value = engine::coerce(rule, &self.header.child_path(key), raw)?;
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    fn materialize(&mut self, key: &str) -> Result<String, ConfigError> {
        let rules = Arc::clone(&self.header.rules);
        let rule = rules.lookup(&self.header.name, key)?;
        let path = self.header.child_path(key);
        let child = engine::empty_child(rule, &path)?;
        tracing::debug!(path = %path, "materialized container");
        self.data.insert(key.to_string(), child);
        Ok(key.to_string())
    }

    fn as_dyn(&self) -> &dyn RuledContainer {
        self
    }
}

impl Serialize for ConfigDict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.data.iter())
    }
}

impl fmt::Display for ConfigDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_config_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Check;
    use crate::fixtures::test::{pot, pot_rules};
    use crate::rules::{Checker, RuleDefault, WILDCARD};
    use serde_json::json;

    #[test]
    fn declared_containers_exist_from_construction() {
        let pot = pot();
        let mut keys: Vec<&str> = pot.keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["colors", "liquids", "tags"]);
        assert!(pot.dict("liquids").is_ok());
        assert!(pot.list("tags").unwrap().is_empty());
        assert_eq!(pot.dict("liquids").unwrap().name(), "config/liquids");
        assert_eq!(pot.dict("liquids").unwrap().comment(), Some("Fluids we like"));
    }

    #[test]
    fn set_coerces_and_get_falls_back_to_defaults() {
        let mut pot = pot();
        pot.set("potatoes", "123").unwrap();
        pot.dict_mut("liquids").unwrap().set("vodka", "123").unwrap();
        assert_eq!(pot.get("potatoes").unwrap().as_int(), Some(123));
        assert_eq!(pot.dict("liquids").unwrap().get("vodka").unwrap().as_int(), Some(123));
        assert_eq!(pot.get("carrots").unwrap().as_int(), Some(99));
    }

    #[test]
    fn get_or_prefers_rule_default_over_caller_default() {
        let pot = pot();
        let fallback = Value::Int(-1);
        assert_eq!(pot.get_or("carrots", &fallback).as_int(), Some(99));
        let wild = ConfigDict::new(
            "w",
            RuleSet::wildcard(Rule::new("any", Check::Int, RuleDefault::None)),
        );
        assert_eq!(wild.get_or("missing", &fallback).as_int(), Some(-1));
    }

    #[test]
    fn count_example() {
        let rules = RuleSet::new().with("count", Rule::new("desc", Check::Int, 0)).unwrap();
        let mut root = ConfigDict::new("root", rules);
        root.set("count", "42").unwrap();
        assert_eq!(root.lookup("count"), Some(&Value::Int(42)));
        match root.set("count", "x").unwrap_err() {
            ConfigError::InvalidValue { path, .. } => assert_eq!(path, "root/count"),
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
        assert_eq!(root.lookup("count"), Some(&Value::Int(42)));
    }

    #[test]
    fn unknown_keys_rejected() {
        let mut pot = pot();
        let err = pot.set("evil", 123).unwrap_err();
        assert_eq!(err.to_string(), "Invalid key for config: evil");
        let err = pot.dict_mut("liquids").unwrap().set("evil", 123).unwrap_err();
        assert_eq!(err.to_string(), "Invalid key for config/liquids: evil");
    }

    #[test]
    fn wildcard_accepts_arbitrary_keys() {
        let mut paths = ConfigDict::new(
            "paths",
            RuleSet::wildcard(Rule::new("Data directory", Check::Str, "")),
        );
        paths.set("anything", "/tmp").unwrap();
        paths.set("else", 5).unwrap();
        assert_eq!(paths.get("else").unwrap().as_str(), Some("5"));
    }

    #[test]
    fn containers_cannot_be_replaced() {
        let mut pot = pot();
        let err = pot.set("liquids", json!({"water": 1})).unwrap_err();
        assert!(matches!(err, ConfigError::ImmutableField { path } if path == "config/liquids"));
    }

    #[test]
    fn deleting_always_fails() {
        let mut pot = pot();
        pot.set("potatoes", 1).unwrap();
        assert!(matches!(pot.remove("potatoes"), Err(ConfigError::DeleteNotAllowed { .. })));
        assert!(matches!(pot.remove("nonexistent"), Err(ConfigError::DeleteNotAllowed { .. })));

        let mut wild = ConfigDict::new("w", RuleSet::wildcard(Rule::new("x", Checker::Any, RuleDefault::None)));
        wild.set("k", "v").unwrap();
        assert!(wild.remove("k").is_err());
        assert!(wild.contains_key("k"));
    }

    #[test]
    fn update_from_map_and_pairs() {
        let mut pot = pot();
        pot.update(json!({"potatoes": "5", "carrots": 6})).unwrap();
        assert_eq!(pot.get("potatoes").unwrap().as_int(), Some(5));
        pot.update(json!([["carrots", "7"]])).unwrap();
        assert_eq!(pot.get("carrots").unwrap().as_int(), Some(7));
        assert!(pot.update(json!([["carrots"]])).is_err());
        assert!(pot.update(json!("nope")).is_err());
    }

    #[test]
    fn update_partial_failure_keeps_prior_writes() {
        let mut pot = pot();
        let result = pot.update(json!([["potatoes", "1"], ["carrots", "x"], ["potatoes", "3"]]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(pot.get("potatoes").unwrap().as_int(), Some(1));
        assert_eq!(pot.get("carrots").unwrap().as_int(), Some(99));
    }

    #[test]
    fn all_keys_unions_declared_and_materialized() {
        let pot = pot();
        assert_eq!(
            pot.all_keys(),
            vec!["carrots", "colors", "liquids", "potatoes", "tags"]
        );
        let rules = RuleSet::new()
            .with("a", Rule::new("A", Check::Int, 0))
            .unwrap()
            .with(WILDCARD, Rule::new("rest", Check::Int, 0))
            .unwrap();
        let mut dict = ConfigDict::new("d", rules);
        dict.set("z", 1).unwrap();
        assert_eq!(dict.all_keys(), vec!["a", "z"]);
    }

    #[test]
    fn dotted_paths_reach_nested_values() {
        let mut pot = pot();
        pot.set_path("liquids.water", "3").unwrap();
        assert_eq!(pot.get_path("liquids.water").unwrap().as_int(), Some(3));
        assert_eq!(pot.get_path("liquids.vodka").unwrap().as_int(), Some(12));

        pot.list_mut("tags").unwrap().append(json!({"x": "woots"})).unwrap();
        pot.set_path("tags.0.c", "9").unwrap();
        assert_eq!(pot.get_path("tags.0.c").unwrap().as_int(), Some(9));

        assert!(matches!(pot.get_path("liquids.evil"), Err(ConfigError::InvalidKey { .. })));
        assert!(matches!(pot.get_path("potatoes.x"), Err(ConfigError::NotAContainer { .. })));
        assert_eq!(pot.rule_for_path("liquids.water").unwrap().description, "Liters");
    }

    #[test]
    fn reset_keeps_rules_and_rebuilds_children() {
        let mut pot = pot();
        pot.set("potatoes", 4).unwrap();
        pot.list_mut("colors").unwrap().append("red").unwrap();
        pot.reset();
        assert!(pot.lookup("potatoes").is_none());
        assert!(pot.list("colors").unwrap().is_empty());
        assert!(pot.set("potatoes", 4).is_ok());
    }

    #[test]
    fn set_rules_replaces_schema() {
        let mut dict = pot();
        dict.set_rules(RuleSet::new().with("only", Rule::new("Only", Check::Bool, false)).unwrap());
        assert!(dict.set("potatoes", 1).is_err());
        dict.set("only", "yes").unwrap();
        assert_eq!(dict.get("only").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn construct_with_seed() {
        let dict = ConfigDict::construct("config", pot_rules(), json!({"potatoes": "8"})).unwrap();
        assert_eq!(dict.get("potatoes").unwrap().as_int(), Some(8));
        assert!(ConfigDict::construct("config", pot_rules(), json!({"bogus": 1})).is_err());
    }

    #[test]
    fn sibling_defaults_are_independent() {
        let rules = pot_rules();
        let mut a = ConfigDict::new("a", rules.clone());
        let b = ConfigDict::new("b", rules);
        a.dict_mut("liquids").unwrap().set("vodka", 1).unwrap();
        assert_eq!(b.dict("liquids").unwrap().get("vodka").unwrap().as_int(), Some(12));
        assert_eq!(a.dict("liquids").unwrap().get("vodka").unwrap().as_int(), Some(1));
    }

    #[test]
    fn serializes_materialized_data_as_json() {
        let mut pot = pot();
        pot.set("potatoes", 2).unwrap();
        let json = serde_json::to_value(&pot).unwrap();
        assert_eq!(json["potatoes"], json!(2));
        assert_eq!(json["colors"], json!([]));
        assert!(json.get("carrots").is_none());
    }
}
