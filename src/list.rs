//! Ordered containers addressed by base-36 position.

use std::borrow::Cow;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

use serde::ser::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::b36::{b36_to_int, int_to_b36};
use crate::engine::{self, Header, RuledContainer};
use crate::error::ConfigError;
use crate::rules::{Rule, RuleSet};
use crate::value::{Value, raw_text};

/// A list of checked values.
///
/// Every element is governed by the wildcard rule of the list's rule set.
/// Positions double as keys: element `n` lives at address `int_to_b36(n)`,
/// so the eleventh element is `"a"` and its nested section is named
/// `config/tags/a`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigList {
    header: Header,
    data: Vec<Value>,
}

impl ConfigList {
    pub fn new(name: impl Into<String>, rules: RuleSet) -> Self {
        Self::from_shared(name, None, Arc::new(rules))
    }

    pub(crate) fn from_shared(
        name: impl Into<String>,
        comment: Option<String>,
        rules: Arc<RuleSet>,
    ) -> Self {
        ConfigList {
            header: Header::new(name, comment, rules),
            data: Vec::new(),
        }
    }

    /// Build a list and seed it from a JSON array.
    pub fn construct(
        name: impl Into<String>,
        rules: RuleSet,
        seed: impl Into<JsonValue>,
    ) -> Result<Self, ConfigError> {
        let mut list = Self::new(name, rules);
        list.update(seed)?;
        Ok(list)
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.header.comment = Some(comment.into());
        self
    }

    pub fn set_rules(&mut self, rules: RuleSet) {
        self.header.rules = Arc::new(rules);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check `value` and push it, returning its address. A rejected value
    /// leaves the list unchanged.
    pub fn append(&mut self, value: impl Into<JsonValue>) -> Result<String, ConfigError> {
        let key = int_to_b36(self.data.len() as u64);
        let value = self.check_slot(&key, value.into())?;
        self.data.push(value);
        Ok(key)
    }

    /// Append each value in turn, stopping at the first rejection.
    pub fn extend<I, V>(&mut self, values: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        for value in values {
            self.append(value)?;
        }
        Ok(())
    }

    /// Replace the element at a base-36 address.
    pub fn set(&mut self, key: &str, value: impl Into<JsonValue>) -> Result<(), ConfigError> {
        self.assign(key, value.into())
    }

    pub fn set_index(&mut self, index: usize, value: impl Into<JsonValue>) -> Result<(), ConfigError> {
        self.assign(&int_to_b36(index as u64), value.into())
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.data.get(index)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.data.get_mut(index)
    }

    /// Addresses of the elements, in order.
    pub fn keys(&self) -> Keys {
        Keys {
            next: 0,
            end: self.data.len(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.data.iter()
    }

    /// Overwrite existing positions from a JSON array, appending whatever
    /// runs past the end.
    pub fn update(&mut self, source: impl Into<JsonValue>) -> Result<(), ConfigError> {
        match source.into() {
            JsonValue::Null => Ok(()),
            JsonValue::Array(items) => {
                for (index, item) in items.into_iter().enumerate() {
                    if index < self.data.len() {
                        self.set_index(index, item)?;
                    } else {
                        self.append(item)?;
                    }
                }
                Ok(())
            }
            other => Err(ConfigError::invalid_value(
                self.header.name.clone(),
                raw_text(&other),
                "expected a list",
            )),
        }
    }

    fn check_slot(&self, key: &str, raw: JsonValue) -> Result<Value, ConfigError> {
        let rule = self.header.rules.lookup(&self.header.name, key)?;
        engine::coerce(rule, &self.header.child_path(key), raw)
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        b36_to_int(key)
            .and_then(|i| usize::try_from(i).ok())
            .filter(|i| *i < self.data.len())
    }

    fn invalid_key(&self, key: &str) -> ConfigError {
        ConfigError::InvalidKey {
            container: self.header.name.clone(),
            key: key.to_string(),
        }
    }
}

/// `"0a"` and `"A"` both name element ten; anything unparsable passes through.
fn canonical_key(key: &str) -> Cow<'_, str> {
    match b36_to_int(key) {
        Some(i) => Cow::Owned(int_to_b36(i)),
        None => Cow::Borrowed(key),
    }
}

/// Iterator over the addresses of a [`ConfigList`].
#[derive(Debug, Clone)]
pub struct Keys {
    next: usize,
    end: usize,
}

impl Iterator for Keys {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.next >= self.end {
            return None;
        }
        let key = int_to_b36(self.next as u64);
        self.next += 1;
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.end - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Keys {}
impl FusedIterator for Keys {}

impl<'a> IntoIterator for &'a ConfigList {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl RuledContainer for ConfigList {
    fn header(&self) -> &Header {
        &self.header
    }

    fn materialized_keys(&self) -> Vec<String> {
        self.keys().collect()
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        self.index_of(key).and_then(|i| self.data.get(i))
    }

    fn lookup_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.index_of(key).and_then(|i| self.data.get_mut(i))
    }

    fn get_rule(&self, key: &str) -> Result<&Rule, ConfigError> {
        self.rules().lookup(self.name(), &canonical_key(key))
    }

    fn assign(&mut self, key: &str, raw: JsonValue) -> Result<(), ConfigError> {
        let index = self.index_of(key).ok_or_else(|| self.invalid_key(key))?;
        let value = self.check_slot(&int_to_b36(index as u64), raw)?;
        self.data[index] = value;
        Ok(())
    }

    /// Addresses at or past the end append, so a saved list reloads into an
    /// empty one in order.
    fn load_entry(&mut self, key: &str, raw: JsonValue) -> Result<(), ConfigError> {
        if self.index_of(key).is_some() {
            return self.assign(key, raw);
        }
        if b36_to_int(key).is_none() {
            return Err(self.invalid_key(key));
        }
        self.append(raw).map(drop)
    }

    fn materialize(&mut self, _key: &str) -> Result<String, ConfigError> {
        let key = int_to_b36(self.data.len() as u64);
        let path = self.header.child_path(&key);
        let rule = self.header.rules.lookup(&self.header.name, &key)?;
        let child = engine::empty_child(rule, &path)?;
        tracing::debug!(path = %path, "appended container");
        self.data.push(child);
        Ok(key)
    }

    fn as_dyn(&self) -> &dyn RuledContainer {
        self
    }
}

impl Serialize for ConfigList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.data.iter())
    }
}

impl fmt::Display for ConfigList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_config_string())
    }
}
