use std::fmt;

use serde::ser::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::dict::ConfigDict;
use crate::engine::RuledContainer;
use crate::list::ConfigList;

/// A checked value stored in a container.
///
/// Scalars are the output of a rule's checker; containers are nested
/// dictionaries or lists that carry their own rules.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Dict(ConfigDict),
    List(ConfigList),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&ConfigDict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut ConfigDict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ConfigList> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut ConfigList> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Dict(_) | Value::List(_))
    }

    /// View a nested dictionary or list through the shared container trait.
    pub fn as_container(&self) -> Option<&dyn RuledContainer> {
        match self {
            Value::Dict(d) => Some(d),
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut dyn RuledContainer> {
        match self {
            Value::Dict(d) => Some(d),
            Value::List(l) => Some(l),
            _ => None,
        }
    }
}

/// Scalars render as the text the codec writes; containers render as their
/// full serialized section tree.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Dict(d) => f.write_str(&d.to_config_string()),
            Value::List(l) => f.write_str(&l.to_config_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Dict(d) => d.serialize(serializer),
            Value::List(l) => l.serialize(serializer),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Text of a raw input value as shown in error messages and compared against
/// fixed value-sets. Strings are unquoted.
pub(crate) fn raw_text(raw: &JsonValue) -> String {
    match raw {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
