//! Scalar values and the row field view
//!
//! This module defines the scalar types that move between the drivers and the
//! caller, and [`Row`], the ordered field-name to value view used as the one
//! bind input shape across the crate. Adapters produce rows: result decoding
//! builds them from fetched data, [`Row::from_object`] builds them from any
//! serializable struct.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::error::{DatabaseError, Result};

/// Scalar value that can be stored in or read from a database column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// 64-bit floating point
    Double(f64),
    /// Text value
    Text(String),
    /// Binary data
    Bytes(Vec<u8>),
}

impl Value {
    /// Get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            Value::Text(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Get the value as an i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Double(v) => Some(*v as i64),
            Value::Text(s) => s.parse().ok(),
            Value::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get the value as an f64
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Get the value as a string slice (zero-copy, text values only)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the value as a string (with conversion)
    pub fn as_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(v) => (*v as i64).to_string(),
            Value::Int(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }

    /// Get the value as bytes (zero-copy)
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True when the value counts as an empty primary key: null, zero, or
    /// blank/zero text
    pub fn is_empty_key(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Int(v) => *v == 0,
            Value::Text(s) => s.is_empty() || s == "0",
            _ => false,
        }
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Convert into the JSON form used by the typed-object bridge
    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Int(v) => serde_json::Value::Number((*v).into()),
            Value::Double(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => {
                serde_json::Value::Array(b.iter().map(|byte| (*byte).into()).collect())
            }
        }
    }

    /// Convert a scalar JSON value; arrays and objects yield `None`
    pub(crate) fn from_json(json: &serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(v) => Some(Value::Bool(*v)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int(i))
                } else {
                    n.as_f64().map(Value::Double)
                }
            }
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Text(v.to_string()),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Value::Text(v.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Ordered field-name to value view of one database row
///
/// Field order is retained from whatever produced the row (column order for
/// fetched rows, declaration order for rows adapted from structs), so SQL
/// built from a row lists fields in a stable, predictable order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    names: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Row::default()
    }

    /// Build a row from name/value pairs, keeping pair order
    pub fn from_pairs<N, V, I>(pairs: I) -> Self
    where
        N: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (N, V)>,
    {
        let mut row = Row::new();
        for (name, value) in pairs {
            row.set(name, value);
        }
        row
    }

    /// Adapt a serializable struct or map into a row
    ///
    /// Array- and object-valued fields are excluded from the view; fields the
    /// type marks with serde skip attributes never reach it at all. Fails
    /// with a bind error when the type does not serialize to a map shape.
    pub fn from_object<T: Serialize>(obj: &T) -> Result<Row> {
        let json = serde_json::to_value(obj)
            .map_err(|e| DatabaseError::bind(format!("source does not serialize: {e}")))?;
        let map = match json {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(DatabaseError::bind(format!(
                    "bind source must be a map or struct, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut row = Row::new();
        for (name, value) in &map {
            if let Some(value) = Value::from_json(value) {
                row.set(name.clone(), value);
            }
        }
        Ok(row)
    }

    /// Project the row onto a deserializable type
    pub fn to_object<T: DeserializeOwned>(&self) -> Result<T> {
        let mut map = serde_json::Map::with_capacity(self.names.len());
        for (name, value) in self.iter() {
            map.insert(name.to_string(), value.to_json());
        }
        serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| DatabaseError::bind(format!("row does not fit target type: {e}")))
    }

    /// Set a field, replacing an existing value or appending a new field
    pub fn set<N: Into<String>, V: Into<Value>>(&mut self, name: N, value: V) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.values[idx] = value.into(),
            None => {
                self.names.push(name);
                self.values.push(value.into());
            }
        }
    }

    /// Get a field value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.position(name).map(|idx| &self.values[idx])
    }

    /// True when the row has a field with this name
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Field names in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Field values in order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterate fields in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when the row has no fields
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Row::from_pairs(iter)
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
