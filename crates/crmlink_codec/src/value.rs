//! Dynamic loosely-typed value.

use crate::map::Map;
use chrono::{DateTime, Utc};

/// Key holding the type name of a tagged value.
pub const TAG_TYPE_KEY: &str = "type";

/// Key holding the payload of a tagged value.
pub const TAG_VALUE_KEY: &str = "value";

/// A loosely-typed value as handled by callers.
///
/// Attribute maps, condition objects and table rows hold `Value`s; the
/// typed wire representation is produced from them using schema metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Double(f64),
    /// Text string.
    Text(String),
    /// Point in time, always UTC.
    DateTime(DateTime<Utc>),
    /// Ordered list of values.
    Array(Vec<Value>),
    /// String-keyed map of values.
    Map(Map),
}

impl Value {
    /// Creates a value explicitly tagged with a type name.
    ///
    /// Tagged values carry type information for payloads whose concrete
    /// type cannot be inferred from their text form.
    pub fn tagged(type_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Value::Map(
            Map::new()
                .with(TAG_TYPE_KEY, Value::Text(type_name.into()))
                .with(TAG_VALUE_KEY, value.into()),
        )
    }

    /// Returns the type name and payload if this is a tagged value.
    pub fn as_tagged(&self) -> Option<(&str, &Value)> {
        let map = self.as_map()?;
        if map.len() != 2 {
            return None;
        }
        let type_name = map.get(TAG_TYPE_KEY)?.as_text()?;
        let value = map.get(TAG_VALUE_KEY)?;
        Some((type_name, value))
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for scalars: booleans, numbers, text and dates.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Integer(_)
                | Value::Double(_)
                | Value::Text(_)
                | Value::DateTime(_)
        )
    }

    /// Returns true for integers and doubles.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Double(_))
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a float; integers are widened.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a date, if it is one.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(d) => Some(*d),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a map, if it is one.
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key in this map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Short name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) | Value::Double(_) => "number",
            Value::Text(_) => "string",
            Value::DateTime(_) => "date",
            Value::Array(_) => "array",
            Value::Map(_) => "object",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::DateTime(d)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}
