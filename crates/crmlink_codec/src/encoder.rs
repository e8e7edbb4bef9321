//! JSON encoder.

use crate::error::{CodecError, CodecResult};
use crate::text::format_date;
use crate::value::Value;
use serde::Serialize;

/// Indentation used by [`to_json_pretty`].
const PRETTY_INDENT: &[u8] = b"    ";

/// Convert a value into a `serde_json` tree.
///
/// Dates become table-format timestamp strings. Map key order is kept.
///
/// # Errors
///
/// Returns an error if the value contains a NaN or infinite double.
pub fn to_json_value(value: &Value) -> CodecResult<serde_json::Value> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(n) => serde_json::Value::from(*n),
        Value::Double(d) => serde_json::Number::from_f64(*d)
            .map(serde_json::Value::Number)
            .ok_or_else(|| CodecError::unsupported_type(format!("non-finite double {d}")))?,
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::DateTime(d) => serde_json::Value::String(format_date(d)),
        Value::Array(items) => serde_json::Value::Array(
            items
                .iter()
                .map(to_json_value)
                .collect::<CodecResult<Vec<_>>>()?,
        ),
        Value::Map(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                object.insert(key.to_string(), to_json_value(item)?);
            }
            serde_json::Value::Object(object)
        }
    })
}

/// Encode a value as compact JSON text.
///
/// # Errors
///
/// Returns an error if the value cannot be represented in JSON.
pub fn to_json_string(value: &Value) -> CodecResult<String> {
    Ok(serde_json::to_string(&to_json_value(value)?)?)
}

/// Encode a value as JSON bytes indented by four spaces.
///
/// # Errors
///
/// Returns an error if the value cannot be represented in JSON.
pub fn to_json_pretty(value: &Value) -> CodecResult<Vec<u8>> {
    let tree = to_json_value(value)?;
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(PRETTY_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    tree.serialize(&mut serializer)?;
    Ok(buffer)
}

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json_value(self)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Map;
    use chrono::{TimeZone, Utc};

    #[test]
    fn encode_scalars() {
        assert_eq!(to_json_string(&Value::Null).unwrap(), "null");
        assert_eq!(to_json_string(&Value::Bool(true)).unwrap(), "true");
        assert_eq!(to_json_string(&Value::Integer(-3)).unwrap(), "-3");
        assert_eq!(to_json_string(&Value::Double(1.5)).unwrap(), "1.5");
        assert_eq!(to_json_string(&Value::from("a\"b")).unwrap(), r#""a\"b""#);
    }

    #[test]
    fn encode_dates_as_timestamps() {
        let date = Utc.with_ymd_and_hms(2016, 3, 1, 10, 20, 30).unwrap();
        assert_eq!(
            to_json_string(&Value::DateTime(date)).unwrap(),
            r#""2016-03-01T10:20:30.000Z""#
        );
    }

    #[test]
    fn encode_keeps_key_order() {
        let map = Map::new().with("zeta", 1).with("alpha", 2);
        assert_eq!(
            to_json_string(&Value::Map(map)).unwrap(),
            r#"{"zeta":1,"alpha":2}"#
        );
    }

    #[test]
    fn pretty_uses_four_spaces() {
        let map = Map::new().with("a", 1);
        let bytes = to_json_pretty(&Value::Map(map)).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "{\n    \"a\": 1\n}");
    }

    #[test]
    fn non_finite_doubles_fail() {
        let err = to_json_string(&Value::Double(f64::NAN)).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedType { .. }));
    }

    #[test]
    fn serialize_through_serde() {
        let value = Value::from(vec![1, 2]);
        assert_eq!(serde_json::to_string(&value).unwrap(), "[1,2]");
    }
}
