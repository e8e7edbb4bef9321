//! JSON decoder with optional date revival.

use crate::error::CodecResult;
use crate::map::Map;
use crate::text::parse_date;
use crate::value::Value;

/// Decodes JSON into [`Value`]s.
///
/// With date revival enabled, every string that looks like a UTC
/// timestamp is turned back into a [`Value::DateTime`].
#[derive(Debug, Clone, Copy)]
pub struct JsonDecoder {
    revive_dates: bool,
}

impl JsonDecoder {
    /// Create a decoder that revives dates.
    pub fn new() -> Self {
        Self { revive_dates: true }
    }

    /// Create a decoder that leaves every string as text.
    pub fn plain() -> Self {
        Self {
            revive_dates: false,
        }
    }

    /// Decode JSON bytes.
    pub fn decode(&self, bytes: &[u8]) -> CodecResult<Value> {
        let tree: serde_json::Value = serde_json::from_slice(bytes)?;
        Ok(self.convert(tree))
    }

    /// Decode JSON text.
    pub fn decode_str(&self, text: &str) -> CodecResult<Value> {
        self.decode(text.as_bytes())
    }

    /// Convert an already-parsed `serde_json` tree.
    pub fn convert(&self, tree: serde_json::Value) -> Value {
        match tree {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => match self.revive(&s) {
                Some(date) => date,
                None => Value::Text(s),
            },
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(|item| self.convert(item)).collect())
            }
            serde_json::Value::Object(object) => {
                let mut map = Map::with_capacity(object.len());
                for (key, item) in object {
                    map.insert(key, self.convert(item));
                }
                Value::Map(map)
            }
        }
    }

    fn revive(&self, text: &str) -> Option<Value> {
        if self.revive_dates {
            parse_date(text).map(Value::DateTime)
        } else {
            None
        }
    }
}

impl Default for JsonDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode JSON bytes, reviving timestamp strings as dates.
///
/// # Errors
///
/// Returns an error if the bytes are not valid JSON.
pub fn from_json(bytes: &[u8]) -> CodecResult<Value> {
    JsonDecoder::new().decode(bytes)
}

/// Decode JSON text without reviving dates.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON.
pub fn from_json_plain(text: &str) -> CodecResult<Value> {
    JsonDecoder::plain().decode_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::to_json_string;
    use crate::error::CodecError;
    use chrono::{TimeZone, Utc};

    #[test]
    fn decode_scalars() {
        assert_eq!(from_json(b"null").unwrap(), Value::Null);
        assert_eq!(from_json(b"42").unwrap(), Value::Integer(42));
        assert_eq!(from_json(b"4.5").unwrap(), Value::Double(4.5));
        assert_eq!(from_json(b"\"x\"").unwrap(), Value::from("x"));
    }

    #[test]
    fn revives_dates() {
        let value = from_json(br#"{"when":"2016-03-01T10:20:30.000Z","note":"2016"}"#).unwrap();
        let expected = Utc.with_ymd_and_hms(2016, 3, 1, 10, 20, 30).unwrap();
        assert_eq!(value.get("when"), Some(&Value::DateTime(expected)));
        assert_eq!(value.get("note"), Some(&Value::from("2016")));
    }

    #[test]
    fn plain_keeps_strings() {
        let value = from_json_plain(r#""2016-03-01T10:20:30.000Z""#).unwrap();
        assert_eq!(value, Value::from("2016-03-01T10:20:30.000Z"));
    }

    #[test]
    fn date_survives_encode_decode() {
        let date = Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap();
        let text = to_json_string(&Value::DateTime(date)).unwrap();
        assert_eq!(from_json(text.as_bytes()).unwrap(), Value::DateTime(date));
    }

    #[test]
    fn keeps_object_order() {
        let value = from_json(br#"{"b":1,"a":2}"#).unwrap();
        let keys: Vec<_> = value.as_map().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn invalid_json() {
        let err = from_json(b"{not json").unwrap_err();
        assert!(matches!(err, CodecError::Json { .. }));
    }
}
