//! # crmlink Codec
//!
//! Loosely-typed values and their text encodings.
//!
//! This crate provides:
//! - [`Value`] and the insertion-ordered [`Map`] used for attribute maps,
//!   condition objects and table rows
//! - JSON encoding, and JSON decoding that revives UTC timestamps as dates
//! - Text rendering and inference used by the markup table format and by
//!   query markup
//! - The name codec that makes arbitrary field names safe as element names
//!
//! ## Usage
//!
//! ```
//! use crmlink_codec::{from_json, to_json_string, Map, Value};
//!
//! let row = Map::new().with("name", "Contoso").with("employees", 12);
//! let text = to_json_string(&Value::Map(row.clone())).unwrap();
//!
//! let decoded = from_json(text.as_bytes()).unwrap();
//! assert_eq!(decoded, Value::Map(row));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod map;
mod name;
mod text;
mod value;

pub use decoder::{from_json, from_json_plain, JsonDecoder};
pub use encoder::{to_json_pretty, to_json_string, to_json_value};
pub use error::{CodecError, CodecResult};
pub use map::Map;
pub use name::{decode_name, encode_name};
pub use text::{
    format_date, format_double, format_query_date, format_query_text, format_table_text,
    parse_calendar_date, parse_date, parse_number, parse_text_value, QUERY_DATE_FORMAT,
    TABLE_DATE_FORMAT,
};
pub use value::{Value, TAG_TYPE_KEY, TAG_VALUE_KEY};
