//! # crmlink Table
//!
//! Schemaless tabular data and the file formats it moves through.
//!
//! A [`TabularData`] is a named list of rows; each row is an independent
//! [`Map`](crmlink_codec::Map). Tables are saved and loaded through a
//! [`FormatRegistry`] that picks a [`TableFormat`] by file extension:
//!
//! | Extension | Format | Type fidelity |
//! |---|---|---|
//! | `json` | [`JsonFormat`] | all values; dates revived from timestamps |
//! | `xml` | [`XmlFormat`] | scalars inferred from text; `{type, value}` tags kept |
//! | `xlsx` | [`XlsxFormat`] | first sheet; text, numbers, booleans, dates |
//!
//! ## Usage
//!
//! ```no_run
//! use crmlink_codec::Map;
//! use crmlink_table::{load, save, TabularData};
//!
//! let mut table = TabularData::named("account");
//! table.push(Map::new().with("name", "Contoso"));
//!
//! save(&table, "accounts.xml").unwrap();
//! let loaded = load("accounts.xml").unwrap();
//! assert_eq!(loaded, table);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod format;
mod json;
mod table;
mod xlsx;
mod xml;

pub use error::{TableError, TableResult};
pub use format::{load, save, FormatRegistry, TableFormat};
pub use json::JsonFormat;
pub use table::TabularData;
pub use xlsx::XlsxFormat;
pub use xml::XmlFormat;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crmlink_codec::{Map, Value};

    fn sample() -> TabularData {
        let date = Utc.with_ymd_and_hms(2019, 11, 12, 13, 14, 15).unwrap();
        TabularData::from_rows(
            Some("account".to_string()),
            vec![
                Map::new()
                    .with("name", "Contoso")
                    .with("active", true)
                    .with("employees", 42)
                    .with("revenue", 10.25)
                    .with("created", date),
                Map::new().with("name", "Fabrikam").with("active", false),
            ],
        )
    }

    #[test]
    fn save_and_load_every_format() {
        let dir = tempfile::tempdir().unwrap();
        for extension in FormatRegistry::new().extensions() {
            let path = dir.path().join(format!("table.{extension}"));
            save(&sample(), &path).unwrap();
            let loaded = load(&path).unwrap();
            assert_eq!(loaded, sample(), "format {extension}");
        }
    }

    #[test]
    fn extension_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TABLE.JSON");
        save(&sample(), &path).unwrap();
        assert_eq!(load(&path).unwrap(), sample());
    }

    #[test]
    fn custom_format_registration() {
        struct Upper;
        impl TableFormat for Upper {
            fn extension(&self) -> &'static str {
                "up"
            }
            fn serialize(&self, table: &TabularData) -> TableResult<Vec<u8>> {
                Ok(table.name().unwrap_or_default().to_uppercase().into_bytes())
            }
            fn deserialize(&self, bytes: &[u8]) -> TableResult<TabularData> {
                Ok(TabularData::named(String::from_utf8_lossy(bytes)))
            }
        }

        let mut registry = FormatRegistry::empty();
        registry.register(Upper);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.up");
        registry.save(&TabularData::named("abc"), &path).unwrap();
        let loaded = registry.load(&path).unwrap();
        assert_eq!(loaded.name(), Some("ABC"));
        assert_eq!(loaded.rows().first().and_then(|r| r.get("x")), None::<&Value>);
    }
}
