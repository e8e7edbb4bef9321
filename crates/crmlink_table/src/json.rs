//! Structured-text table format.

use crate::error::{TableError, TableResult};
use crate::format::TableFormat;
use crate::table::TabularData;
use crmlink_codec::{from_json, to_json_pretty, Map, Value};

const NAME_KEY: &str = "name";
const ROWS_KEY: &str = "rows";

/// JSON document `{"name": ..., "rows": [...]}`.
///
/// Dates are written as `YYYY-MM-DDTHH:MM:SS.sssZ` strings and revived on
/// load.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl TableFormat for JsonFormat {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn serialize(&self, table: &TabularData) -> TableResult<Vec<u8>> {
        let mut document = Map::new();
        if let Some(name) = table.name() {
            document.insert(NAME_KEY, name);
        }
        let rows: Vec<Value> = table.rows().iter().cloned().map(Value::Map).collect();
        document.insert(ROWS_KEY, Value::Array(rows));
        Ok(to_json_pretty(&Value::Map(document))?)
    }

    fn deserialize(&self, bytes: &[u8]) -> TableResult<TabularData> {
        let Value::Map(mut document) = from_json(bytes)? else {
            return Err(TableError::invalid_document("expected a JSON object"));
        };

        let name = match document.remove(NAME_KEY) {
            Some(Value::Text(name)) => Some(name),
            _ => None,
        };
        let rows = match document.remove(ROWS_KEY) {
            Some(Value::Array(rows)) => rows,
            Some(_) => return Err(TableError::invalid_document("\"rows\" is not an array")),
            None => {
                return Err(TableError::invalid_document(
                    "the parsed file doesn't look like a table: \"rows\" is missing",
                ))
            }
        };

        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| match row {
                Value::Map(map) => Ok(map),
                other => Err(TableError::invalid_document(format!(
                    "row {i} is a {}, expected an object",
                    other.type_name()
                ))),
            })
            .collect::<TableResult<Vec<_>>>()?;

        Ok(TabularData::from_rows(name, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    #[test]
    fn serialize_layout() {
        let table = TabularData::from_rows(
            Some("account".to_string()),
            vec![Map::new().with("name", "a")],
        );
        let text = String::from_utf8(JsonFormat.serialize(&table).unwrap()).unwrap();
        assert_eq!(
            text,
            "{\n    \"name\": \"account\",\n    \"rows\": [\n        {\n            \"name\": \"a\"\n        }\n    ]\n}"
        );
    }

    #[test]
    fn roundtrip_types() {
        let date = Utc.with_ymd_and_hms(2017, 5, 4, 3, 2, 1).unwrap();
        let table = TabularData::from_rows(
            Some("contact".to_string()),
            vec![
                Map::new()
                    .with("text", "hello")
                    .with("flag", true)
                    .with("count", 3)
                    .with("amount", 12.75)
                    .with("when", date),
                Map::new().with("other", Value::Null),
            ],
        );
        let bytes = JsonFormat.serialize(&table).unwrap();
        assert_eq!(JsonFormat.deserialize(&bytes).unwrap(), table);
    }

    #[test]
    fn unnamed_table() {
        let table = TabularData::from_rows(None, vec![]);
        let bytes = JsonFormat.serialize(&table).unwrap();
        let loaded = JsonFormat.deserialize(&bytes).unwrap();
        assert_eq!(loaded.name(), None);
        assert!(loaded.is_empty());
    }

    #[test]
    fn rejects_documents_without_rows() {
        let err = JsonFormat.deserialize(br#"{"name":"x"}"#).unwrap_err();
        assert!(matches!(err, TableError::InvalidDocument { .. }));

        let err = JsonFormat.deserialize(b"[1,2]").unwrap_err();
        assert!(matches!(err, TableError::InvalidDocument { .. }));

        let err = JsonFormat.deserialize(br#"{"rows":[1]}"#).unwrap_err();
        assert!(err.to_string().contains("row 0"));
    }

    fn cell() -> impl Strategy<Value = Value> {
        let scalar = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Integer),
            (-1.0e9f64..1.0e9)
                .prop_filter("whole doubles", |d| d.fract() != 0.0)
                .prop_map(Value::Double),
            (0i64..4_102_444_800_000)
                .prop_filter_map("date out of range", |ms| Utc.timestamp_millis_opt(ms).single())
                .prop_map(Value::DateTime),
            "[a-zA-Z ,\"\\\\]{0,12}".prop_map(Value::Text),
        ];
        scalar.prop_recursive(2, 8, 3, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..3)
                    .prop_map(|fields| Value::Map(fields.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn generated_tables_round_trip(
            name in proptest::option::of("[a-z]{1,10}"),
            rows in prop::collection::vec(
                prop::collection::btree_map("[a-zA-Z][a-zA-Z0-9_ ]{0,12}", cell(), 0..6),
                0..5,
            ),
        ) {
            let rows: Vec<Map> = rows.into_iter().map(|r| r.into_iter().collect()).collect();
            let table = TabularData::from_rows(name, rows);
            let bytes = JsonFormat.serialize(&table).unwrap();
            prop_assert_eq!(JsonFormat.deserialize(&bytes).unwrap(), table);
        }
    }
}
