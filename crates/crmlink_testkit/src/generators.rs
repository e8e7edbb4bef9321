//! Property-based test generators using proptest.
//!
//! Row values are restricted to what every table format carries without
//! loss: markup text is re-typed on load, so generated text always
//! contains an underscore and never reads as a boolean, number or date.

use chrono::{DateTime, TimeZone, Utc};
use crmlink_codec::{Map, Value};
use crmlink_core::RecordId;
use crmlink_table::TabularData;
use proptest::prelude::*;

/// Strategy for record ids.
pub fn record_id_strategy() -> impl Strategy<Value = RecordId> {
    any::<u128>().prop_map(|bits| RecordId::from_uuid(uuid::Uuid::from_u128(bits)))
}

/// Strategy for column names, including characters the name codec
/// escapes.
pub fn column_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_ .-]{0,15}").expect("Invalid regex")
}

/// Strategy for dates with millisecond precision.
pub fn date_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800_000).prop_filter_map("date out of range", |millis| {
        Utc.timestamp_millis_opt(millis).single()
    })
}

/// Strategy for text that stays text after re-typing.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z]{1,6}_[a-zA-Z0-9_]{0,10}").expect("Invalid regex")
}

/// Strategy for non-null scalar values that survive the JSON and markup
/// table formats.
pub fn table_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| Value::Integer(i64::from(n))),
        (-1.0e9f64..1.0e9)
            .prop_filter("whole doubles read back as integers", |d| d.fract() != 0.0)
            .prop_map(Value::Double),
        date_strategy().prop_map(Value::DateTime),
        text_strategy().prop_map(Value::Text),
    ]
}

/// Strategy for one table row.
pub fn row_strategy() -> impl Strategy<Value = Map> {
    prop::collection::btree_map(column_name_strategy(), table_value_strategy(), 1..8)
        .prop_map(|fields| fields.into_iter().collect())
}

/// Strategy for a named table.
pub fn table_strategy() -> impl Strategy<Value = TabularData> {
    prop::collection::vec(row_strategy(), 0..6)
        .prop_map(|rows| TabularData::from_rows(Some("account".to_string()), rows))
}

/// Strategy for conditions objects over simple attribute names.
///
/// Produces every shape the compiler accepts: scalars, lists, null,
/// the not-null marker and operator objects.
pub fn conditions_strategy() -> impl Strategy<Value = Map> {
    let scalar = prop_oneof![
        any::<i32>().prop_map(Value::from),
        text_strategy().prop_map(Value::Text),
        date_strategy().prop_map(Value::DateTime),
    ]
    .boxed();
    let operator = prop::sample::select(vec![
        "$eq", "$neq", "$gt", "$ge", "$le", "$lt", "$like", "$notLike",
    ]);
    let shape = prop_oneof![
        scalar.clone(),
        Just(Value::Null),
        Just(Value::from(crmlink_core::NOT_NULL)),
        prop::collection::vec(scalar.clone(), 1..4).prop_map(Value::Array),
        (operator, scalar.clone()).prop_map(|(op, v)| Value::Map(Map::new().with(op, v))),
        (scalar.clone(), scalar)
            .prop_map(|(lo, hi)| Value::Map(Map::new().with("$between", vec![lo, hi]))),
    ];
    prop::collection::btree_map(
        prop::string::string_regex("[a-z][a-z0-9]{0,11}").expect("Invalid regex"),
        shape,
        1..6,
    )
    .prop_map(|fields| fields.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crmlink_codec::parse_text_value;

    proptest! {
        #[test]
        fn generated_text_is_never_retyped(text in text_strategy()) {
            prop_assert_eq!(parse_text_value(&text), Value::Text(text.clone()));
        }

        #[test]
        fn generated_rows_have_no_nulls(row in row_strategy()) {
            prop_assert!(row.iter().all(|(_, v)| !v.is_null()));
        }
    }
}
