//! Attribute value conversion by attribute type.

use super::Converter;
use crate::conditions::{Condition, Filter};
use crate::error::{CoreError, CoreResult};
use crate::id::RecordId;
use crate::metadata::{AttributeMetadata, AttributeType};
use crate::query::{Projection, Query};
use crate::typed::{EntityReference, Record, TypedValue};
use chrono::{DateTime, Utc};
use crmlink_codec::{
    format_date, format_double, format_query_text, parse_calendar_date, parse_date, Map, Value,
};
use tracing::debug;

const REFERENCE_ID_KEY: &str = "id";
const REFERENCE_TYPE_KEY: &str = "type";

impl Converter<'_> {
    /// Converts one loose value to the attribute's type.
    ///
    /// Null converts to [`TypedValue::Null`] for every type. A value tagged
    /// `{type, value}` is converted by its inner value.
    ///
    /// # Errors
    ///
    /// Returns a conversion error naming the attribute, the value and both
    /// types when the value does not fit. Reference values can also fail
    /// with an ambiguous target, or with no or several records matching
    /// a name.
    pub fn convert_attribute(
        &self,
        attribute: &AttributeMetadata,
        value: &Value,
    ) -> CoreResult<TypedValue> {
        let value = value.as_tagged().map_or(value, |(_, inner)| inner);
        if value.is_null() {
            return Ok(TypedValue::Null);
        }

        match attribute.attribute_type {
            AttributeType::String | AttributeType::Memo => {
                to_text(attribute, value).map(TypedValue::String)
            }
            AttributeType::DateTime => to_datetime(attribute, value).map(TypedValue::DateTime),
            AttributeType::Lookup | AttributeType::Customer | AttributeType::Owner => {
                self.to_reference(attribute, value).map(TypedValue::Reference)
            }
            AttributeType::Picklist => to_choice(attribute, value).map(TypedValue::Choice),
            AttributeType::Boolean => to_boolean(attribute, value).map(TypedValue::Boolean),
            AttributeType::PartyList => self.to_party_list(attribute, value).map(TypedValue::PartyList),
            AttributeType::Money => to_number(attribute, value).map(TypedValue::Money),
            AttributeType::Decimal => to_number(attribute, value).map(TypedValue::Decimal),
            _ => Ok(TypedValue::Raw(value.clone())),
        }
    }

    fn to_reference(
        &self,
        attribute: &AttributeMetadata,
        value: &Value,
    ) -> CoreResult<EntityReference> {
        match value {
            Value::Map(map) => {
                let id = map
                    .get_ignore_case(REFERENCE_ID_KEY)
                    .and_then(|(_, v)| v.as_text())
                    .and_then(|text| RecordId::parse(text).ok())
                    .ok_or_else(|| mismatch(attribute, value))?;
                let target = match map
                    .get_ignore_case(REFERENCE_TYPE_KEY)
                    .and_then(|(_, v)| v.as_text())
                {
                    Some(target) => target.to_lowercase(),
                    None => single_target(attribute, value)?,
                };
                Ok(EntityReference::new(target, id))
            }
            Value::Text(text) => {
                let target = single_target(attribute, value)?;
                match RecordId::parse(text) {
                    Ok(id) => Ok(EntityReference::new(target, id)),
                    Err(_) if self.config.resolve_lookups_by_name => {
                        self.resolve_by_name(&target, text)
                    }
                    Err(_) => Err(mismatch(attribute, value)),
                }
            }
            other => Err(mismatch(attribute, other)),
        }
    }

    /// Finds the single `target` record whose primary name is `name`.
    fn resolve_by_name(&self, target: &str, name: &str) -> CoreResult<EntityReference> {
        let metadata = self.metadata(target)?;
        let id_attribute = metadata
            .primary_id_attribute
            .clone()
            .ok_or_else(|| CoreError::MissingPrimaryId {
                entity: target.to_string(),
            })?;
        let name_attribute = metadata.primary_name_attribute.clone().ok_or_else(|| {
            CoreError::attribute_not_found(target, "primary name attribute")
        })?;

        let query = Query::new(target)
            .with_projection(Projection::columns([id_attribute.as_str()]))
            .with_filter(Filter::and(vec![Condition::equal(name_attribute, name)]));
        debug!(entity = target, name, "resolving reference by name");
        let records = self.bridge.retrieve_multiple(&query.to_markup())?;

        match records.as_slice() {
            [] => Err(CoreError::NoRecordsFound {
                entity: target.to_string(),
                value: name.to_string(),
            }),
            [record] => {
                let id = record
                    .id
                    .or_else(|| record.get(&id_attribute).and_then(TypedValue::as_record_id))
                    .ok_or_else(|| CoreError::MissingPrimaryId {
                        entity: target.to_string(),
                    })?;
                Ok(EntityReference::new(target, id).with_name(name))
            }
            _ => Err(CoreError::MultipleRecordsFound {
                entity: target.to_string(),
                value: name.to_string(),
            }),
        }
    }

    fn to_party_list(&self, attribute: &AttributeMetadata, value: &Value) -> CoreResult<Vec<Record>> {
        let items = value.as_array().ok_or_else(|| mismatch(attribute, value))?;
        let party_attribute = self.config.party_attribute.as_str();
        items
            .iter()
            .map(|item| {
                let attributes = match item {
                    Value::Map(map) if map.get_ignore_case(party_attribute).is_some() => {
                        map.clone()
                    }
                    other => Map::new().with(party_attribute, other.clone()),
                };
                self.to_record(&self.config.party_entity, &attributes)
            })
            .collect()
    }
}

fn mismatch(attribute: &AttributeMetadata, value: &Value) -> CoreError {
    CoreError::conversion(
        attribute.logical_name.as_str(),
        format_query_text(value),
        value.type_name(),
        attribute.attribute_type.as_str(),
    )
}

fn single_target(attribute: &AttributeMetadata, value: &Value) -> CoreResult<String> {
    match attribute.targets.as_slice() {
        [target] => Ok(target.to_lowercase()),
        [] => Err(mismatch(attribute, value)),
        _ => Err(CoreError::AmbiguousTarget {
            attribute: attribute.logical_name.clone(),
        }),
    }
}

fn to_text(attribute: &AttributeMetadata, value: &Value) -> CoreResult<String> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Integer(n) => Ok(n.to_string()),
        Value::Double(d) => Ok(format_double(*d)),
        Value::DateTime(d) => Ok(format_date(d)),
        other => Err(mismatch(attribute, other)),
    }
}

fn to_datetime(attribute: &AttributeMetadata, value: &Value) -> CoreResult<DateTime<Utc>> {
    match value {
        Value::DateTime(d) => Ok(*d),
        Value::Text(s) => parse_date(s)
            .or_else(|| parse_calendar_date(s))
            .or_else(|| {
                DateTime::parse_from_rfc3339(s.trim())
                    .ok()
                    .map(|d| d.with_timezone(&Utc))
            })
            .ok_or_else(|| mismatch(attribute, value)),
        other => Err(mismatch(attribute, other)),
    }
}

fn to_choice(attribute: &AttributeMetadata, value: &Value) -> CoreResult<i32> {
    match value {
        Value::Integer(n) => i32::try_from(*n).map_err(|_| mismatch(attribute, value)),
        #[allow(clippy::cast_possible_truncation)]
        Value::Double(d) if d.fract() == 0.0 && d.abs() <= f64::from(i32::MAX) => Ok(*d as i32),
        Value::Text(label) => attribute
            .option_by_label(label)
            .map(|option| option.value)
            .ok_or_else(|| mismatch(attribute, value)),
        other => Err(mismatch(attribute, other)),
    }
}

fn to_boolean(attribute: &AttributeMetadata, value: &Value) -> CoreResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Integer(n) => Ok(*n != 0),
        Value::Double(d) => Ok(*d != 0.0),
        Value::Text(text) => {
            let labels = attribute.boolean_labels();
            let text = text.trim();
            let is = |candidate: &str| text.eq_ignore_ascii_case(candidate);
            if is(&labels.true_label) || is("yes") || is("true") {
                Ok(true)
            } else if is(&labels.false_label) || is("no") || is("false") {
                Ok(false)
            } else {
                Err(mismatch(attribute, value))
            }
        }
        other => Err(mismatch(attribute, other)),
    }
}

fn to_number(attribute: &AttributeMetadata, value: &Value) -> CoreResult<f64> {
    value.as_f64().ok_or_else(|| mismatch(attribute, value))
}
