//! Whole-record conversion in both directions.

use super::Converter;
use crate::error::{CoreError, CoreResult};
use crate::typed::{Record, TypedValue};
use crmlink_codec::{Map, Value};
use tracing::warn;

/// Operation that changes reserved state attributes.
const STATE_OPERATION: &str = "set_state";

impl Converter<'_> {
    /// Converts an attribute map into a typed record of `entity`.
    ///
    /// Names are matched by logical name, then by display label, ignoring
    /// case. Attributes missing from the metadata are skipped with a
    /// warning. When the primary id attribute is present, its value also
    /// becomes the record id.
    ///
    /// # Errors
    ///
    /// Fails on an empty entity name, on a state or status attribute, and
    /// on any value that does not convert.
    pub fn to_record(&self, entity: &str, attributes: &Map) -> CoreResult<Record> {
        let entity = entity.trim().to_lowercase();
        if entity.is_empty() {
            return Err(CoreError::validation("entity name is required"));
        }
        let metadata = self.metadata(&entity)?;
        let mut record = Record::new(entity.as_str());

        for (name, value) in attributes {
            let Some(attribute) = metadata.find_attribute(&name.to_lowercase()) else {
                warn!(entity = %entity, attribute = name, "attribute not found in metadata, skipping");
                continue;
            };
            if attribute.attribute_type.is_reserved() {
                return Err(CoreError::ReservedAttribute {
                    entity,
                    attribute: attribute.logical_name.clone(),
                    operation: STATE_OPERATION.to_string(),
                });
            }
            let typed = self.convert_attribute(attribute, value)?;
            record.insert(attribute.logical_name.as_str(), typed);
        }

        if let Some(primary_id) = metadata.primary_id_attribute.as_deref() {
            match record.get(primary_id) {
                None | Some(TypedValue::Null) => {}
                Some(value) => {
                    let id = value.as_record_id().ok_or_else(|| {
                        CoreError::validation(format!(
                            "invalid GUID value for '{primary_id}' of entity '{entity}'"
                        ))
                    })?;
                    record.id = Some(id);
                }
            }
        }
        Ok(record)
    }

    /// Flattens a record using the configured alias depth bound.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AliasDepthExceeded`] for aliased values nested
    /// deeper than the bound.
    pub fn from_record(&self, record: &Record) -> CoreResult<Map> {
        flatten_record(record, self.config.max_alias_depth)
    }
}

/// Flattens a typed record into a loose attribute map.
///
/// A reference `r` becomes three entries: `r` (the id), `r_name` and
/// `r_type`. Choices become their numeric code, money and decimal values
/// become numbers, and party lists become arrays of flattened records.
/// Aliased values are unwrapped up to `max_alias_depth` levels.
///
/// # Errors
///
/// Returns [`CoreError::AliasDepthExceeded`] for deeper nesting.
pub fn flatten_record(record: &Record, max_alias_depth: usize) -> CoreResult<Map> {
    let mut out = Map::with_capacity(record.len());
    for (name, value) in &record.attributes {
        flatten_into(&mut out, name, value, 0, max_alias_depth)?;
    }
    Ok(out)
}

fn flatten_into(
    out: &mut Map,
    name: &str,
    value: &TypedValue,
    depth: usize,
    max_depth: usize,
) -> CoreResult<()> {
    match value {
        TypedValue::Reference(reference) => {
            out.insert(name, Value::from(reference.id));
            out.insert(format!("{name}_name"), reference.name.clone());
            out.insert(format!("{name}_type"), reference.logical_name.as_str());
        }
        TypedValue::Aliased { value, .. } => {
            if depth >= max_depth {
                return Err(CoreError::AliasDepthExceeded { depth: max_depth });
            }
            flatten_into(out, name, value, depth + 1, max_depth)?;
        }
        other => {
            out.insert(name, plain_value(other, depth, max_depth)?);
        }
    }
    Ok(())
}

fn plain_value(value: &TypedValue, depth: usize, max_depth: usize) -> CoreResult<Value> {
    Ok(match value {
        TypedValue::Null => Value::Null,
        TypedValue::String(s) => Value::Text(s.clone()),
        TypedValue::Integer(n) => Value::Integer(*n),
        TypedValue::Double(d) | TypedValue::Money(d) | TypedValue::Decimal(d) => Value::Double(*d),
        TypedValue::Boolean(b) => Value::Bool(*b),
        TypedValue::DateTime(d) => Value::DateTime(*d),
        TypedValue::Choice(code) => Value::Integer(i64::from(*code)),
        TypedValue::Reference(reference) => Value::from(reference.id),
        TypedValue::PartyList(parties) => Value::Array(
            parties
                .iter()
                .map(|party| flatten_record(party, max_depth).map(Value::Map))
                .collect::<CoreResult<Vec<_>>>()?,
        ),
        TypedValue::Aliased { value, .. } => {
            if depth >= max_depth {
                return Err(CoreError::AliasDepthExceeded { depth: max_depth });
            }
            plain_value(value, depth + 1, max_depth)?
        }
        TypedValue::Raw(v) => v.clone(),
    })
}
