//! Typed records exchanged with the remote bridge.

use crate::id::RecordId;
use chrono::{DateTime, Utc};
use crmlink_codec::Value;

/// Pointer to another record.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityReference {
    /// Target entity logical name.
    pub logical_name: String,
    /// Target record id.
    pub id: RecordId,
    /// Display text of the target, when the platform returns it.
    pub name: Option<String>,
}

impl EntityReference {
    /// Creates a reference without display text.
    pub fn new(logical_name: impl Into<String>, id: RecordId) -> Self {
        Self {
            logical_name: logical_name.into().to_lowercase(),
            id,
            name: None,
        }
    }

    /// Sets the display text.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Attribute value in the platform's type system.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// Explicit null; clears the attribute on write.
    Null,
    /// Text.
    String(String),
    /// Whole number.
    Integer(i64),
    /// Floating point number.
    Double(f64),
    /// Two-option value.
    Boolean(bool),
    /// Date and time, UTC.
    DateTime(DateTime<Utc>),
    /// Reference to another record.
    Reference(EntityReference),
    /// Numeric code of a choice.
    Choice(i32),
    /// Currency amount.
    Money(f64),
    /// Decimal number.
    Decimal(f64),
    /// Activity parties.
    PartyList(Vec<Record>),
    /// Value of a linked entity's attribute, as returned by joined queries.
    Aliased {
        /// Linked entity logical name.
        entity: String,
        /// Attribute on the linked entity.
        attribute: String,
        /// The wrapped value.
        value: Box<TypedValue>,
    },
    /// Value passed through without conversion.
    Raw(Value),
}

impl TypedValue {
    /// Returns the referenced record, if this is a reference.
    pub fn as_reference(&self) -> Option<&EntityReference> {
        match self {
            Self::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the choice code, if this is a choice.
    pub fn as_choice(&self) -> Option<i32> {
        match self {
            Self::Choice(c) => Some(*c),
            _ => None,
        }
    }

    /// Returns the record id held by this value: a reference's id, or a
    /// text or raw value that parses as an identifier.
    pub fn as_record_id(&self) -> Option<RecordId> {
        match self {
            Self::Reference(r) => Some(r.id),
            Self::String(s) => RecordId::parse(s).ok(),
            Self::Raw(v) => v.as_text().and_then(|s| RecordId::parse(s).ok()),
            _ => None,
        }
    }
}

impl From<Value> for TypedValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Integer(n) => Self::Integer(n),
            Value::Double(d) => Self::Double(d),
            Value::Text(s) => Self::String(s),
            Value::DateTime(d) => Self::DateTime(d),
            other => Self::Raw(other),
        }
    }
}

impl From<EntityReference> for TypedValue {
    fn from(reference: EntityReference) -> Self {
        Self::Reference(reference)
    }
}

/// A record as sent to and received from the remote bridge.
///
/// Attributes are a list of pairs rather than a map; setting an existing
/// attribute replaces it in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Entity logical name.
    pub logical_name: String,
    /// Record id, when known.
    pub id: Option<RecordId>,
    /// Attribute values in insertion order.
    pub attributes: Vec<(String, TypedValue)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new(logical_name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into().to_lowercase(),
            id: None,
            attributes: Vec::new(),
        }
    }

    /// Sets the record id.
    #[must_use]
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets an attribute and returns the record.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets an attribute, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<TypedValue>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Gets an attribute value.
    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Removes an attribute.
    pub fn remove(&mut self, name: &str) -> Option<TypedValue> {
        let index = self.attributes.iter().position(|(n, _)| n == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// Returns true if the record has the attribute.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if the record has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
