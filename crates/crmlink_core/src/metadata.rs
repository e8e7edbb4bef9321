//! Entity and attribute schema metadata.
//!
//! Metadata is what the remote bridge returns for "describe entity"; it is
//! deserialized from JSON and then only read. Builders exist for tests and
//! fixtures.

use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type code of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    /// Single-line text.
    String,
    /// Multi-line text.
    Memo,
    /// 32-bit integer.
    Integer,
    /// Floating point number.
    Double,
    /// 64-bit integer.
    BigInt,
    /// Decimal number.
    Decimal,
    /// Currency amount.
    Money,
    /// Date and time.
    DateTime,
    /// Two-option attribute.
    Boolean,
    /// Choice from a labeled set of numeric codes.
    #[serde(alias = "Choice")]
    Picklist,
    /// Reference to an account or contact.
    Customer,
    /// Reference to the owning user or team.
    Owner,
    /// Reference to another record.
    Lookup,
    /// List of activity parties.
    PartyList,
    /// Identifier.
    Uniqueidentifier,
    /// Entity logical name.
    EntityName,
    /// State code; changed only through a state transition.
    State,
    /// Status reason; changed only through a state transition.
    Status,
    /// Managed property.
    ManagedProperty,
    /// Calendar rules.
    CalendarRules,
    /// Virtual attribute.
    Virtual,
}

impl AttributeType {
    /// Returns the type code name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Memo => "Memo",
            Self::Integer => "Integer",
            Self::Double => "Double",
            Self::BigInt => "BigInt",
            Self::Decimal => "Decimal",
            Self::Money => "Money",
            Self::DateTime => "DateTime",
            Self::Boolean => "Boolean",
            Self::Picklist => "Picklist",
            Self::Customer => "Customer",
            Self::Owner => "Owner",
            Self::Lookup => "Lookup",
            Self::PartyList => "PartyList",
            Self::Uniqueidentifier => "Uniqueidentifier",
            Self::EntityName => "EntityName",
            Self::State => "State",
            Self::Status => "Status",
            Self::ManagedProperty => "ManagedProperty",
            Self::CalendarRules => "CalendarRules",
            Self::Virtual => "Virtual",
        }
    }

    /// Lookup, Customer and Owner.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Lookup | Self::Customer | Self::Owner)
    }

    /// State and Status, which the generic write path refuses.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::State | Self::Status)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labeled choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionMetadata {
    /// Display label.
    pub label: String,
    /// Numeric code.
    pub value: i32,
}

impl OptionMetadata {
    /// Creates an option.
    pub fn new(label: impl Into<String>, value: i32) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Labels of a two-option attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanOptions {
    /// Label of the true option.
    pub true_label: String,
    /// Label of the false option.
    pub false_label: String,
}

impl Default for BooleanOptions {
    fn default() -> Self {
        Self {
            true_label: "Yes".to_string(),
            false_label: "No".to_string(),
        }
    }
}

/// Schema of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMetadata {
    /// Logical name, lower-case.
    pub logical_name: String,
    /// Type code.
    pub attribute_type: AttributeType,
    /// Entities a reference attribute may point to.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Choices, in order.
    #[serde(default)]
    pub options: Vec<OptionMetadata>,
    /// Labels for boolean attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_options: Option<BooleanOptions>,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl AttributeMetadata {
    /// Creates attribute metadata.
    pub fn new(logical_name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            logical_name: logical_name.into().to_lowercase(),
            attribute_type,
            targets: Vec::new(),
            options: Vec::new(),
            boolean_options: None,
            display_name: None,
        }
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_display_name(mut self, label: impl Into<String>) -> Self {
        self.display_name = Some(label.into());
        self
    }

    /// Sets the reference targets.
    #[must_use]
    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(|t| t.into().to_lowercase()).collect();
        self
    }

    /// Adds a choice.
    #[must_use]
    pub fn with_option(mut self, label: impl Into<String>, value: i32) -> Self {
        self.options.push(OptionMetadata::new(label, value));
        self
    }

    /// Sets the boolean labels.
    #[must_use]
    pub fn with_boolean_labels(
        mut self,
        true_label: impl Into<String>,
        false_label: impl Into<String>,
    ) -> Self {
        self.boolean_options = Some(BooleanOptions {
            true_label: true_label.into(),
            false_label: false_label.into(),
        });
        self
    }

    /// Finds a choice by label, ignoring case.
    pub fn option_by_label(&self, label: &str) -> Option<&OptionMetadata> {
        let label = label.to_lowercase();
        self.options.iter().find(|o| o.label.to_lowercase() == label)
    }

    /// Finds a choice by numeric code.
    pub fn option_by_value(&self, value: i32) -> Option<&OptionMetadata> {
        self.options.iter().find(|o| o.value == value)
    }

    /// Boolean labels, falling back to `Yes` / `No`.
    pub fn boolean_labels(&self) -> BooleanOptions {
        self.boolean_options.clone().unwrap_or_default()
    }
}

/// Schema of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    /// Logical name, lower-case.
    pub logical_name: String,
    /// Primary id attribute.
    #[serde(default)]
    pub primary_id_attribute: Option<String>,
    /// Primary name attribute.
    #[serde(default)]
    pub primary_name_attribute: Option<String>,
    /// Whether the entity is an activity.
    #[serde(default)]
    pub is_activity: bool,
    /// Attributes, unique by logical name.
    #[serde(default)]
    pub attributes: Vec<AttributeMetadata>,
}

impl EntityMetadata {
    /// Creates entity metadata with no attributes.
    pub fn new(logical_name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into().to_lowercase(),
            primary_id_attribute: None,
            primary_name_attribute: None,
            is_activity: false,
            attributes: Vec::new(),
        }
    }

    /// Parses metadata returned by the remote bridge and normalizes the
    /// casing of every logical name.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the text is not valid metadata JSON.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        let metadata: Self = serde_json::from_str(text).map_err(crmlink_codec::CodecError::from)?;
        Ok(metadata.normalized())
    }

    /// Serializes the metadata to JSON.
    ///
    /// # Errors
    ///
    /// Returns a codec error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self).map_err(crmlink_codec::CodecError::from)?)
    }

    fn normalized(mut self) -> Self {
        self.logical_name = self.logical_name.to_lowercase();
        self.primary_id_attribute = self.primary_id_attribute.map(|a| a.to_lowercase());
        self.primary_name_attribute = self.primary_name_attribute.map(|a| a.to_lowercase());
        for attribute in &mut self.attributes {
            attribute.logical_name = attribute.logical_name.to_lowercase();
            for target in &mut attribute.targets {
                *target = target.to_lowercase();
            }
        }
        self
    }

    /// Sets the primary id attribute.
    #[must_use]
    pub fn with_primary_id(mut self, attribute: impl Into<String>) -> Self {
        self.primary_id_attribute = Some(attribute.into().to_lowercase());
        self
    }

    /// Sets the primary name attribute.
    #[must_use]
    pub fn with_primary_name(mut self, attribute: impl Into<String>) -> Self {
        self.primary_name_attribute = Some(attribute.into().to_lowercase());
        self
    }

    /// Marks the entity as an activity.
    #[must_use]
    pub fn activity(mut self) -> Self {
        self.is_activity = true;
        self
    }

    /// Adds an attribute, replacing one with the same logical name.
    #[must_use]
    pub fn with_attribute(mut self, attribute: AttributeMetadata) -> Self {
        self.attributes
            .retain(|a| !a.logical_name.eq_ignore_ascii_case(&attribute.logical_name));
        self.attributes.push(attribute);
        self
    }

    /// Finds an attribute by logical name, ignoring case.
    pub fn attribute(&self, logical_name: &str) -> Option<&AttributeMetadata> {
        self.attributes
            .iter()
            .find(|a| a.logical_name.eq_ignore_ascii_case(logical_name))
    }

    /// Finds an attribute by display label, ignoring case.
    pub fn attribute_by_label(&self, label: &str) -> Option<&AttributeMetadata> {
        let label = label.to_lowercase();
        self.attributes.iter().find(|a| {
            a.display_name
                .as_deref()
                .is_some_and(|d| d.to_lowercase() == label)
        })
    }

    /// Finds an attribute by logical name, then by display label.
    pub fn find_attribute(&self, name: &str) -> Option<&AttributeMetadata> {
        self.attribute(name).or_else(|| self.attribute_by_label(name))
    }

    /// Numeric value of the choice whose label is exactly `label`.
    pub fn option_value(&self, attribute: &str, label: &str) -> Option<i32> {
        self.find_attribute(attribute)?
            .options
            .iter()
            .find(|o| o.label == label)
            .map(|o| o.value)
    }

    /// Label of the choice with numeric code `value`.
    pub fn option_label(&self, attribute: &str, value: i32) -> Option<&str> {
        self.find_attribute(attribute)?
            .option_by_value(value)
            .map(|o| o.label.as_str())
    }

    /// First attribute of the given type.
    pub fn attribute_of_type(&self, attribute_type: AttributeType) -> Option<&AttributeMetadata> {
        self.attributes
            .iter()
            .find(|a| a.attribute_type == attribute_type)
    }
}
