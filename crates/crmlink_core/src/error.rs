//! Error types for crmlink core.

use crate::id::RecordId;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// A failure reported by the remote bridge.
///
/// The message is opaque. `fault` carries the platform's inner fault text
/// when there is one; it is what [`CoreError::is_not_found_fault`] inspects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    /// Error message.
    pub message: String,
    /// Inner fault message from the platform, if any.
    pub fault: Option<String>,
}

impl RemoteError {
    /// Creates a remote error without a fault.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fault: None,
        }
    }

    /// Creates a remote error carrying an inner fault message.
    pub fn with_fault(message: impl Into<String>, fault: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fault: Some(fault.into()),
        }
    }

    /// Creates the fault the platform raises for a missing record.
    pub fn not_found(entity: &str, id: RecordId) -> Self {
        let fault = not_found_fault(entity, id);
        Self::with_fault(fault.clone(), fault)
    }
}

/// Text of the platform's "record does not exist" fault.
pub fn not_found_fault(entity: &str, id: RecordId) -> String {
    let id = id.to_string().to_lowercase();
    let id = id.trim_start_matches('{').trim_end_matches('}');
    format!("{entity} With Id = {id} Does Not Exist")
}

/// Errors that can occur in crmlink core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing or invalid input, detected before any remote call.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the problem.
        message: String,
    },

    /// The entity has no metadata.
    #[error("entity not found: {entity}")]
    EntityNotFound {
        /// Entity logical name.
        entity: String,
    },

    /// The attribute is not part of the entity's metadata.
    #[error("attribute '{attribute}' not found in entity '{entity}'")]
    AttributeNotFound {
        /// Entity logical name.
        entity: String,
        /// Attribute name as given.
        attribute: String,
    },

    /// The entity metadata names no primary id attribute.
    #[error("primary id attribute not found for entity '{entity}'")]
    MissingPrimaryId {
        /// Entity logical name.
        entity: String,
    },

    /// The attribute can only be changed through a dedicated operation.
    #[error("attribute '{attribute}' of entity '{entity}' cannot be set directly, use {operation}")]
    ReservedAttribute {
        /// Entity logical name.
        entity: String,
        /// Attribute logical name.
        attribute: String,
        /// Operation to use instead.
        operation: String,
    },

    /// A value does not fit the attribute type.
    #[error("cannot convert attribute '{attribute}' value '{value}' from '{from}' to '{to}'")]
    Conversion {
        /// Attribute logical name.
        attribute: String,
        /// Offending value, rendered as text.
        value: String,
        /// Source value type.
        from: String,
        /// Target attribute type.
        to: String,
    },

    /// A reference value names no target and the attribute allows several.
    #[error("couldn't get a valid target for attribute '{attribute}', specify it as {{id, type}}")]
    AmbiguousTarget {
        /// Attribute logical name.
        attribute: String,
    },

    /// Resolving a reference by name matched nothing.
    #[error("no {entity} records found matching '{value}'")]
    NoRecordsFound {
        /// Target entity.
        entity: String,
        /// Name that was looked up.
        value: String,
    },

    /// Resolving a reference by name matched several records.
    #[error("more than one {entity} record found matching '{value}'")]
    MultipleRecordsFound {
        /// Target entity.
        entity: String,
        /// Name that was looked up.
        value: String,
    },

    /// A single-result query matched more than one record.
    #[error("too many {entity} records found matching the specified criteria: {count}")]
    TooManyRecords {
        /// Entity logical name.
        entity: String,
        /// Number of records matched.
        count: usize,
    },

    /// Failure surfaced by the remote bridge.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Table format error.
    #[error("table error: {0}")]
    Table(#[from] crmlink_table::TableError),

    /// Value codec error.
    #[error("codec error: {0}")]
    Codec(#[from] crmlink_codec::CodecError),

    /// Aliased values nested deeper than allowed.
    #[error("aliased value nesting exceeds {depth} levels")]
    AliasDepthExceeded {
        /// The configured maximum depth.
        depth: usize,
    },
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates an entity not found error.
    pub fn entity_not_found(entity: impl Into<String>) -> Self {
        Self::EntityNotFound {
            entity: entity.into(),
        }
    }

    /// Creates an attribute not found error.
    pub fn attribute_not_found(entity: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::AttributeNotFound {
            entity: entity.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates a conversion error.
    pub fn conversion(
        attribute: impl Into<String>,
        value: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            attribute: attribute.into(),
            value: value.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates a remote error without a fault.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(RemoteError::new(message))
    }

    /// Returns true if this is the platform's "record does not exist"
    /// fault for `entity` and `id`.
    pub fn is_not_found_fault(&self, entity: &str, id: RecordId) -> bool {
        match self {
            Self::Remote(RemoteError {
                fault: Some(fault), ..
            }) => *fault == not_found_fault(entity, id),
            _ => false,
        }
    }

    /// Returns true for errors raised before any remote call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
