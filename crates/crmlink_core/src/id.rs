//! Record identifier.

use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a record on the remote platform.
///
/// Displayed in lower-case hyphenated form. Parsing accepts hyphenated,
/// braced, simple and URN forms in any case.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Creates a new random record ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a record ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Converts to a UUID.
    #[must_use]
    pub const fn to_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses an identifier.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `text` is not a valid identifier.
    pub fn parse(text: &str) -> CoreResult<Self> {
        Uuid::parse_str(text.trim())
            .map(Self)
            .map_err(|_| CoreError::validation(format!("invalid GUID value '{text}'")))
    }

    /// Returns true if `text` parses as an identifier.
    pub fn is_guid(text: &str) -> bool {
        Self::parse(text).is_ok()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RecordId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl From<RecordId> for Uuid {
    fn from(id: RecordId) -> Self {
        id.to_uuid()
    }
}

impl From<RecordId> for crmlink_codec::Value {
    fn from(id: RecordId) -> Self {
        crmlink_codec::Value::Text(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unique() {
        assert_ne!(RecordId::new(), RecordId::new());
    }

    #[test]
    fn parse_forms() {
        let plain = RecordId::parse("6fefeb79-5447-e511-a5db-0050568a69e2").unwrap();
        let braced = RecordId::parse("{6FEFEB79-5447-E511-A5DB-0050568A69E2}").unwrap();
        let simple = RecordId::parse("6fefeb795447e511a5db0050568a69e2").unwrap();
        assert_eq!(plain, braced);
        assert_eq!(plain, simple);
        assert_eq!(braced.to_string(), "6fefeb79-5447-e511-a5db-0050568a69e2");
    }

    #[test]
    fn rejects_non_guids() {
        assert!(!RecordId::is_guid("Contoso"));
        assert!(!RecordId::is_guid(""));
        let err = RecordId::parse("nope").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn uuid_conversion() {
        let uuid = Uuid::new_v4();
        let id = RecordId::from_uuid(uuid);
        assert_eq!(Uuid::from(id), uuid);
        assert!("x".parse::<RecordId>().is_err());
    }
}
