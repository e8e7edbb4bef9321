//! Client configuration.

/// Configuration for [`CrmClient`](crate::CrmClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Record type each party-list element is converted as.
    pub party_entity: String,
    /// Attribute each party-list element is assigned to.
    pub party_attribute: String,
    /// Assignee entity used by `assign` when none is given.
    pub default_assignee_type: String,
    /// Resolve reference values that are not ids by their primary name.
    pub resolve_lookups_by_name: bool,
    /// Deepest nesting of aliased values accepted when flattening.
    pub max_alias_depth: usize,
}

impl ClientConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            party_entity: "activityparty".to_string(),
            party_attribute: "partyid".to_string(),
            default_assignee_type: "systemuser".to_string(),
            resolve_lookups_by_name: true,
            max_alias_depth: 8,
        }
    }

    /// Sets the party record type.
    #[must_use]
    pub fn with_party_entity(mut self, entity: impl Into<String>) -> Self {
        self.party_entity = entity.into().to_lowercase();
        self
    }

    /// Sets the party attribute.
    #[must_use]
    pub fn with_party_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.party_attribute = attribute.into().to_lowercase();
        self
    }

    /// Sets the default assignee type.
    #[must_use]
    pub fn with_default_assignee_type(mut self, entity: impl Into<String>) -> Self {
        self.default_assignee_type = entity.into().to_lowercase();
        self
    }

    /// Enables or disables reference resolution by name.
    #[must_use]
    pub fn with_resolve_lookups_by_name(mut self, enabled: bool) -> Self {
        self.resolve_lookups_by_name = enabled;
        self
    }

    /// Sets the aliased value depth bound.
    #[must_use]
    pub fn with_max_alias_depth(mut self, depth: usize) -> Self {
        self.max_alias_depth = depth;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.party_entity, "activityparty");
        assert_eq!(config.party_attribute, "partyid");
        assert_eq!(config.default_assignee_type, "systemuser");
        assert!(config.resolve_lookups_by_name);
        assert_eq!(config.max_alias_depth, 8);
    }

    #[test]
    fn builders() {
        let config = ClientConfig::new()
            .with_default_assignee_type("Team")
            .with_resolve_lookups_by_name(false)
            .with_max_alias_depth(2);
        assert_eq!(config.default_assignee_type, "team");
        assert!(!config.resolve_lookups_by_name);
        assert_eq!(config.max_alias_depth, 2);
    }
}
