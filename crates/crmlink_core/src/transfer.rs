//! Bulk export to and import from table files.

use crate::bridge::RemoteBridge;
use crate::client::{CrmClient, WriteOutcome};
use crate::error::{CoreError, CoreResult};
use crate::metadata::{AttributeType, EntityMetadata};
use crmlink_codec::{from_json, Map, Value};
use std::path::Path;
use tracing::{debug, info};

/// Counts of records written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records created.
    pub created: usize,
    /// Records updated.
    pub updated: usize,
}

impl ImportSummary {
    /// Total records written.
    pub fn total(&self) -> usize {
        self.created + self.updated
    }
}

impl<B: RemoteBridge> CrmClient<B> {
    /// Saves every record of an entity to a table file and returns the
    /// number of rows written. The format follows the file extension.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty entity name, a table error
    /// for an unsupported extension or a failed write, and the bridge's
    /// error unchanged.
    pub fn export(&self, entity: &str, path: impl AsRef<Path>) -> CoreResult<usize> {
        let path = path.as_ref();
        let entity = entity.trim().to_lowercase();
        if entity.is_empty() {
            return Err(CoreError::validation("entity name is required"));
        }
        info!(entity = %entity, path = %path.display(), "exporting records");

        self.entity_metadata(&entity)?;
        let table = self.retrieve_all(&entity)?;
        crmlink_table::save(&table, path)?;

        info!(entity = %entity, count = table.len(), "export finished");
        Ok(table.len())
    }

    /// Loads a table file and writes every row to the entity the table is
    /// named after, updating the record with the same primary id or
    /// creating one.
    ///
    /// Files written by [`CrmClient::export`] load back unchanged: flattened
    /// reference columns (`r`, `r_name`, `r_type`) are regrouped into
    /// `{id, type}` references, inside party lists too, and state columns
    /// are skipped. Party lists stored as JSON text are decoded first.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the table has no name and stops at the
    /// first row that fails; earlier rows stay written.
    pub fn import(&self, path: impl AsRef<Path>) -> CoreResult<ImportSummary> {
        let path = path.as_ref();
        info!(path = %path.display(), "importing records");

        let table = crmlink_table::load(path)?;
        let entity = table
            .name()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| CoreError::validation("the table must be named after an entity"))?
            .to_lowercase();
        debug!(entity = %entity, count = table.len(), "table loaded");

        let metadata = self.entity_metadata(&entity)?;
        let id_field = self.id_field(&entity)?;
        let has_parties = metadata
            .attributes
            .iter()
            .any(|a| a.attribute_type == AttributeType::PartyList);
        let party = if has_parties {
            Some(self.entity_metadata(&self.config().party_entity)?)
        } else {
            None
        };

        let mut summary = ImportSummary::default();
        for (index, row) in table.rows().iter().enumerate() {
            debug!(entity = %entity, row = index + 1, total = table.len(), "importing record");
            let row = prepare_row(&metadata, party.as_deref(), row);
            match self.create_or_update(&entity, &row, &[id_field.as_str()])? {
                WriteOutcome::Created(_) => summary.created += 1,
                WriteOutcome::Updated(_) | WriteOutcome::Unchanged(_) => summary.updated += 1,
            }
        }

        info!(
            entity = %entity,
            created = summary.created,
            updated = summary.updated,
            "import finished"
        );
        Ok(summary)
    }
}

/// Undoes reference flattening and drops attributes that only `set_state`
/// may change. Party list items are prepared against `party`.
fn prepare_row(metadata: &EntityMetadata, party: Option<&EntityMetadata>, row: &Map) -> Map {
    let mut out = Map::with_capacity(row.len());
    for (name, value) in row {
        let Some(attribute) = metadata.attribute(&name.to_lowercase()) else {
            if !is_reference_suffix(metadata, name) {
                out.insert(name, value.clone());
            }
            continue;
        };
        if attribute.attribute_type.is_reserved() {
            continue;
        }
        if let (AttributeType::PartyList, Some(party)) = (attribute.attribute_type, party) {
            out.insert(name, prepare_parties(party, value));
            continue;
        }
        let target = row
            .get_ignore_case(&format!("{name}_type"))
            .and_then(|(_, v)| v.as_text());
        match (attribute.attribute_type.is_reference(), value, target) {
            (true, Value::Text(id), Some(target)) => {
                out.insert(
                    name,
                    Map::new().with("id", id.as_str()).with("type", target),
                );
            }
            _ => {
                out.insert(name, value.clone());
            }
        }
    }
    out
}

/// Prepares each flattened party of a party list column.
fn prepare_parties(party: &EntityMetadata, value: &Value) -> Value {
    let items = match value {
        Value::Array(items) => items.clone(),
        Value::Text(text) if text.trim_start().starts_with('[') => {
            match from_json(text.as_bytes()) {
                Ok(Value::Array(items)) => items,
                _ => return value.clone(),
            }
        }
        other => return other.clone(),
    };
    Value::Array(
        items
            .iter()
            .map(|item| match item {
                Value::Map(map) => Value::Map(prepare_row(party, None, map)),
                other => other.clone(),
            })
            .collect(),
    )
}

/// True for the `_name` and `_type` companions of a reference column.
fn is_reference_suffix(metadata: &EntityMetadata, column: &str) -> bool {
    let column = column.to_lowercase();
    ["_name", "_type"].iter().any(|suffix| {
        column
            .strip_suffix(suffix)
            .and_then(|base| metadata.attribute(base))
            .is_some_and(|a| a.attribute_type.is_reference())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::MockBridge;
    use crate::id::RecordId;
    use crate::metadata::AttributeMetadata;
    use crate::typed::{EntityReference, Record, TypedValue};
    use crmlink_table::TabularData;

    fn contact() -> EntityMetadata {
        EntityMetadata::new("contact")
            .with_primary_id("contactid")
            .with_primary_name("fullname")
            .with_attribute(AttributeMetadata::new("contactid", AttributeType::Uniqueidentifier))
            .with_attribute(AttributeMetadata::new("fullname", AttributeType::String))
            .with_attribute(
                AttributeMetadata::new("parentcustomerid", AttributeType::Customer)
                    .with_targets(["account", "contact"]),
            )
            .with_attribute(AttributeMetadata::new("statecode", AttributeType::State))
    }

    fn client() -> CrmClient<MockBridge> {
        let bridge = MockBridge::new();
        bridge.add_metadata(&contact()).unwrap();
        CrmClient::new(bridge)
    }

    #[test]
    fn prepare_row_regroups_references() {
        let account = RecordId::new();
        let row = Map::new()
            .with("fullname", "Jane")
            .with("parentcustomerid", account.to_string())
            .with("parentcustomerid_name", "Contoso")
            .with("parentcustomerid_type", "account")
            .with("statecode", 0)
            .with("unknown", 1);
        let prepared = prepare_row(&contact(), None, &row);
        assert_eq!(
            prepared,
            Map::new()
                .with("fullname", "Jane")
                .with(
                    "parentcustomerid",
                    Map::new()
                        .with("id", account.to_string())
                        .with("type", "account")
                )
                .with("unknown", 1)
        );
    }

    #[test]
    fn party_lists_regroup_each_party() {
        let party = EntityMetadata::new("activityparty")
            .with_primary_id("activitypartyid")
            .with_attribute(
                AttributeMetadata::new("partyid", AttributeType::Lookup)
                    .with_targets(["contact", "systemuser"]),
            );
        let email = EntityMetadata::new("email")
            .with_attribute(AttributeMetadata::new("to", AttributeType::PartyList));
        let jane = RecordId::new();
        let flattened = Map::new()
            .with("partyid", jane.to_string())
            .with("partyid_name", "Jane")
            .with("partyid_type", "contact");
        let expected = Value::Array(vec![Value::Map(Map::new().with(
            "partyid",
            Map::new().with("id", jane.to_string()).with("type", "contact"),
        ))]);

        let row = Map::new().with("to", vec![flattened.clone()]);
        let prepared = prepare_row(&email, Some(&party), &row);
        assert_eq!(prepared.get("to"), Some(&expected));

        let text = crmlink_codec::to_json_string(&Value::Array(vec![Value::Map(flattened)]))
            .unwrap();
        let row = Map::new().with("to", text);
        let prepared = prepare_row(&email, Some(&party), &row);
        assert_eq!(prepared.get("to"), Some(&expected));

        let row = Map::new().with("to", "not a list");
        let prepared = prepare_row(&email, Some(&party), &row);
        assert_eq!(prepared.get("to"), Some(&Value::from("not a list")));
    }

    #[test]
    fn export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        let client = client();
        let (jane, account) = (RecordId::new(), RecordId::new());
        client.bridge().push_query(vec![Record::new("contact")
            .with_id(jane)
            .with("contactid", TypedValue::Raw(Value::from(jane)))
            .with("fullname", TypedValue::String("Jane".into()))
            .with(
                "parentcustomerid",
                EntityReference::new("account", account).with_name("Contoso"),
            )
            .with("statecode", TypedValue::Choice(0))]);

        assert_eq!(client.export("Contact", &path).unwrap(), 1);
        let saved = crmlink_table::load(&path).unwrap();
        assert_eq!(saved.name(), Some("contact"));

        // first import finds nothing and creates, second finds the record
        let summary = client.import(&path).unwrap();
        assert_eq!(summary, ImportSummary { created: 1, updated: 0 });
        client.bridge().push_query(vec![Record::new("contact").with_id(jane)]);
        let summary = client.import(&path).unwrap();
        assert_eq!(summary, ImportSummary { created: 0, updated: 1 });
        assert_eq!(summary.total(), 1);

        let created = &client.bridge().creates()[0];
        assert_eq!(created.id, Some(jane));
        assert_eq!(
            created
                .get("parentcustomerid")
                .and_then(TypedValue::as_reference)
                .map(|r| (r.logical_name.as_str(), r.id)),
            Some(("account", account))
        );
        assert!(!created.contains("statecode"));
    }

    #[test]
    fn import_requires_a_table_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        let mut table = TabularData::new();
        table.push(Map::new().with("fullname", "Jane"));
        crmlink_table::save(&table, &path).unwrap();
        assert!(client().import(&path).unwrap_err().is_validation());
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let err = client()
            .export("contact", dir.path().join("contacts.csv"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Table(_)));
    }
}
