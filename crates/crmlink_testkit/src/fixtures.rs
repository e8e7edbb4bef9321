//! Entity metadata fixtures and ready-made clients.
//!
//! The fixtures model a small sales schema: accounts, contacts, system
//! users, and two activity entities (email with party lists, task with
//! state and status).

use crate::memory::MemoryBridge;
use crmlink_core::{AttributeMetadata, AttributeType, ClientConfig, CrmClient, EntityMetadata};

/// Account: name, revenue, employees, industry choice, primary contact.
pub fn account() -> EntityMetadata {
    EntityMetadata::new("account")
        .with_primary_id("accountid")
        .with_primary_name("name")
        .with_attribute(AttributeMetadata::new("accountid", AttributeType::Uniqueidentifier))
        .with_attribute(
            AttributeMetadata::new("name", AttributeType::String).with_display_name("Account Name"),
        )
        .with_attribute(AttributeMetadata::new("description", AttributeType::Memo))
        .with_attribute(AttributeMetadata::new("revenue", AttributeType::Money))
        .with_attribute(AttributeMetadata::new("numberofemployees", AttributeType::Integer))
        .with_attribute(
            AttributeMetadata::new("industrycode", AttributeType::Picklist)
                .with_display_name("Industry")
                .with_option("Accounting", 1)
                .with_option("Agriculture", 2)
                .with_option("Consulting", 5),
        )
        .with_attribute(
            AttributeMetadata::new("donotemail", AttributeType::Boolean)
                .with_boolean_labels("Do Not Allow", "Allow"),
        )
        .with_attribute(
            AttributeMetadata::new("primarycontactid", AttributeType::Lookup)
                .with_display_name("Primary Contact")
                .with_targets(["contact"]),
        )
        .with_attribute(
            AttributeMetadata::new("ownerid", AttributeType::Owner)
                .with_targets(["systemuser", "team"]),
        )
        .with_attribute(AttributeMetadata::new("createdon", AttributeType::DateTime))
        .with_attribute(state_attribute())
        .with_attribute(status_attribute())
}

/// Contact: names, birth date, and a customer reference to an account or
/// another contact.
pub fn contact() -> EntityMetadata {
    EntityMetadata::new("contact")
        .with_primary_id("contactid")
        .with_primary_name("fullname")
        .with_attribute(AttributeMetadata::new("contactid", AttributeType::Uniqueidentifier))
        .with_attribute(AttributeMetadata::new("firstname", AttributeType::String))
        .with_attribute(AttributeMetadata::new("lastname", AttributeType::String))
        .with_attribute(
            AttributeMetadata::new("fullname", AttributeType::String).with_display_name("Full Name"),
        )
        .with_attribute(AttributeMetadata::new("emailaddress1", AttributeType::String))
        .with_attribute(AttributeMetadata::new("birthdate", AttributeType::DateTime))
        .with_attribute(
            AttributeMetadata::new("parentcustomerid", AttributeType::Customer)
                .with_targets(["account", "contact"]),
        )
        .with_attribute(
            AttributeMetadata::new("ownerid", AttributeType::Owner)
                .with_targets(["systemuser", "team"]),
        )
        .with_attribute(state_attribute())
        .with_attribute(status_attribute())
}

/// System user.
pub fn system_user() -> EntityMetadata {
    EntityMetadata::new("systemuser")
        .with_primary_id("systemuserid")
        .with_primary_name("fullname")
        .with_attribute(AttributeMetadata::new("systemuserid", AttributeType::Uniqueidentifier))
        .with_attribute(AttributeMetadata::new("fullname", AttributeType::String))
        .with_attribute(AttributeMetadata::new("domainname", AttributeType::String))
}

/// Party of an activity.
pub fn activity_party() -> EntityMetadata {
    EntityMetadata::new("activityparty")
        .with_primary_id("activitypartyid")
        .with_attribute(AttributeMetadata::new(
            "activitypartyid",
            AttributeType::Uniqueidentifier,
        ))
        .with_attribute(
            AttributeMetadata::new("partyid", AttributeType::Lookup)
                .with_targets(["account", "contact", "systemuser"]),
        )
        .with_attribute(AttributeMetadata::new("addressused", AttributeType::String))
}

/// Email activity with sender and recipient party lists.
pub fn email() -> EntityMetadata {
    EntityMetadata::new("email")
        .with_primary_id("activityid")
        .with_primary_name("subject")
        .activity()
        .with_attribute(AttributeMetadata::new("activityid", AttributeType::Uniqueidentifier))
        .with_attribute(AttributeMetadata::new("subject", AttributeType::String))
        .with_attribute(AttributeMetadata::new("description", AttributeType::Memo))
        .with_attribute(AttributeMetadata::new("from", AttributeType::PartyList))
        .with_attribute(AttributeMetadata::new("to", AttributeType::PartyList))
        .with_attribute(AttributeMetadata::new("cc", AttributeType::PartyList))
        .with_attribute(
            AttributeMetadata::new("regardingobjectid", AttributeType::Lookup)
                .with_targets(["account", "contact"]),
        )
}

/// Task activity with priority, due date, state and status.
pub fn task() -> EntityMetadata {
    EntityMetadata::new("task")
        .with_primary_id("activityid")
        .with_primary_name("subject")
        .activity()
        .with_attribute(AttributeMetadata::new("activityid", AttributeType::Uniqueidentifier))
        .with_attribute(
            AttributeMetadata::new("subject", AttributeType::String).with_display_name("Subject"),
        )
        .with_attribute(
            AttributeMetadata::new("scheduledend", AttributeType::DateTime)
                .with_display_name("Due Date"),
        )
        .with_attribute(
            AttributeMetadata::new("prioritycode", AttributeType::Picklist)
                .with_display_name("Priority")
                .with_option("Low", 0)
                .with_option("Normal", 1)
                .with_option("High", 2),
        )
        .with_attribute(AttributeMetadata::new("actualdurationminutes", AttributeType::Integer))
        .with_attribute(
            AttributeMetadata::new("regardingobjectid", AttributeType::Lookup)
                .with_targets(["account", "contact"]),
        )
        .with_attribute(
            AttributeMetadata::new("statecode", AttributeType::State)
                .with_option("Open", 0)
                .with_option("Completed", 1)
                .with_option("Canceled", 2),
        )
        .with_attribute(
            AttributeMetadata::new("statuscode", AttributeType::Status)
                .with_option("Not Started", 2)
                .with_option("In Progress", 3)
                .with_option("Completed", 5)
                .with_option("Canceled", 6),
        )
}

fn state_attribute() -> AttributeMetadata {
    AttributeMetadata::new("statecode", AttributeType::State)
        .with_option("Active", 0)
        .with_option("Inactive", 1)
}

fn status_attribute() -> AttributeMetadata {
    AttributeMetadata::new("statuscode", AttributeType::Status)
        .with_option("Active", 1)
        .with_option("Inactive", 2)
}

/// Every fixture entity.
pub fn all_entities() -> Vec<EntityMetadata> {
    vec![
        account(),
        contact(),
        system_user(),
        activity_party(),
        email(),
        task(),
    ]
}

/// A memory bridge that knows every fixture entity.
pub fn memory_bridge() -> MemoryBridge {
    all_entities()
        .into_iter()
        .fold(MemoryBridge::new(), MemoryBridge::with_entity)
}

/// A client over [`memory_bridge`] with the default configuration.
pub fn memory_client() -> CrmClient<MemoryBridge> {
    memory_client_with(ClientConfig::default())
}

/// A client over [`memory_bridge`].
pub fn memory_client_with(config: ClientConfig) -> CrmClient<MemoryBridge> {
    CrmClient::with_config(memory_bridge(), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crmlink_core::RemoteBridge;

    #[test]
    fn fixtures_survive_json() {
        for entity in all_entities() {
            let json = entity.to_json().unwrap();
            assert_eq!(EntityMetadata::from_json(&json).unwrap(), entity);
        }
    }

    #[test]
    fn bridge_serves_every_fixture() {
        let bridge = memory_bridge();
        for entity in all_entities() {
            assert!(bridge.entity_metadata(&entity.logical_name).is_ok());
        }
        assert!(bridge.entity_metadata("invoice").is_err());
    }
}
