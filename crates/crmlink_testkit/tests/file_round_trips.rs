//! Table files, export and import.

use crmlink_codec::{Map, Value};
use crmlink_core::{compile, Projection, Query};
use crmlink_table::{load, save, FormatRegistry, TabularData};
use crmlink_testkit::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn markup_tables_round_trip(table in table_strategy()) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.xml");
        save(&table, &path).unwrap();
        prop_assert_eq!(load(&path).unwrap(), table);
    }

    #[test]
    fn json_tables_round_trip(table in table_strategy()) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.json");
        save(&table, &path).unwrap();
        prop_assert_eq!(load(&path).unwrap(), table);
    }

    #[test]
    fn compiled_conditions_survive_markup(conditions in conditions_strategy()) {
        let query = Query::from_conditions("account", &conditions, Projection::All).unwrap();
        let parsed = Query::parse_markup(&query.to_markup()).unwrap();
        prop_assert_eq!(&parsed.entity, "account");

        let shape = |q: &Query| -> Vec<(String, String, usize)> {
            q.filter
                .iter()
                .flat_map(|f| f.conditions.iter())
                .map(|c| (c.attribute().to_string(), c.operator().to_string(), c.values().len()))
                .collect()
        };
        prop_assert_eq!(shape(&parsed), shape(&query));
        prop_assert_eq!(compile(&conditions).unwrap().len(), conditions.len());
    }
}

fn seed_accounts() -> crmlink_core::CrmClient<MemoryBridge> {
    let client = memory_client();
    let jane = client
        .create("contact", &Map::new().with("fullname", "Jane Doe"))
        .unwrap();
    for (name, employees) in [("Contoso", 10), ("Fabrikam", 250)] {
        client
            .create(
                "account",
                &Map::new()
                    .with("name", name)
                    .with("numberofemployees", employees)
                    .with("revenue", 12.5)
                    .with("industrycode", "Consulting")
                    .with(
                        "primarycontactid",
                        Map::new().with("id", jane.to_string()).with("type", "contact"),
                    ),
            )
            .unwrap();
    }
    client
}

#[test]
fn export_import_every_format() {
    for extension in FormatRegistry::new().extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("accounts.{extension}"));
        let client = seed_accounts();
        let before = client.retrieve_all("account").unwrap();

        assert_eq!(client.export("account", &path).unwrap(), 2, "format {extension}");
        let saved = load(&path).unwrap();
        assert_eq!(saved.name(), Some("account"));
        assert_eq!(saved.len(), 2);

        for row in before.rows() {
            let id = row.get("accountid").and_then(Value::as_text).unwrap();
            client.delete("account", id.parse::<crmlink_core::RecordId>().unwrap()).unwrap();
        }
        assert_eq!(client.bridge().count("account"), 0);

        let summary = client.import(&path).unwrap();
        assert_eq!((summary.created, summary.updated), (2, 0), "format {extension}");
        let after = client.retrieve_all("account").unwrap();
        assert_eq!(after, before, "format {extension}");

        let summary = client.import(&path).unwrap();
        assert_eq!((summary.created, summary.updated), (0, 2), "format {extension}");
        assert_eq!(client.bridge().count("account"), 2);
    }
}

#[test]
fn party_lists_survive_export_and_import() {
    for extension in FormatRegistry::new().extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("emails.{extension}"));
        let client = memory_client();
        let jane = client
            .create("contact", &Map::new().with("fullname", "Jane Doe"))
            .unwrap();
        let user = client.who_am_i().unwrap().user_id;
        client
            .create(
                "email",
                &Map::new()
                    .with("subject", "Quarterly review")
                    .with(
                        "from",
                        vec![Map::new().with("id", user.to_string()).with("type", "systemuser")],
                    )
                    .with(
                        "to",
                        vec![Map::new()
                            .with("id", jane.to_string())
                            .with("type", "contact")],
                    ),
            )
            .unwrap();
        let before = client.retrieve_all("email").unwrap();

        assert_eq!(client.export("email", &path).unwrap(), 1, "format {extension}");
        for row in before.rows() {
            let id = row.get("activityid").and_then(Value::as_text).unwrap();
            client.delete("email", id.parse::<crmlink_core::RecordId>().unwrap()).unwrap();
        }

        let summary = client.import(&path).unwrap();
        assert_eq!((summary.created, summary.updated), (1, 0), "format {extension}");
        let after = client.retrieve_all("email").unwrap();
        assert_eq!(after, before, "format {extension}");

        let to = after.rows()[0].get("to").and_then(Value::as_array).unwrap();
        assert_eq!(to[0].get("partyid"), Some(&Value::from(jane)));
        assert_eq!(to[0].get("partyid_type"), Some(&Value::from("contact")));
    }
}

#[test]
fn bulk_create_from_a_markup_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.xml");
    std::fs::write(
        &path,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<DataTable name="contact">
    <row>
        <Full_x0020_Name>Jane Doe</Full_x0020_Name>
        <emailaddress1>jane@example.com</emailaddress1>
        <birthdate>1982-03-17T00:00:00.000Z</birthdate>
    </row>
    <row>
        <Full_x0020_Name>John Roe</Full_x0020_Name>
    </row>
</DataTable>"#,
    )
    .unwrap();

    let client = memory_client();
    let mut table = load(&path).unwrap();
    assert_eq!(client.create_table(&mut table).unwrap(), 2);
    save(&table, &path).unwrap();

    let reloaded = load(&path).unwrap();
    assert!(reloaded
        .rows()
        .iter()
        .all(|row| row.get("contactid").and_then(Value::as_text).is_some()));

    let jane = client
        .retrieve("contact", Map::new().with("fullname", "Jane Doe"), &Projection::All)
        .unwrap()
        .unwrap();
    assert!(matches!(jane.get("birthdate"), Some(Value::DateTime(_))));
}

#[test]
fn lookup_fills_a_column() {
    let mut table = TabularData::named("account");
    table.push(Map::new().with("first", "Jane").with("last", "Doe"));
    table.push(Map::new().with("first", "John"));
    table.lookup("full", |row| {
        let part = |k: &str| row.get(k).and_then(Value::as_text).unwrap_or_default().to_string();
        Value::from(format!("{} {}", part("first"), part("last")).trim().to_string())
    });
    let full: Vec<_> = table
        .rows()
        .iter()
        .filter_map(|r| r.get("full").and_then(Value::as_text))
        .collect();
    assert_eq!(full, ["Jane Doe", "John"]);
}
