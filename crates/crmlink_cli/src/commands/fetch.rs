//! Fetch command implementation.

use crmlink_codec::{from_json, Value};
use crmlink_core::{Projection, Query};
use tracing::debug;

/// Runs the fetch command and returns the query markup.
///
/// `conditions` is a JSON object in conditions-object form; `columns` is a
/// comma-separated list.
pub fn run(
    entity: &str,
    conditions: Option<&str>,
    columns: Option<&str>,
) -> Result<String, Box<dyn std::error::Error>> {
    let projection = match columns {
        Some(list) => Projection::columns(list.split(',').map(str::trim).filter(|c| !c.is_empty())),
        None => Projection::All,
    };

    let mut query = Query::new(entity).with_projection(projection);
    if let Some(text) = conditions {
        let conditions = match from_json(text.as_bytes())? {
            Value::Map(map) => map,
            other => {
                return Err(format!("conditions must be a JSON object, got {}", other.type_name()).into())
            }
        };
        debug!(count = conditions.len(), "compiling conditions");
        query = Query::from_conditions(entity, &conditions, query.projection)?;
    }

    Ok(query.to_markup())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_conditions() {
        let markup = run(
            "Account",
            Some(r#"{"name": "Contoso", "numberofemployees": {"$gt": 10}}"#),
            Some("name, accountid"),
        )
        .unwrap();
        assert_eq!(
            markup,
            "<fetch><entity name=\"account\"><attribute name=\"name\"/><attribute name=\"accountid\"/>\
             <filter type=\"and\"><condition attribute=\"name\" operator=\"eq\" value=\"Contoso\"/>\
             <condition attribute=\"numberofemployees\" operator=\"gt\" value=\"10\"/></filter>\
             </entity></fetch>"
        );
    }

    #[test]
    fn defaults_to_every_attribute() {
        assert_eq!(
            run("contact", None, None).unwrap(),
            "<fetch><entity name=\"contact\"><all-attributes/></entity></fetch>"
        );
    }

    #[test]
    fn rejects_non_objects() {
        assert!(run("contact", Some("[1, 2]"), None).is_err());
        assert!(run("contact", Some("{"), None).is_err());
    }
}
