//! Query model and query markup.
//!
//! Markup is written compact, with no declaration:
//!
//! ```text
//! <fetch><entity name="account"><attribute name="name"/><filter type="and">
//! <condition attribute="name" operator="eq" value="Contoso"/></filter></entity></fetch>
//! ```

use crate::conditions::{compile, Condition, Filter, FilterType, Operator};
use crate::error::{CoreError, CoreResult};
use crmlink_codec::{format_query_text, Map, Value};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt;

/// Projection token meaning every attribute.
pub const WILDCARD: &str = "*";

/// Attributes returned by a read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    /// Every attribute.
    #[default]
    All,
    /// The named attributes, lower-case.
    Columns(Vec<String>),
}

impl Projection {
    /// Builds a projection from attribute names. A `*` anywhere in the
    /// list selects every attribute.
    pub fn columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut columns = Vec::new();
        for name in names {
            let name = name.as_ref().trim().to_lowercase();
            if name == WILDCARD {
                return Self::All;
            }
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
        Self::Columns(columns)
    }

    /// Builds a projection from a loose value: `true`, a name, or a list
    /// of names.
    ///
    /// # Errors
    ///
    /// Returns a validation error for any other shape, for `false`, and
    /// for a list with no names.
    pub fn from_value(value: &Value) -> CoreResult<Self> {
        match value {
            Value::Bool(true) => Ok(Self::All),
            Value::Text(name) if !name.trim().is_empty() => Ok(Self::columns([name])),
            Value::Array(items) if !items.is_empty() => {
                let names = items
                    .iter()
                    .map(|item| {
                        item.as_text().ok_or_else(|| {
                            CoreError::validation(format!(
                                "column names must be strings, got {}",
                                item.type_name()
                            ))
                        })
                    })
                    .collect::<CoreResult<Vec<_>>>()?;
                Ok(Self::columns(names))
            }
            other => Err(CoreError::validation(format!(
                "invalid column specification of type {}",
                other.type_name()
            ))),
        }
    }

    /// Returns true for the wildcard projection.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Returns the column names, or `None` for the wildcard.
    pub fn names(&self) -> Option<&[String]> {
        match self {
            Self::All => None,
            Self::Columns(names) => Some(names),
        }
    }

    /// Returns true if `attribute` is selected.
    pub fn includes(&self, attribute: &str) -> bool {
        match self {
            Self::All => true,
            Self::Columns(names) => names.iter().any(|n| n.eq_ignore_ascii_case(attribute)),
        }
    }
}

/// A multi-record read.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Entity logical name, lower-case.
    pub entity: String,
    /// Attributes to return.
    pub projection: Projection,
    /// Restriction, if any.
    pub filter: Option<Filter>,
}

impl Query {
    /// Creates a query for every attribute of every record.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into().to_lowercase(),
            projection: Projection::All,
            filter: None,
        }
    }

    /// Compiles a conditions object into a query.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the conditions do not compile.
    pub fn from_conditions(
        entity: impl Into<String>,
        conditions: &Map,
        projection: Projection,
    ) -> CoreResult<Self> {
        Ok(Self::new(entity)
            .with_projection(projection)
            .with_filter(compile(conditions)?))
    }

    /// Sets the projection.
    #[must_use]
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Sets the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Renders the query as markup.
    pub fn to_markup(&self) -> String {
        let mut out = String::from("<fetch>");
        out.push_str(&format!("<entity name=\"{}\">", escape(self.entity.as_str())));

        match &self.projection {
            Projection::All => out.push_str("<all-attributes/>"),
            Projection::Columns(names) => {
                for name in names {
                    out.push_str(&format!(
                        "<attribute name=\"{}\"/>",
                        escape(name.to_lowercase().as_str())
                    ));
                }
            }
        }

        if let Some(filter) = self.filter.as_ref().filter(|f| !f.is_empty()) {
            out.push_str(&format!("<filter type=\"{}\">", filter.filter_type.token()));
            for condition in &filter.conditions {
                write_condition(&mut out, condition);
            }
            out.push_str("</filter>");
        }

        out.push_str("</entity></fetch>");
        out
    }

    /// Parses query markup. Condition values come back as text.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the markup is malformed, names no
    /// entity, or uses an unknown operator or filter type.
    pub fn parse_markup(markup: &str) -> CoreResult<Self> {
        let mut reader = Reader::from_str(markup);
        let mut entity: Option<String> = None;
        let mut columns: Vec<String> = Vec::new();
        let mut all = false;
        let mut filter: Option<Filter> = None;
        let mut condition: Option<PendingCondition> = None;
        let mut in_value = false;

        loop {
            let event = reader.read_event().map_err(invalid_markup)?;
            match event {
                Event::Start(e) => match e.name().as_ref() {
                    b"value" => {
                        in_value = true;
                        push_value(&mut condition);
                    }
                    b"condition" => condition = Some(PendingCondition::from_element(&e)?),
                    _ => handle_element(&e, &mut entity, &mut columns, &mut all, &mut filter)?,
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"value" => push_value(&mut condition),
                    b"condition" => {
                        let pending = PendingCondition::from_element(&e)?;
                        push_condition(&mut filter, pending.finish()?);
                    }
                    _ => handle_element(&e, &mut entity, &mut columns, &mut all, &mut filter)?,
                },
                Event::Text(t) if in_value => {
                    let text = t.unescape().map_err(invalid_markup)?;
                    if let Some(Value::Text(slot)) =
                        condition.as_mut().and_then(|c| c.values.last_mut())
                    {
                        slot.push_str(&text);
                    }
                }
                Event::End(e) => match e.name().as_ref() {
                    b"value" => in_value = false,
                    b"condition" => {
                        if let Some(pending) = condition.take() {
                            push_condition(&mut filter, pending.finish()?);
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        let entity = entity.ok_or_else(|| CoreError::validation("query markup names no entity"))?;
        let projection = if all {
            Projection::All
        } else {
            Projection::Columns(columns)
        };
        Ok(Self {
            entity,
            projection,
            filter,
        })
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup())
    }
}

fn write_condition(out: &mut String, condition: &Condition) {
    let attribute = condition.attribute().to_lowercase();
    out.push_str(&format!(
        "<condition attribute=\"{}\" operator=\"{}\"",
        escape(attribute.as_str()),
        condition.operator().token()
    ));
    let values = condition.values();
    match values {
        [] => out.push_str("/>"),
        [value] if !condition.operator().is_list() => {
            let text = format_query_text(value);
            out.push_str(&format!(" value=\"{}\"/>", escape(text.as_str())));
        }
        _ => {
            out.push('>');
            for value in values {
                let text = format_query_text(value);
                out.push_str(&format!("<value>{}</value>", escape(text.as_str())));
            }
            out.push_str("</condition>");
        }
    }
}

fn invalid_markup(err: impl fmt::Display) -> CoreError {
    CoreError::validation(format!("invalid query markup: {err}"))
}

fn push_value(condition: &mut Option<PendingCondition>) {
    if let Some(pending) = condition.as_mut() {
        pending.values.push(Value::Text(String::new()));
    }
}

fn handle_element(
    element: &BytesStart<'_>,
    entity: &mut Option<String>,
    columns: &mut Vec<String>,
    all: &mut bool,
    filter: &mut Option<Filter>,
) -> CoreResult<()> {
    match element.name().as_ref() {
        b"entity" => {
            *entity = attribute(element, "name")?.map(|n| n.to_lowercase());
        }
        b"all-attributes" => *all = true,
        b"attribute" => {
            if let Some(name) = attribute(element, "name")? {
                columns.push(name.to_lowercase());
            }
        }
        b"filter" => {
            let filter_type = match attribute(element, "type")? {
                Some(token) => FilterType::from_token(&token)
                    .ok_or_else(|| invalid_markup(format!("unknown filter type '{token}'")))?,
                None => FilterType::And,
            };
            *filter = Some(Filter {
                filter_type,
                conditions: Vec::new(),
            });
        }
        _ => {}
    }
    Ok(())
}

fn push_condition(filter: &mut Option<Filter>, condition: Condition) {
    filter.get_or_insert_with(Filter::default).push(condition);
}

fn attribute(element: &BytesStart<'_>, name: &str) -> CoreResult<Option<String>> {
    match element.try_get_attribute(name).map_err(invalid_markup)? {
        Some(attr) => Ok(Some(
            attr.unescape_value().map_err(invalid_markup)?.into_owned(),
        )),
        None => Ok(None),
    }
}

struct PendingCondition {
    attribute: String,
    operator: Operator,
    values: Vec<Value>,
}

impl PendingCondition {
    fn from_element(element: &BytesStart<'_>) -> CoreResult<Self> {
        let attribute_name = attribute(element, "attribute")?
            .ok_or_else(|| invalid_markup("condition without attribute"))?;
        let token = attribute_or_default(element, "operator")?;
        let operator = Operator::from_token(&token)
            .ok_or_else(|| invalid_markup(format!("unknown operator '{token}'")))?;
        let values = attribute(element, "value")?
            .map(|v| vec![Value::Text(v)])
            .unwrap_or_default();
        Ok(Self {
            attribute: attribute_name.to_lowercase(),
            operator,
            values,
        })
    }

    fn finish(self) -> CoreResult<Condition> {
        Condition::new(self.attribute, self.operator, self.values)
    }
}

fn attribute_or_default(element: &BytesStart<'_>, name: &str) -> CoreResult<String> {
    Ok(attribute(element, name)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn wildcard_without_filter() {
        let query = Query::new("Account");
        assert_eq!(
            query.to_markup(),
            "<fetch><entity name=\"account\"><all-attributes/></entity></fetch>"
        );
    }

    #[test]
    fn columns_are_lowercased_and_deduplicated() {
        let projection = Projection::columns(["Name", "name", "AccountId"]);
        assert_eq!(
            projection,
            Projection::Columns(vec!["name".into(), "accountid".into()])
        );
        assert_eq!(Projection::columns(["name", "*"]), Projection::All);
        let markup = Query::new("account").with_projection(projection).to_markup();
        assert_eq!(
            markup,
            "<fetch><entity name=\"account\"><attribute name=\"name\"/>\
             <attribute name=\"accountid\"/></entity></fetch>"
        );
    }

    #[test]
    fn conditions_markup() {
        let date = Utc.with_ymd_and_hms(1982, 3, 17, 0, 0, 0).unwrap();
        let conditions = Map::new()
            .with("attr", "myValue")
            .with("aTTr2", Map::new().with("$neq", 22))
            .with("attr3", Map::new().with("$in", vec!["value1", "value2"]))
            .with("attr4", date)
            .with("attr5", false)
            .with("attr6", Map::new().with("$in", "solo"))
            .with("attr7", Value::Null)
            .with("attr8", "$notNull");
        let query = Query::from_conditions("tEst", &conditions, Projection::All).unwrap();
        let expected = concat!(
            "<fetch><entity name=\"test\"><all-attributes/><filter type=\"and\">",
            "<condition attribute=\"attr\" operator=\"eq\" value=\"myValue\"/>",
            "<condition attribute=\"attr2\" operator=\"neq\" value=\"22\"/>",
            "<condition attribute=\"attr3\" operator=\"in\"><value>value1</value><value>value2</value></condition>",
            "<condition attribute=\"attr4\" operator=\"eq\" value=\"1982-03-17 00:00:00\"/>",
            "<condition attribute=\"attr5\" operator=\"eq\" value=\"false\"/>",
            "<condition attribute=\"attr6\" operator=\"in\"><value>solo</value></condition>",
            "<condition attribute=\"attr7\" operator=\"null\"/>",
            "<condition attribute=\"attr8\" operator=\"not-null\"/>",
            "</filter></entity></fetch>"
        );
        assert_eq!(query.to_markup(), expected);
    }

    #[test]
    fn between_uses_value_elements() {
        let conditions = Map::new().with("age", Map::new().with("$between", vec![18, 65]));
        let markup = Query::from_conditions("contact", &conditions, Projection::All)
            .unwrap()
            .to_markup();
        assert!(markup.contains(
            "<condition attribute=\"age\" operator=\"between\"><value>18</value><value>65</value></condition>"
        ));
    }

    #[test]
    fn empty_filter_is_omitted() {
        let query = Query::new("account").with_filter(Filter::default());
        assert!(!query.to_markup().contains("filter"));
    }

    #[test]
    fn values_are_escaped() {
        let conditions = Map::new().with("name", "A & \"B\" <C>");
        let markup = Query::from_conditions("account", &conditions, Projection::All)
            .unwrap()
            .to_markup();
        assert!(markup.contains("value=\"A &amp; &quot;B&quot; &lt;C&gt;\""));
        let parsed = Query::parse_markup(&markup).unwrap();
        let filter = parsed.filter.unwrap();
        assert_eq!(filter.conditions[0].values(), &[Value::from("A & \"B\" <C>")]);
    }

    #[test]
    fn parse_roundtrip() {
        let filter = Filter::or(vec![
            Condition::equal("name", "Contoso"),
            Condition::new("code", Operator::In, vec![Value::from(1), Value::from(2)]).unwrap(),
            Condition::is_null("parentaccountid"),
        ]);
        let query = Query::new("account")
            .with_projection(Projection::columns(["name", "code"]))
            .with_filter(filter);
        let parsed = Query::parse_markup(&query.to_markup()).unwrap();
        assert_eq!(parsed.entity, "account");
        assert_eq!(parsed.projection, query.projection);
        let filter = parsed.filter.unwrap();
        assert_eq!(filter.filter_type, FilterType::Or);
        assert_eq!(filter.conditions[0], Condition::equal("name", "Contoso"));
        assert_eq!(
            filter.conditions[1].values(),
            &[Value::from("1"), Value::from("2")]
        );
        assert_eq!(filter.conditions[2].operator(), Operator::IsNull);
    }

    #[test]
    fn parse_indented_markup() {
        let markup = r#"
            <fetch>
                <entity name="Contact">
                    <all-attributes/>
                    <filter type="and">
                        <condition attribute="lastname" operator="like" value="Sm%"/>
                    </filter>
                </entity>
            </fetch>"#;
        let query = Query::parse_markup(markup).unwrap();
        assert_eq!(query.entity, "contact");
        assert!(query.projection.is_all());
        assert_eq!(query.filter.unwrap().conditions[0].operator(), Operator::Like);
    }

    #[test]
    fn parse_errors() {
        assert!(Query::parse_markup("<fetch><entity></entity></fetch>").is_err());
        assert!(Query::parse_markup(
            "<fetch><entity name=\"a\"><filter><condition attribute=\"x\" operator=\"zz\" value=\"1\"/></filter></entity></fetch>"
        )
        .is_err());
        assert!(Query::parse_markup("<fetch><entity name=\"a\"></fetch>").is_err());
    }

    #[test]
    fn projection_from_values() {
        assert_eq!(Projection::from_value(&Value::Bool(true)).unwrap(), Projection::All);
        assert_eq!(
            Projection::from_value(&Value::from("Name")).unwrap(),
            Projection::Columns(vec!["name".into()])
        );
        assert_eq!(
            Projection::from_value(&Value::from(vec!["a", "*"])).unwrap(),
            Projection::All
        );
        assert!(Projection::from_value(&Value::Bool(false)).is_err());
        assert!(Projection::from_value(&Value::from(vec![1])).is_err());
        assert!(Projection::from_value(&Value::Null).is_err());
        assert!(Projection::columns(["a"]).includes("A"));
    }
}
