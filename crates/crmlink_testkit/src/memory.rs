//! A stateful in-memory remote bridge.
//!
//! [`MemoryBridge`] keeps records per entity, evaluates query markup
//! against them and answers typed requests, so client flows can be tested
//! end to end without a server. Values are compared through their query
//! text, the way the markup carries them.

use crmlink_codec::{format_query_text, Value};
use crmlink_core::{
    flatten_record, Condition, CoreError, CoreResult, EntityMetadata, EntityReference, Filter,
    FilterType, Operator, Projection, Query, Record, RecordId, RemoteBridge, RemoteError, Request,
    Response, TypedValue, WhoAmI,
};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;

/// A link made through a relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Relationship name.
    pub relationship: String,
    /// Record the link was made from.
    pub from: EntityReference,
    /// Linked record.
    pub to: EntityReference,
}

#[derive(Debug, Default)]
struct Store {
    records: HashMap<String, Vec<Record>>,
    links: Vec<Link>,
    requests: Vec<Request>,
    queries: Vec<String>,
}

/// In-memory implementation of [`RemoteBridge`].
#[derive(Debug)]
pub struct MemoryBridge {
    metadata: HashMap<String, EntityMetadata>,
    identity: WhoAmI,
    store: Mutex<Store>,
}

impl MemoryBridge {
    /// Creates an empty bridge with a random identity.
    pub fn new() -> Self {
        Self {
            metadata: HashMap::new(),
            identity: WhoAmI {
                user_id: RecordId::new(),
                business_unit_id: RecordId::new(),
                organization_id: RecordId::new(),
            },
            store: Mutex::new(Store::default()),
        }
    }

    /// Registers an entity.
    #[must_use]
    pub fn with_entity(mut self, metadata: EntityMetadata) -> Self {
        self.metadata
            .insert(metadata.logical_name.to_lowercase(), metadata);
        self
    }

    /// Sets the identity returned for `WhoAmI`.
    #[must_use]
    pub fn with_identity(mut self, identity: WhoAmI) -> Self {
        self.identity = identity;
        self
    }

    /// The identity returned for `WhoAmI`.
    pub fn identity(&self) -> WhoAmI {
        self.identity
    }

    /// Stores a record as is, assigning an id if it has none.
    pub fn insert(&self, record: Record) -> RecordId {
        let record = self.with_primary_id(record);
        let id = record.id.unwrap_or_default();
        self.store
            .lock()
            .records
            .entry(record.logical_name.clone())
            .or_default()
            .push(record);
        id
    }

    /// A stored record.
    pub fn record(&self, entity: &str, id: RecordId) -> Option<Record> {
        self.store
            .lock()
            .records
            .get(entity)
            .and_then(|records| records.iter().find(|r| r.id == Some(id)).cloned())
    }

    /// Every stored record of an entity, in insertion order.
    pub fn records(&self, entity: &str) -> Vec<Record> {
        self.store
            .lock()
            .records
            .get(entity)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of stored records of an entity.
    pub fn count(&self, entity: &str) -> usize {
        self.store.lock().records.get(entity).map_or(0, Vec::len)
    }

    /// Current relationship links.
    pub fn links(&self) -> Vec<Link> {
        self.store.lock().links.clone()
    }

    /// Typed requests executed so far.
    pub fn requests(&self) -> Vec<Request> {
        self.store.lock().requests.clone()
    }

    /// Query markup received so far.
    pub fn queries(&self) -> Vec<String> {
        self.store.lock().queries.clone()
    }

    fn with_primary_id(&self, mut record: Record) -> Record {
        let id = *record.id.get_or_insert_with(RecordId::new);
        let primary_id = self
            .metadata
            .get(&record.logical_name)
            .and_then(|m| m.primary_id_attribute.clone());
        if let Some(primary_id) = primary_id {
            record.insert(primary_id, TypedValue::Raw(Value::from(id)));
        }
        record
    }

    fn modify(
        &self,
        entity: &str,
        id: RecordId,
        f: impl FnOnce(&mut Record),
    ) -> CoreResult<()> {
        let mut store = self.store.lock();
        let record = store
            .records
            .get_mut(entity)
            .and_then(|records| records.iter_mut().find(|r| r.id == Some(id)))
            .ok_or_else(|| RemoteError::not_found(entity, id))?;
        f(record);
        Ok(())
    }
}

impl Default for MemoryBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteBridge for MemoryBridge {
    fn retrieve(&self, entity: &str, id: RecordId, columns: &Projection) -> CoreResult<Record> {
        let record = self
            .record(entity, id)
            .ok_or_else(|| RemoteError::not_found(entity, id))?;
        Ok(project(record, columns))
    }

    fn retrieve_multiple(&self, markup: &str) -> CoreResult<Vec<Record>> {
        let query = Query::parse_markup(markup)?;
        self.store.lock().queries.push(markup.to_string());
        Ok(self
            .records(&query.entity)
            .into_iter()
            .filter(|record| query.filter.as_ref().map_or(true, |f| matches_filter(record, f)))
            .map(|record| project(record, &query.projection))
            .collect())
    }

    fn create(&self, record: &Record) -> CoreResult<RecordId> {
        if !self.metadata.contains_key(&record.logical_name) {
            return Err(unknown_entity(&record.logical_name).into());
        }
        if let Some(id) = record.id {
            if self.record(&record.logical_name, id).is_some() {
                return Err(RemoteError::new("Cannot insert duplicate key.").into());
            }
        }
        Ok(self.insert(record.clone()))
    }

    fn update(&self, record: &Record) -> CoreResult<()> {
        let id = record
            .id
            .ok_or_else(|| RemoteError::new("Entity Id must be specified for Update"))?;
        self.modify(&record.logical_name, id, |stored| {
            for (name, value) in &record.attributes {
                stored.insert(name.as_str(), value.clone());
            }
        })
    }

    fn delete(&self, entity: &str, id: RecordId) -> CoreResult<()> {
        let mut store = self.store.lock();
        let records = store.records.entry(entity.to_string()).or_default();
        let before = records.len();
        records.retain(|r| r.id != Some(id));
        if records.len() == before {
            return Err(RemoteError::not_found(entity, id).into());
        }
        Ok(())
    }

    fn associate(
        &self,
        entity: &str,
        id: RecordId,
        relationship: &str,
        related: &[EntityReference],
    ) -> CoreResult<()> {
        let from = EntityReference::new(entity, id);
        let mut store = self.store.lock();
        for to in related {
            let link = Link {
                relationship: relationship.to_string(),
                from: from.clone(),
                to: to.clone(),
            };
            if store.links.contains(&link) {
                return Err(RemoteError::new("Cannot insert duplicate key.").into());
            }
            store.links.push(link);
        }
        Ok(())
    }

    fn disassociate(
        &self,
        entity: &str,
        id: RecordId,
        relationship: &str,
        related: &[EntityReference],
    ) -> CoreResult<()> {
        let from = EntityReference::new(entity, id);
        self.store.lock().links.retain(|link| {
            !(link.relationship == relationship
                && link.from == from
                && related.contains(&link.to))
        });
        Ok(())
    }

    fn entity_metadata(&self, entity: &str) -> CoreResult<String> {
        self.metadata
            .get(&entity.to_lowercase())
            .ok_or_else(|| CoreError::entity_not_found(entity))?
            .to_json()
    }

    fn execute(&self, request: &Request) -> CoreResult<Response> {
        self.store.lock().requests.push(request.clone());
        match request {
            Request::WhoAmI => Ok(Response::WhoAmI(self.identity)),
            Request::Assign { target, assignee } => {
                self.modify(&target.logical_name, target.id, |record| {
                    record.insert("ownerid", assignee.clone());
                })?;
                Ok(Response::Empty)
            }
            Request::SetState {
                entity,
                state,
                status,
            } => {
                self.modify(&entity.logical_name, entity.id, |record| {
                    record.insert("statecode", TypedValue::Choice(*state));
                    record.insert("statuscode", TypedValue::Choice(*status));
                })?;
                Ok(Response::Empty)
            }
        }
    }
}

fn unknown_entity(entity: &str) -> RemoteError {
    RemoteError::new(format!("Could not find an entity with name {entity}"))
}

fn project(mut record: Record, projection: &Projection) -> Record {
    if let Some(names) = projection.names() {
        record
            .attributes
            .retain(|(name, _)| names.iter().any(|n| n.eq_ignore_ascii_case(name)));
    }
    record
}

fn matches_filter(record: &Record, filter: &Filter) -> bool {
    let mut results = filter
        .conditions
        .iter()
        .map(|condition| matches_condition(record, condition));
    match filter.filter_type {
        FilterType::And => results.all(|matched| matched),
        FilterType::Or => results.any(|matched| matched),
    }
}

fn matches_condition(record: &Record, condition: &Condition) -> bool {
    let actual = record
        .get(condition.attribute())
        .and_then(query_text);
    let values: Vec<String> = condition.values().iter().map(format_query_text).collect();

    let Some(actual) = actual else {
        return match condition.operator() {
            Operator::IsNull => true,
            Operator::NotEqual | Operator::NotIn | Operator::NotLike | Operator::NotBetween => true,
            _ => false,
        };
    };

    let first = values.first().map(String::as_str).unwrap_or_default();
    let between = || {
        values.len() == 2
            && compare(&actual, &values[0]) != Ordering::Less
            && compare(&actual, &values[1]) != Ordering::Greater
    };

    match condition.operator() {
        Operator::Equal => compare(&actual, first) == Ordering::Equal,
        Operator::NotEqual => compare(&actual, first) != Ordering::Equal,
        Operator::GreaterThan => compare(&actual, first) == Ordering::Greater,
        Operator::GreaterEqual => compare(&actual, first) != Ordering::Less,
        Operator::LessThan => compare(&actual, first) == Ordering::Less,
        Operator::LessEqual => compare(&actual, first) != Ordering::Greater,
        Operator::Like => like(&actual, first),
        Operator::NotLike => !like(&actual, first),
        Operator::In => values.iter().any(|v| compare(&actual, v) == Ordering::Equal),
        Operator::NotIn => values.iter().all(|v| compare(&actual, v) != Ordering::Equal),
        Operator::Between => between(),
        Operator::NotBetween => !between(),
        Operator::IsNull => false,
        Operator::IsNotNull => true,
    }
}

/// Text of a stored value as it would appear in query markup.
fn query_text(value: &TypedValue) -> Option<String> {
    let record = Record::new("value").with("v", value.clone());
    let flat = flatten_record(&record, 8).ok()?;
    match flat.get("v")? {
        Value::Null => None,
        other => Some(format_query_text(other)),
    }
}

/// Numbers compare numerically, everything else as text ignoring case.
fn compare(left: &str, right: &str) -> Ordering {
    match (left.parse::<f64>(), right.parse::<f64>()) {
        (Ok(l), Ok(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => left.to_lowercase().cmp(&right.to_lowercase()),
    }
}

/// `%` matches any run of characters and `_` exactly one, ignoring case.
fn like(text: &str, pattern: &str) -> bool {
    fn matches(text: &[char], pattern: &[char]) -> bool {
        match pattern.split_first() {
            None => text.is_empty(),
            Some(('%', rest)) => (0..=text.len()).any(|skip| matches(&text[skip..], rest)),
            Some(('_', rest)) => !text.is_empty() && matches(&text[1..], rest),
            Some((c, rest)) => text.first() == Some(c) && matches(&text[1..], rest),
        }
    }
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    matches(&text, &pattern)
}
