//! CRUD orchestration over a remote bridge.

use crate::bridge::RemoteBridge;
use crate::config::ClientConfig;
use crate::conditions::compile;
use crate::convert::Converter;
use crate::error::{CoreError, CoreResult};
use crate::id::RecordId;
use crate::metadata::{AttributeType, EntityMetadata};
use crate::query::{Projection, Query};
use crate::request::{Request, Response, WhoAmI};
use crate::schema::SchemaCache;
use crate::typed::{EntityReference, TypedValue};
use crmlink_codec::{Map, Value, TAG_TYPE_KEY, TAG_VALUE_KEY};
use crmlink_table::TabularData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which records an operation applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// One record.
    Id(RecordId),
    /// Several records.
    Ids(Vec<RecordId>),
    /// Every record matching a conditions object.
    Conditions(Map),
}

impl Selector {
    /// Builds a selector from a loose value: an id string, a list of id
    /// strings, or a conditions object.
    ///
    /// # Errors
    ///
    /// Returns a validation error for any other shape or an invalid id.
    pub fn from_value(value: &Value) -> CoreResult<Self> {
        match value {
            Value::Text(text) => Ok(Self::Id(RecordId::parse(text)?)),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Text(text) => RecordId::parse(text),
                    other => Err(CoreError::validation(format!(
                        "record ids must be strings, got {}",
                        other.type_name()
                    ))),
                })
                .collect::<CoreResult<Vec<_>>>()
                .map(Self::Ids),
            Value::Map(conditions) => Ok(Self::Conditions(conditions.clone())),
            other => Err(CoreError::validation(format!(
                "invalid record selector of type {}",
                other.type_name()
            ))),
        }
    }
}

impl From<RecordId> for Selector {
    fn from(id: RecordId) -> Self {
        Self::Id(id)
    }
}

impl From<Vec<RecordId>> for Selector {
    fn from(ids: Vec<RecordId>) -> Self {
        Self::Ids(ids)
    }
}

impl From<Map> for Selector {
    fn from(conditions: Map) -> Self {
        Self::Conditions(conditions)
    }
}

/// Result of a match-then-write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No record matched; one was created.
    Created(RecordId),
    /// One record matched and was updated.
    Updated(RecordId),
    /// A record matched and was left as is.
    Unchanged(RecordId),
}

impl WriteOutcome {
    /// Id of the record written or matched.
    pub fn id(&self) -> RecordId {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Unchanged(id) => *id,
        }
    }

    /// Returns true if a record was created.
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Client for reading and writing records of a schema-described store.
///
/// Every call blocks until the bridge answers. Entity metadata is cached
/// for the life of the client.
///
/// # Example
///
/// ```
/// use crmlink_codec::Map;
/// use crmlink_core::{
///     AttributeMetadata, AttributeType, CrmClient, EntityMetadata, MockBridge, RecordId,
/// };
///
/// let bridge = MockBridge::new();
/// bridge
///     .add_metadata(
///         &EntityMetadata::new("account")
///             .with_primary_id("accountid")
///             .with_attribute(AttributeMetadata::new("accountid", AttributeType::Uniqueidentifier))
///             .with_attribute(AttributeMetadata::new("name", AttributeType::String)),
///     )
///     .unwrap();
///
/// let client = CrmClient::new(bridge);
/// let id = RecordId::new();
/// let attributes = Map::new()
///     .with("accountid", id.to_string())
///     .with("name", "Contoso");
/// assert_eq!(client.create("account", &attributes).unwrap(), id);
/// ```
pub struct CrmClient<B: RemoteBridge> {
    bridge: Arc<B>,
    cache: SchemaCache,
    config: ClientConfig,
}

impl<B: RemoteBridge> CrmClient<B> {
    /// Creates a client with the default configuration.
    pub fn new(bridge: B) -> Self {
        Self::with_config(bridge, ClientConfig::default())
    }

    /// Creates a client with a configuration.
    pub fn with_config(bridge: B, config: ClientConfig) -> Self {
        Self::from_parts(Arc::new(bridge), SchemaCache::new(), config)
    }

    /// Creates a client from a shared bridge and a pre-seeded cache.
    pub fn from_parts(bridge: Arc<B>, cache: SchemaCache, config: ClientConfig) -> Self {
        Self {
            bridge,
            cache,
            config,
        }
    }

    /// The bridge.
    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// The configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The metadata cache.
    pub fn schema_cache(&self) -> &SchemaCache {
        &self.cache
    }

    fn converter(&self) -> Converter<'_> {
        Converter::new(self.bridge.as_ref(), &self.cache, &self.config)
    }

    /// Returns the metadata of an entity, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name, or the bridge's
    /// error unchanged.
    pub fn entity_metadata(&self, entity: &str) -> CoreResult<Arc<EntityMetadata>> {
        let entity = normalize_entity(entity)?;
        self.cache.get_or_fetch(&entity, self.bridge.as_ref())
    }

    /// Returns the lower-cased primary id attribute of an entity.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingPrimaryId`] if the metadata names none.
    pub fn id_field(&self, entity: &str) -> CoreResult<String> {
        let metadata = self.entity_metadata(entity)?;
        metadata
            .primary_id_attribute
            .as_deref()
            .map(str::to_lowercase)
            .ok_or_else(|| CoreError::MissingPrimaryId {
                entity: metadata.logical_name.clone(),
            })
    }

    /// Reads one record by id or by conditions.
    ///
    /// Conditions must match at most one record. Returns `None` when
    /// nothing matches or the record does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TooManyRecords`] when conditions match several
    /// records, a validation error for a list of ids, and any other bridge
    /// error unchanged.
    pub fn retrieve(
        &self,
        entity: &str,
        selector: impl Into<Selector>,
        columns: &Projection,
    ) -> CoreResult<Option<Map>> {
        let entity = normalize_entity(entity)?;
        self.entity_metadata(&entity)?;
        let id = match selector.into() {
            Selector::Id(id) => id,
            Selector::Ids(_) => {
                return Err(CoreError::validation(
                    "retrieve takes one id or a conditions object",
                ))
            }
            Selector::Conditions(conditions) => {
                let ids = self.matching_ids(&entity, &conditions)?;
                match ids.as_slice() {
                    [] => return Ok(None),
                    [id] => *id,
                    _ => {
                        return Err(CoreError::TooManyRecords {
                            entity,
                            count: ids.len(),
                        })
                    }
                }
            }
        };

        let columns = self.normalize_projection(&entity, columns)?;
        match self.bridge.retrieve(&entity, id, &columns) {
            Ok(record) => self.converter().from_record(&record).map(Some),
            Err(err) if err.is_not_found_fault(&entity, id) => {
                debug!(entity = %entity, %id, "record does not exist");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Runs a multi-record read.
    ///
    /// With neither conditions nor columns, `entity_or_markup` is taken as
    /// query markup when it starts with `<`, and as an entity name (every
    /// attribute, no filter) otherwise. Columns default to every attribute.
    ///
    /// # Errors
    ///
    /// Returns validation and schema errors before calling the bridge, and
    /// the bridge's error unchanged.
    pub fn retrieve_multiple(
        &self,
        entity_or_markup: &str,
        conditions: Option<&Map>,
        columns: Option<&Projection>,
    ) -> CoreResult<TabularData> {
        if conditions.is_none() && columns.is_none() && is_markup(entity_or_markup) {
            return self.retrieve_markup(entity_or_markup);
        }

        let entity = normalize_entity(entity_or_markup)?;
        let projection = match columns {
            Some(columns) => self.normalize_projection(&entity, columns)?,
            None => Projection::All,
        };
        let mut query = Query::new(entity.as_str()).with_projection(projection);
        if let Some(conditions) = conditions {
            query = query.with_filter(compile(conditions)?);
        }
        self.retrieve_markup(&query.to_markup())
    }

    /// Runs query markup and returns the flattened rows, in a table named
    /// after the queried entity.
    ///
    /// # Errors
    ///
    /// Returns the bridge's error unchanged.
    pub fn retrieve_markup(&self, markup: &str) -> CoreResult<TabularData> {
        debug!(markup, "retrieving multiple records");
        let records = self.bridge.retrieve_multiple(markup)?;
        let name = Query::parse_markup(markup)
            .ok()
            .map(|query| query.entity)
            .or_else(|| records.first().map(|r| r.logical_name.clone()));

        let converter = self.converter();
        let rows = records
            .iter()
            .map(|record| converter.from_record(record))
            .collect::<CoreResult<Vec<_>>>()?;
        debug!(count = rows.len(), "records retrieved");
        Ok(TabularData::from_rows(name, rows))
    }

    /// Reads every attribute of every record of an entity.
    ///
    /// # Errors
    ///
    /// See [`CrmClient::retrieve_multiple`].
    pub fn retrieve_all(&self, entity: &str) -> CoreResult<TabularData> {
        self.retrieve_multiple(entity, None, Some(&Projection::All))
    }

    /// Creates a record and returns its id.
    ///
    /// # Errors
    ///
    /// Returns conversion errors before calling the bridge, and the
    /// bridge's error unchanged.
    pub fn create(&self, entity: &str, attributes: &Map) -> CoreResult<RecordId> {
        let record = self.converter().to_record(entity, attributes)?;
        let id = self.bridge.create(&record)?;
        debug!(entity = %record.logical_name, %id, "record created");
        Ok(id)
    }

    /// Creates one record per row of a named table and writes each new id
    /// back into its row under the primary id column.
    ///
    /// Rows are created in order; a failure leaves earlier rows created.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the table has no name, and the first
    /// failure otherwise.
    pub fn create_table(&self, table: &mut TabularData) -> CoreResult<usize> {
        let entity = table_entity(table)?;
        let id_field = self.id_field(&entity)?;
        let total = table.len();
        for (index, row) in table.rows_mut().iter_mut().enumerate() {
            debug!(entity = %entity, row = index + 1, total, "creating record");
            let id = self.create(&entity, row)?;
            row.insert(id_field.as_str(), id);
        }
        Ok(total)
    }

    /// Updates records and returns how many were written.
    ///
    /// Without conditions the attributes must carry the primary id and one
    /// record is updated. With conditions every matching record is
    /// updated with the same attributes.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no id is given without conditions,
    /// conversion errors before any write, and the first bridge failure.
    pub fn update(&self, entity: &str, attributes: &Map, conditions: Option<&Map>) -> CoreResult<usize> {
        let mut record = self.converter().to_record(entity, attributes)?;
        let entity = record.logical_name.clone();

        let Some(conditions) = conditions else {
            if record.id.is_none() {
                let id_field = self.id_field(&entity)?;
                return Err(CoreError::validation(format!(
                    "the attributes must include the '{id_field}' identifier when no conditions are given"
                )));
            }
            self.bridge.update(&record)?;
            return Ok(1);
        };

        let id_field = self.id_field(&entity)?;
        let ids = self.matching_ids(&entity, conditions)?;
        debug!(entity = %entity, count = ids.len(), "updating matching records");
        for (index, id) in ids.iter().enumerate() {
            debug!(entity = %entity, row = index + 1, %id, "updating record");
            record.id = Some(*id);
            record.insert(id_field.as_str(), TypedValue::Raw(Value::from(*id)));
            self.bridge.update(&record)?;
        }
        Ok(ids.len())
    }

    /// Deletes records and returns how many were deleted.
    ///
    /// # Errors
    ///
    /// Returns the first bridge failure; earlier deletes stay done.
    pub fn delete(&self, entity: &str, selector: impl Into<Selector>) -> CoreResult<usize> {
        let entity = normalize_entity(entity)?;
        let ids = match selector.into() {
            Selector::Id(id) => vec![id],
            Selector::Ids(ids) => ids,
            Selector::Conditions(conditions) => self.matching_ids(&entity, &conditions)?,
        };
        for id in &ids {
            debug!(entity = %entity, %id, "deleting record");
            self.bridge.delete(&entity, *id)?;
        }
        Ok(ids.len())
    }

    /// Updates the record matching `match_fields`, or creates one when
    /// none matches.
    ///
    /// Match fields whose value is missing or null are left out of the
    /// match. With no usable match field nothing is queried and a record
    /// is always created.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AttributeNotFound`] for a match field missing
    /// from the metadata and [`CoreError::TooManyRecords`] when several
    /// records match.
    pub fn create_or_update(
        &self,
        entity: &str,
        attributes: &Map,
        match_fields: &[&str],
    ) -> CoreResult<WriteOutcome> {
        self.match_then_write(entity, attributes, match_fields, true)
    }

    /// Creates a record unless one matching `match_fields` exists.
    ///
    /// # Errors
    ///
    /// Same as [`CrmClient::create_or_update`], except that several
    /// matches leave everything unchanged.
    pub fn create_if_not_exists(
        &self,
        entity: &str,
        attributes: &Map,
        match_fields: &[&str],
    ) -> CoreResult<WriteOutcome> {
        self.match_then_write(entity, attributes, match_fields, false)
    }

    /// Runs [`CrmClient::create_if_not_exists`] for every row of a named
    /// table and returns how many records were created.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the table has no name, and the first
    /// failure otherwise.
    pub fn create_table_if_not_exists(
        &self,
        table: &TabularData,
        match_fields: &[&str],
    ) -> CoreResult<usize> {
        let entity = table_entity(table)?;
        let mut created = 0;
        for (index, row) in table.rows().iter().enumerate() {
            debug!(entity = %entity, row = index + 1, total = table.len(), "create if not exists");
            if self.create_if_not_exists(&entity, row, match_fields)?.is_created() {
                created += 1;
            }
        }
        Ok(created)
    }

    fn match_then_write(
        &self,
        entity: &str,
        attributes: &Map,
        match_fields: &[&str],
        update: bool,
    ) -> CoreResult<WriteOutcome> {
        let entity = normalize_entity(entity)?;
        let id_field = self.id_field(&entity)?;
        let conditions = self.match_conditions(&entity, attributes, match_fields)?;

        let ids = if conditions.is_empty() {
            Vec::new()
        } else {
            self.matching_ids(&entity, &conditions)?
        };

        match ids.as_slice() {
            [] => self.create(&entity, attributes).map(WriteOutcome::Created),
            [id] if update => {
                let merged = without_key(attributes, &id_field).with(id_field.as_str(), *id);
                self.update(&entity, &merged, None)?;
                Ok(WriteOutcome::Updated(*id))
            }
            [id, ..] if !update => Ok(WriteOutcome::Unchanged(*id)),
            _ => Err(CoreError::TooManyRecords {
                entity,
                count: ids.len(),
            }),
        }
    }

    fn match_conditions(
        &self,
        entity: &str,
        attributes: &Map,
        match_fields: &[&str],
    ) -> CoreResult<Map> {
        let metadata = self.entity_metadata(entity)?;
        let mut conditions = Map::new();
        for field in match_fields {
            let attribute = metadata
                .find_attribute(field)
                .ok_or_else(|| CoreError::attribute_not_found(entity, *field))?;
            let value = attributes
                .get_ignore_case(field)
                .or_else(|| attributes.get_ignore_case(&attribute.logical_name))
                .map(|(_, value)| value);
            if let Some(value) = value.filter(|v| !v.is_null()) {
                conditions.insert(attribute.logical_name.as_str(), condition_value(value));
            }
        }
        Ok(conditions)
    }

    /// Ids of the records matching a conditions object.
    fn matching_ids(&self, entity: &str, conditions: &Map) -> CoreResult<Vec<RecordId>> {
        let id_field = self.id_field(entity)?;
        let query = Query::from_conditions(
            entity,
            conditions,
            Projection::columns([id_field.as_str()]),
        )?;
        if query.filter.as_ref().is_none_or(|filter| filter.is_empty()) {
            warn!(entity = %entity, "no usable conditions, every record matches");
        }
        let markup = query.to_markup();
        debug!(markup = %markup, "finding matching records");
        let records = self.bridge.retrieve_multiple(&markup)?;
        records
            .iter()
            .map(|record| {
                record
                    .id
                    .or_else(|| record.get(&id_field).and_then(TypedValue::as_record_id))
                    .ok_or_else(|| CoreError::MissingPrimaryId {
                        entity: entity.to_string(),
                    })
            })
            .collect()
    }

    fn normalize_projection(&self, entity: &str, columns: &Projection) -> CoreResult<Projection> {
        let Some(names) = columns.names() else {
            return Ok(Projection::All);
        };
        let metadata = self.entity_metadata(entity)?;
        let names = names
            .iter()
            .map(|name| {
                metadata
                    .find_attribute(name)
                    .map(|a| a.logical_name.clone())
                    .ok_or_else(|| CoreError::attribute_not_found(entity, name.as_str()))
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(Projection::columns(names))
    }

    /// Links a record to others through a relationship.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty relationship name, and the
    /// bridge's error unchanged.
    pub fn associate(
        &self,
        from: &EntityReference,
        relationship: &str,
        to: &[EntityReference],
    ) -> CoreResult<()> {
        let relationship = normalize_relationship(relationship)?;
        self.bridge
            .associate(&from.logical_name, from.id, relationship, to)
    }

    /// Removes links made through a relationship.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty relationship name, and the
    /// bridge's error unchanged.
    pub fn disassociate(
        &self,
        from: &EntityReference,
        relationship: &str,
        to: &[EntityReference],
    ) -> CoreResult<()> {
        let relationship = normalize_relationship(relationship)?;
        self.bridge
            .disassociate(&from.logical_name, from.id, relationship, to)
    }

    /// Associates every row of a table named after the relationship. Each
    /// row holds `from` and `to` as `{type, value}` references.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed row, and the first
    /// bridge failure.
    pub fn associate_table(&self, table: &TabularData) -> CoreResult<usize> {
        self.relate_table(table, true)
    }

    /// Disassociates every row of a table named after the relationship.
    ///
    /// # Errors
    ///
    /// See [`CrmClient::associate_table`].
    pub fn disassociate_table(&self, table: &TabularData) -> CoreResult<usize> {
        self.relate_table(table, false)
    }

    fn relate_table(&self, table: &TabularData, associate: bool) -> CoreResult<usize> {
        let relationship = table
            .name()
            .ok_or_else(|| CoreError::validation("the table must be named after the relationship"))?;
        for row in table.rows() {
            let from = row_reference(row, "from")?;
            let to = row_reference(row, "to")?;
            if associate {
                self.associate(&from, relationship, &[to])?;
            } else {
                self.disassociate(&from, relationship, &[to])?;
            }
        }
        Ok(table.len())
    }

    /// Gives a record to another user or team.
    ///
    /// The assignee type defaults to the configured assignee entity.
    ///
    /// # Errors
    ///
    /// Returns the bridge's error unchanged.
    pub fn assign(
        &self,
        entity: &str,
        id: RecordId,
        assignee: RecordId,
        assignee_type: Option<&str>,
    ) -> CoreResult<()> {
        let entity = normalize_entity(entity)?;
        let assignee_type = assignee_type.unwrap_or(&self.config.default_assignee_type);
        let request = Request::Assign {
            target: EntityReference::new(entity, id),
            assignee: EntityReference::new(assignee_type, assignee),
        };
        self.execute(&request).map(|_| ())
    }

    /// Moves a record to another state and status.
    ///
    /// `state` and `status` are numeric codes or labels of the entity's
    /// state and status attributes.
    ///
    /// # Errors
    ///
    /// Returns a conversion error for an unknown label, and the bridge's
    /// error unchanged.
    pub fn set_state(&self, entity: &str, id: RecordId, state: &Value, status: &Value) -> CoreResult<()> {
        let metadata = self.entity_metadata(entity)?;
        let state = state_code(&metadata, AttributeType::State, state)?;
        let status = state_code(&metadata, AttributeType::Status, status)?;
        let request = Request::SetState {
            entity: EntityReference::new(metadata.logical_name.as_str(), id),
            state,
            status,
        };
        self.execute(&request).map(|_| ())
    }

    /// Identifies the calling user.
    ///
    /// # Errors
    ///
    /// Returns a remote error if the bridge answers with anything else.
    pub fn who_am_i(&self) -> CoreResult<WhoAmI> {
        match self.execute(&Request::WhoAmI)? {
            Response::WhoAmI(identity) => Ok(identity),
            other => Err(CoreError::remote(format!(
                "unexpected response to WhoAmI: {other:?}"
            ))),
        }
    }

    /// Executes a typed request.
    ///
    /// # Errors
    ///
    /// Returns the bridge's error unchanged.
    pub fn execute(&self, request: &Request) -> CoreResult<Response> {
        debug!(request = request.name(), "executing request");
        self.bridge.execute(request)
    }
}

impl<B: RemoteBridge> std::fmt::Debug for CrmClient<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrmClient")
            .field("cached_entities", &self.cache.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn normalize_entity(entity: &str) -> CoreResult<String> {
    let entity = entity.trim().to_lowercase();
    if entity.is_empty() {
        return Err(CoreError::validation("entity name is required"));
    }
    Ok(entity)
}

fn normalize_relationship(relationship: &str) -> CoreResult<&str> {
    let relationship = relationship.trim();
    if relationship.is_empty() {
        return Err(CoreError::validation("relationship name is required"));
    }
    Ok(relationship)
}

fn is_markup(text: &str) -> bool {
    text.trim_start().starts_with('<')
}

fn table_entity(table: &TabularData) -> CoreResult<String> {
    table
        .name()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| CoreError::validation("the table must have a name"))
        .and_then(normalize_entity)
}

fn without_key(map: &Map, key: &str) -> Map {
    map.iter()
        .filter(|(k, _)| !k.eq_ignore_ascii_case(key))
        .map(|(k, v)| (k, v.clone()))
        .collect()
}

/// Match values are compared as written; a reference given as
/// `{id, type}` matches on its id.
fn condition_value(value: &Value) -> Value {
    match value.as_map() {
        Some(map) => map
            .get_ignore_case("id")
            .or_else(|| map.get_ignore_case(TAG_VALUE_KEY))
            .map_or_else(|| value.clone(), |(_, v)| v.clone()),
        None => value.clone(),
    }
}

fn row_reference(row: &Map, key: &str) -> CoreResult<EntityReference> {
    let invalid = || {
        CoreError::validation(format!(
            "column '{key}' must hold a {{{TAG_TYPE_KEY}, {TAG_VALUE_KEY}}} reference"
        ))
    };
    let map = row.get(key).and_then(Value::as_map).ok_or_else(invalid)?;
    let entity = map
        .get(TAG_TYPE_KEY)
        .and_then(Value::as_text)
        .ok_or_else(invalid)?;
    let id = map
        .get(TAG_VALUE_KEY)
        .and_then(Value::as_text)
        .ok_or_else(invalid)?;
    Ok(EntityReference::new(normalize_entity(entity)?, RecordId::parse(id)?))
}

fn state_code(metadata: &EntityMetadata, kind: AttributeType, value: &Value) -> CoreResult<i32> {
    let attribute = metadata.attribute_of_type(kind);
    let mismatch = || {
        CoreError::conversion(
            attribute.map_or(kind.as_str(), |a| a.logical_name.as_str()),
            crmlink_codec::format_query_text(value),
            value.type_name(),
            kind.as_str(),
        )
    };
    match value {
        Value::Integer(n) => i32::try_from(*n).map_err(|_| mismatch()),
        Value::Text(label) => attribute
            .and_then(|a| a.option_by_label(label))
            .map(|option| option.value)
            .ok_or_else(mismatch),
        _ => Err(mismatch()),
    }
}
