//! Remote bridge abstraction.

use crate::error::{CoreError, CoreResult, RemoteError};
use crate::id::RecordId;
use crate::metadata::EntityMetadata;
use crate::query::Projection;
use crate::request::{Request, Response};
use crate::typed::{EntityReference, Record};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// The connection to the remote platform.
///
/// Every call blocks until the platform answers. Timeouts, retries and
/// authentication belong to the implementation.
pub trait RemoteBridge: Send + Sync {
    /// Reads one record.
    fn retrieve(&self, entity: &str, id: RecordId, columns: &Projection) -> CoreResult<Record>;

    /// Runs query markup and returns the matching records.
    fn retrieve_multiple(&self, markup: &str) -> CoreResult<Vec<Record>>;

    /// Creates a record and returns its id.
    fn create(&self, record: &Record) -> CoreResult<RecordId>;

    /// Updates the record identified by `record.id`.
    fn update(&self, record: &Record) -> CoreResult<()>;

    /// Deletes a record.
    fn delete(&self, entity: &str, id: RecordId) -> CoreResult<()>;

    /// Links records through a relationship.
    fn associate(
        &self,
        entity: &str,
        id: RecordId,
        relationship: &str,
        related: &[EntityReference],
    ) -> CoreResult<()>;

    /// Removes links made through a relationship.
    fn disassociate(
        &self,
        entity: &str,
        id: RecordId,
        relationship: &str,
        related: &[EntityReference],
    ) -> CoreResult<()>;

    /// Describes an entity, returning its metadata as JSON.
    ///
    /// An unknown entity is reported as [`CoreError::EntityNotFound`] or
    /// as an empty (or `null`) payload.
    fn entity_metadata(&self, entity: &str) -> CoreResult<String>;

    /// Executes a typed request.
    fn execute(&self, request: &Request) -> CoreResult<Response>;
}

impl<B: RemoteBridge + ?Sized> RemoteBridge for Arc<B> {
    fn retrieve(&self, entity: &str, id: RecordId, columns: &Projection) -> CoreResult<Record> {
        (**self).retrieve(entity, id, columns)
    }

    fn retrieve_multiple(&self, markup: &str) -> CoreResult<Vec<Record>> {
        (**self).retrieve_multiple(markup)
    }

    fn create(&self, record: &Record) -> CoreResult<RecordId> {
        (**self).create(record)
    }

    fn update(&self, record: &Record) -> CoreResult<()> {
        (**self).update(record)
    }

    fn delete(&self, entity: &str, id: RecordId) -> CoreResult<()> {
        (**self).delete(entity, id)
    }

    fn associate(
        &self,
        entity: &str,
        id: RecordId,
        relationship: &str,
        related: &[EntityReference],
    ) -> CoreResult<()> {
        (**self).associate(entity, id, relationship, related)
    }

    fn disassociate(
        &self,
        entity: &str,
        id: RecordId,
        relationship: &str,
        related: &[EntityReference],
    ) -> CoreResult<()> {
        (**self).disassociate(entity, id, relationship, related)
    }

    fn entity_metadata(&self, entity: &str) -> CoreResult<String> {
        (**self).entity_metadata(entity)
    }

    fn execute(&self, request: &Request) -> CoreResult<Response> {
        (**self).execute(request)
    }
}

/// A call received by [`MockBridge`].
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCall {
    /// Single-record read.
    Retrieve {
        /// Entity logical name.
        entity: String,
        /// Record id.
        id: RecordId,
        /// Requested columns.
        columns: Projection,
    },
    /// Query markup.
    RetrieveMultiple(String),
    /// Record creation.
    Create(Record),
    /// Record update.
    Update(Record),
    /// Record deletion.
    Delete {
        /// Entity logical name.
        entity: String,
        /// Record id.
        id: RecordId,
    },
    /// Relationship link or unlink.
    Relate {
        /// True for associate, false for disassociate.
        associate: bool,
        /// Entity logical name.
        entity: String,
        /// Record id.
        id: RecordId,
        /// Relationship name.
        relationship: String,
        /// Related records.
        related: Vec<EntityReference>,
    },
    /// Metadata request.
    Metadata(String),
    /// Typed request.
    Execute(Request),
}

/// A scripted bridge for testing.
///
/// Query and single-record results are served from queues in the order
/// they were pushed. An empty query queue yields no rows; an empty
/// retrieve queue yields the platform's "does not exist" fault. Every
/// call is logged.
#[derive(Debug, Default)]
pub struct MockBridge {
    metadata: Mutex<HashMap<String, String>>,
    retrieve_results: Mutex<VecDeque<Result<Record, RemoteError>>>,
    query_results: Mutex<VecDeque<Result<Vec<Record>, RemoteError>>>,
    responses: Mutex<VecDeque<Response>>,
    failures: Mutex<HashMap<&'static str, RemoteError>>,
    calls: Mutex<Vec<BridgeCall>>,
}

impl MockBridge {
    /// Creates a mock with no scripted results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers entity metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be serialized.
    pub fn add_metadata(&self, metadata: &EntityMetadata) -> CoreResult<()> {
        let json = metadata.to_json()?;
        self.metadata
            .lock()
            .insert(metadata.logical_name.clone(), json);
        Ok(())
    }

    /// Registers a raw metadata payload, as the remote side would send it.
    pub fn set_metadata_json(&self, entity: &str, json: impl Into<String>) {
        self.metadata.lock().insert(entity.to_string(), json.into());
    }

    /// Queues the result of the next single-record read.
    pub fn push_retrieve(&self, record: Record) {
        self.retrieve_results.lock().push_back(Ok(record));
    }

    /// Queues a failure for the next single-record read.
    pub fn push_retrieve_error(&self, error: RemoteError) {
        self.retrieve_results.lock().push_back(Err(error));
    }

    /// Queues the rows of the next query.
    pub fn push_query(&self, records: Vec<Record>) {
        self.query_results.lock().push_back(Ok(records));
    }

    /// Queues a failure for the next query.
    pub fn push_query_error(&self, error: RemoteError) {
        self.query_results.lock().push_back(Err(error));
    }

    /// Queues the response of the next typed request.
    pub fn push_response(&self, response: Response) {
        self.responses.lock().push_back(response);
    }

    /// Makes every call to `operation` fail with `error`.
    ///
    /// Operations are named `create`, `update`, `delete`, `associate`,
    /// `disassociate` and `execute`.
    pub fn fail(&self, operation: &'static str, error: RemoteError) {
        self.failures.lock().insert(operation, error);
    }

    /// Returns all calls received so far.
    pub fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().clone()
    }

    /// Returns the records passed to `update`.
    pub fn updates(&self) -> Vec<Record> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                BridgeCall::Update(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the records passed to `create`.
    pub fn creates(&self) -> Vec<Record> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                BridgeCall::Create(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the markup of every query received.
    pub fn queries(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                BridgeCall::RetrieveMultiple(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of metadata requests received.
    pub fn metadata_requests(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, BridgeCall::Metadata(_)))
            .count()
    }

    fn record(&self, call: BridgeCall) {
        self.calls.lock().push(call);
    }

    fn check(&self, operation: &'static str) -> CoreResult<()> {
        match self.failures.lock().get(operation) {
            Some(error) => Err(error.clone().into()),
            None => Ok(()),
        }
    }
}

impl RemoteBridge for MockBridge {
    fn retrieve(&self, entity: &str, id: RecordId, columns: &Projection) -> CoreResult<Record> {
        self.record(BridgeCall::Retrieve {
            entity: entity.to_string(),
            id,
            columns: columns.clone(),
        });
        match self.retrieve_results.lock().pop_front() {
            Some(result) => Ok(result?),
            None => Err(RemoteError::not_found(entity, id).into()),
        }
    }

    fn retrieve_multiple(&self, markup: &str) -> CoreResult<Vec<Record>> {
        self.record(BridgeCall::RetrieveMultiple(markup.to_string()));
        match self.query_results.lock().pop_front() {
            Some(result) => Ok(result?),
            None => Ok(Vec::new()),
        }
    }

    fn create(&self, record: &Record) -> CoreResult<RecordId> {
        self.record(BridgeCall::Create(record.clone()));
        self.check("create")?;
        Ok(record.id.unwrap_or_default())
    }

    fn update(&self, record: &Record) -> CoreResult<()> {
        self.record(BridgeCall::Update(record.clone()));
        self.check("update")
    }

    fn delete(&self, entity: &str, id: RecordId) -> CoreResult<()> {
        self.record(BridgeCall::Delete {
            entity: entity.to_string(),
            id,
        });
        self.check("delete")
    }

    fn associate(
        &self,
        entity: &str,
        id: RecordId,
        relationship: &str,
        related: &[EntityReference],
    ) -> CoreResult<()> {
        self.record(BridgeCall::Relate {
            associate: true,
            entity: entity.to_string(),
            id,
            relationship: relationship.to_string(),
            related: related.to_vec(),
        });
        self.check("associate")
    }

    fn disassociate(
        &self,
        entity: &str,
        id: RecordId,
        relationship: &str,
        related: &[EntityReference],
    ) -> CoreResult<()> {
        self.record(BridgeCall::Relate {
            associate: false,
            entity: entity.to_string(),
            id,
            relationship: relationship.to_string(),
            related: related.to_vec(),
        });
        self.check("disassociate")
    }

    fn entity_metadata(&self, entity: &str) -> CoreResult<String> {
        self.record(BridgeCall::Metadata(entity.to_string()));
        self.metadata
            .lock()
            .get(entity)
            .cloned()
            .ok_or_else(|| CoreError::entity_not_found(entity))
    }

    fn execute(&self, request: &Request) -> CoreResult<Response> {
        self.record(BridgeCall::Execute(request.clone()));
        self.check("execute")?;
        Ok(self.responses.lock().pop_front().unwrap_or(Response::Empty))
    }
}
