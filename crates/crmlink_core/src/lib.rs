//! # crmlink Core
//!
//! Client-side data access for a schema-described record store.
//!
//! This crate provides:
//! - Entity metadata and a fetch-once schema cache
//! - Schema-driven conversion between loose attribute maps and typed records
//! - Compilation of conditions objects into query markup
//! - CRUD orchestration over a pluggable remote bridge
//! - Typed requests (assign, set state, who am I)
//! - Bulk export to and import from table files
//!
//! ## Architecture
//!
//! Callers hand [`CrmClient`] plain [`Map`](crmlink_codec::Map)s. Before any
//! write, the client fetches the entity's metadata through the
//! [`SchemaCache`], converts every attribute to its declared type and then
//! calls the [`RemoteBridge`]. Reads go the other way: typed records from
//! the bridge are flattened back into maps, with references expanded into
//! `r`, `r_name` and `r_type` columns.
//!
//! ## Key Invariants
//!
//! - Metadata is fetched at most once per entity per client
//! - Validation and conversion errors are raised before the bridge is called
//! - State and status attributes change only through `set_state`
//! - Entity and attribute names are compared ignoring case

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod client;
mod conditions;
mod config;
mod convert;
mod error;
mod id;
mod metadata;
mod query;
mod request;
mod schema;
mod transfer;
mod typed;

pub use bridge::{BridgeCall, MockBridge, RemoteBridge};
pub use client::{CrmClient, Selector, WriteOutcome};
pub use conditions::{compile, Condition, Filter, FilterType, Operator, NOT_NULL};
pub use config::ClientConfig;
pub use convert::{flatten_record, Converter};
pub use error::{not_found_fault, CoreError, CoreResult, RemoteError};
pub use id::RecordId;
pub use metadata::{
    AttributeMetadata, AttributeType, BooleanOptions, EntityMetadata, OptionMetadata,
};
pub use query::{Projection, Query, WILDCARD};
pub use request::{Request, Response, WhoAmI};
pub use schema::SchemaCache;
pub use transfer::ImportSummary;
pub use typed::{EntityReference, Record, TypedValue};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
