//! Schema-driven conversion between loose attribute maps and typed records.
//!
//! Writes go through [`Converter::to_record`], which looks every attribute
//! up in the entity metadata and converts its value by attribute type.
//! Reads go through [`flatten_record`], which expands references into
//! `name`, `name_name` and `name_type` columns.

mod attribute;
mod entity;

pub use entity::flatten_record;

use crate::bridge::RemoteBridge;
use crate::config::ClientConfig;
use crate::error::CoreResult;
use crate::metadata::EntityMetadata;
use crate::schema::SchemaCache;
use std::sync::Arc;

/// Converts values using metadata from a schema cache.
///
/// Converting a reference by name and fetching metadata both call the
/// bridge.
#[derive(Clone, Copy)]
pub struct Converter<'a> {
    bridge: &'a dyn RemoteBridge,
    cache: &'a SchemaCache,
    config: &'a ClientConfig,
}

impl<'a> Converter<'a> {
    /// Creates a converter.
    pub fn new(
        bridge: &'a dyn RemoteBridge,
        cache: &'a SchemaCache,
        config: &'a ClientConfig,
    ) -> Self {
        Self {
            bridge,
            cache,
            config,
        }
    }

    /// Returns the metadata of `entity`, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns the bridge's error if the entity cannot be described.
    pub fn metadata(&self, entity: &str) -> CoreResult<Arc<EntityMetadata>> {
        self.cache.get_or_fetch(entity, self.bridge)
    }
}

impl std::fmt::Debug for Converter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("cached_entities", &self.cache.len())
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}
