//! Per-client entity metadata cache.

use crate::bridge::RemoteBridge;
use crate::error::{CoreError, CoreResult};
use crate::metadata::EntityMetadata;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Entity metadata keyed by lower-cased logical name.
///
/// Entries are fetched on first use and never refreshed or evicted. The
/// lock is not held while fetching, so two threads asking for the same
/// uncached entity may both fetch it; the later insert wins and the
/// contents are equivalent. Failed fetches are not cached.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<String, Arc<EntityMetadata>>>,
}

impl SchemaCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-seeded with metadata.
    pub fn seeded(entries: impl IntoIterator<Item = EntityMetadata>) -> Self {
        let cache = Self::new();
        for metadata in entries {
            cache.seed(metadata);
        }
        cache
    }

    /// Returns the metadata for `entity`, fetching it through `bridge` on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EntityNotFound`] when the bridge knows no such
    /// entity or answers with an empty payload. Other bridge errors are
    /// returned unchanged, and invalid JSON is a codec error.
    pub fn get_or_fetch(
        &self,
        entity: &str,
        bridge: &dyn RemoteBridge,
    ) -> CoreResult<Arc<EntityMetadata>> {
        let key = entity.to_lowercase();
        if let Some(metadata) = self.get(&key) {
            return Ok(metadata);
        }

        debug!(entity = %key, "fetching entity metadata");
        let json = bridge.entity_metadata(&key)?;
        let trimmed = json.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Err(CoreError::entity_not_found(key));
        }
        let metadata = Arc::new(EntityMetadata::from_json(&json)?);
        self.entries.write().insert(key, Arc::clone(&metadata));
        Ok(metadata)
    }

    /// Returns cached metadata without fetching.
    pub fn get(&self, entity: &str) -> Option<Arc<EntityMetadata>> {
        self.entries.read().get(&entity.to_lowercase()).cloned()
    }

    /// Inserts metadata, keyed by its logical name.
    pub fn seed(&self, metadata: EntityMetadata) {
        let key = metadata.logical_name.to_lowercase();
        self.entries.write().insert(key, Arc::new(metadata));
    }

    /// Returns true if `entity` is cached.
    pub fn contains(&self, entity: &str) -> bool {
        self.entries.read().contains_key(&entity.to_lowercase())
    }

    /// Number of cached entities.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
