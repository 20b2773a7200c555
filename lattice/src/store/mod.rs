//! The data access layer consumed by the engine.
//!
//! The engine never owns record storage: it consumes the [`DataAccess`]
//! contract and only ever holds transient record values returned from
//! lookups. [`MemStore`] is the reference in-memory implementation.

mod memory;

use async_trait::async_trait;
use displaydoc::Display;
pub use memory::MemStore;
use serde_json_bytes::Value;
use thiserror::Error;

use crate::json_ext::Object;

/// Errors surfaced by a [`DataAccess`] implementation.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// unknown entity kind '{0}'
    UnknownEntity(String),
    /// no '{0}' record with id '{1}'
    NotFound(String, String),
}

/// Lookup, filter and write operations per entity kind.
///
/// Records are opaque JSON objects identified by a unique `id` property.
/// Identity generation (and collision avoidance) is the store's concern.
/// Write operations must be atomic: a cancelled request may abandon a
/// result but must never observe a half-applied write.
#[async_trait]
pub trait DataAccess: Send + Sync {
    /// The record with the given id, if any.
    async fn lookup_by_id(&self, entity: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// All records whose `fk_field` property equals `value`, in store order.
    async fn filter_by_foreign_key(
        &self,
        entity: &str,
        fk_field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// Every record of the entity kind, in store order.
    async fn scan(&self, entity: &str) -> Result<Vec<Value>, StoreError>;

    /// Appends a new record, assigning it a fresh identity.
    async fn insert(&self, entity: &str, record: Object) -> Result<Value, StoreError>;

    /// Removes the record with the given id. Returns whether anything was
    /// removed; removing an absent id is a no-op, not an error.
    async fn remove(&self, entity: &str, id: &str) -> Result<bool, StoreError>;

    /// Merges the provided fields into the record with the given id.
    /// Omitted fields retain their prior values.
    async fn update(&self, entity: &str, id: &str, edits: Object) -> Result<Value, StoreError>;
}
