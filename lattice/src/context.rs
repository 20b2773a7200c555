//! Request-scoped context shared by all resolvers of one request.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json_bytes::Value;
use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;

use crate::spec::Schema;
use crate::store::DataAccess;

/// Context handed to every resolver invocation of a request.
///
/// Carries the store handle and schema, the engine's per-identifier
/// mutation locks, and an extension map hosts can use to share data
/// between their own resolvers. Resolvers must not share any other
/// mutable state: each field resolution is a function of
/// (parent, arguments, context).
#[derive(Clone)]
pub struct RequestContext {
    store: Arc<dyn DataAccess>,
    schema: Arc<Schema>,
    locks: Arc<MutationLocks>,
    extensions: Arc<Extensions>,
}

impl RequestContext {
    pub(crate) fn new(
        store: Arc<dyn DataAccess>,
        schema: Arc<Schema>,
        locks: Arc<MutationLocks>,
    ) -> Self {
        Self {
            store,
            schema,
            locks,
            extensions: Default::default(),
        }
    }

    pub fn store(&self) -> &dyn DataAccess {
        self.store.as_ref()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Serializes mutations per affected identifier.
    ///
    /// Update and delete resolvers hold the returned guard across their
    /// whole read-modify-write so two concurrent mutations of the same
    /// record cannot interleave, whatever the store implementation does.
    pub async fn lock_record(&self, entity: &str, id: &str) -> OwnedMutexGuard<()> {
        self.locks.lock(entity, id).await
    }
}

/// A concurrent map of request-scoped host data.
#[derive(Debug, Default)]
pub struct Extensions {
    map: DashMap<String, Value>,
}

impl Extensions {
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.map.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.map.get(key).map(|entry| entry.value().clone())
    }
}

/// Engine-wide registry of per-identifier mutation locks.
#[derive(Debug, Default)]
pub(crate) struct MutationLocks {
    map: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl MutationLocks {
    pub(crate) async fn lock(&self, entity: &str, id: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .map
            .entry((entity.to_string(), id.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }
}
