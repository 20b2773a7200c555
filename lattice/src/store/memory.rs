use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json_bytes::Value;
use uuid::Uuid;

use super::DataAccess;
use super::StoreError;
use crate::json_ext::Object;

/// An in-memory record store keeping insertion order per entity kind.
///
/// Every write happens under a single write lock, so each operation is
/// atomic: concurrent readers see either none or all of an edit.
#[derive(Debug, Default)]
pub struct MemStore {
    collections: RwLock<IndexMap<String, Vec<Object>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty collection for an entity kind.
    pub fn register(&self, entity: impl Into<String>) {
        self.collections.write().entry(entity.into()).or_default();
    }

    /// Registers an entity kind and appends the given records as-is.
    ///
    /// Seeded records are expected to carry their own `id` properties.
    pub fn seed(&self, entity: impl Into<String>, records: impl IntoIterator<Item = Object>) {
        self.collections
            .write()
            .entry(entity.into())
            .or_default()
            .extend(records);
    }

    fn record_id(record: &Object) -> Option<&str> {
        record.get("id").and_then(|id| id.as_str())
    }
}

#[async_trait]
impl DataAccess for MemStore {
    async fn lookup_by_id(&self, entity: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read();
        let records = collections
            .get(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))?;
        Ok(records
            .iter()
            .find(|record| Self::record_id(record) == Some(id))
            .cloned()
            .map(Value::Object))
    }

    async fn filter_by_foreign_key(
        &self,
        entity: &str,
        fk_field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read();
        let records = collections
            .get(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))?;
        Ok(records
            .iter()
            .filter(|record| record.get(fk_field) == Some(value))
            .cloned()
            .map(Value::Object)
            .collect())
    }

    async fn scan(&self, entity: &str) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read();
        let records = collections
            .get(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))?;
        Ok(records.iter().cloned().map(Value::Object).collect())
    }

    async fn insert(&self, entity: &str, mut record: Object) -> Result<Value, StoreError> {
        let mut collections = self.collections.write();
        let records = collections
            .get_mut(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))?;

        let mut id = Uuid::new_v4().to_string();
        while records
            .iter()
            .any(|existing| Self::record_id(existing) == Some(id.as_str()))
        {
            id = Uuid::new_v4().to_string();
        }
        record.insert("id", Value::String(id.into()));
        tracing::trace!(entity, "inserted record");

        records.push(record.clone());
        Ok(Value::Object(record))
    }

    async fn remove(&self, entity: &str, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write();
        let records = collections
            .get_mut(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))?;
        let before = records.len();
        records.retain(|record| Self::record_id(record) != Some(id));
        Ok(records.len() != before)
    }

    async fn update(&self, entity: &str, id: &str, edits: Object) -> Result<Value, StoreError> {
        let mut collections = self.collections.write();
        let records = collections
            .get_mut(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))?;
        let record = records
            .iter_mut()
            .find(|record| Self::record_id(record) == Some(id))
            .ok_or_else(|| StoreError::NotFound(entity.to_string(), id.to_string()))?;

        for (key, value) in edits {
            record.insert(key, value);
        }
        Ok(Value::Object(record.clone()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json_bytes::json;

    use super::*;

    fn object(value: Value) -> Object {
        match value {
            Value::Object(object) => object,
            _ => panic!("expected an object"),
        }
    }

    fn store() -> MemStore {
        let store = MemStore::new();
        store.seed(
            "games",
            [
                object(json!({ "id": "g1", "title": "Zelda", "platform": ["Switch"] })),
                object(json!({ "id": "g2", "title": "Metroid", "platform": ["Switch", "Wii"] })),
            ],
        );
        store.seed(
            "reviews",
            [
                object(json!({ "id": "r1", "rating": 9, "game_id": "g1" })),
                object(json!({ "id": "r2", "rating": 7, "game_id": "g2" })),
                object(json!({ "id": "r3", "rating": 8, "game_id": "g1" })),
            ],
        );
        store
    }

    #[tokio::test]
    async fn lookup_by_id_finds_records_and_tolerates_misses() {
        let store = store();
        let game = store.lookup_by_id("games", "g1").await.unwrap().unwrap();
        assert_eq!(game.get("title"), Some(&json!("Zelda")));
        assert_eq!(store.lookup_by_id("games", "g9").await.unwrap(), None);
        assert_eq!(
            store.lookup_by_id("tapes", "t1").await.unwrap_err(),
            StoreError::UnknownEntity("tapes".to_string()),
        );
    }

    #[tokio::test]
    async fn filter_by_foreign_key_keeps_store_order() {
        let store = store();
        let reviews = store
            .filter_by_foreign_key("reviews", "game_id", &json!("g1"))
            .await
            .unwrap();
        assert_eq!(
            reviews
                .iter()
                .map(|r| r.get("id").unwrap().clone())
                .collect::<Vec<_>>(),
            [json!("r1"), json!("r3")],
        );

        let none = store
            .filter_by_foreign_key("reviews", "game_id", &json!("g9"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn insert_assigns_distinct_identities() {
        let store = store();
        let payload = object(json!({ "title": "Pikmin", "platform": ["Switch"] }));
        let first = store.insert("games", payload.clone()).await.unwrap();
        let second = store.insert("games", payload).await.unwrap();

        let first_id = first.get("id").unwrap().as_str().unwrap().to_string();
        let second_id = second.get("id").unwrap().as_str().unwrap().to_string();
        assert_ne!(first_id, second_id);
        assert_eq!(store.scan("games").await.unwrap().len(), 4);
        assert!(store.lookup_by_id("games", &first_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = store();
        assert!(store.remove("games", "g1").await.unwrap());
        assert!(!store.remove("games", "g1").await.unwrap());
        assert_eq!(store.scan("games").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_merges_only_the_provided_fields() {
        let store = store();
        let updated = store
            .update("games", "g1", object(json!({ "title": "Zelda: TotK" })))
            .await
            .unwrap();
        assert_eq!(
            updated,
            json!({ "id": "g1", "title": "Zelda: TotK", "platform": ["Switch"] }),
        );

        // Identical edits yield an identical record.
        let again = store
            .update("games", "g1", object(json!({ "title": "Zelda: TotK" })))
            .await
            .unwrap();
        assert_eq!(again, updated);

        assert_eq!(
            store
                .update("games", "g9", object(json!({ "title": "?" })))
                .await
                .unwrap_err(),
            StoreError::NotFound("games".to_string(), "g9".to_string()),
        );
    }
}
