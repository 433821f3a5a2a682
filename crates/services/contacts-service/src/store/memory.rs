//! In-process document backend.
//!
//! Selected with a `memory://` connection string. Contents live as long as
//! the process and are dropped on close.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::backend::{merge_patch, new_document_id, BackendError, BackendResult, DocumentBackend};
use super::document::RawDocument;
use super::query::Condition;

/// Collections keyed by name, each holding documents in insertion order.
#[derive(Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, Vec<RawDocument>>>,
    closed: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> BackendResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(BackendError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn insert(&self, collection: &str, body: Map<String, Value>) -> BackendResult<RawDocument> {
        self.ensure_open()?;
        let document = RawDocument {
            id: new_document_id(),
            revision: 0,
            body,
        };

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());

        Ok(document)
    }

    async fn find(&self, collection: &str, condition: &Condition) -> BackendResult<Vec<RawDocument>> {
        self.ensure_open()?;
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| condition.matches(&doc.id, &doc.body))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> BackendResult<Option<RawDocument>> {
        self.ensure_open()?;
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> BackendResult<Option<RawDocument>> {
        self.ensure_open()?;
        let mut collections = self.collections.write().await;

        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
        else {
            return Ok(None);
        };

        merge_patch(&mut doc.body, patch);
        doc.revision += 1;
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, collection: &str, id: &str) -> BackendResult<Option<RawDocument>> {
        self.ensure_open()?;
        let mut collections = self.collections.write().await;

        Ok(collections.get_mut(collection).and_then(|docs| {
            docs.iter()
                .position(|doc| doc.id == id)
                .map(|index| docs.remove(index))
        }))
    }

    async fn ping(&self) -> BackendResult<()> {
        self.ensure_open()
    }

    async fn close(&self) -> BackendResult<()> {
        self.closed.store(true, Ordering::Release);
        self.collections.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_find_update_delete() {
        let backend = MemoryBackend::new();

        let inserted = backend
            .insert("groups", body(json!({ "name": "Friends" })))
            .await
            .unwrap();
        assert_eq!(inserted.revision, 0);

        let found = backend.find_by_id("groups", &inserted.id).await.unwrap();
        assert_eq!(found, Some(inserted.clone()));

        let updated = backend
            .update("groups", &inserted.id, body(json!({ "name": "Family" })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.revision, 1);
        assert_eq!(updated.body["name"], "Family");

        let deleted = backend.delete("groups", &inserted.id).await.unwrap();
        assert_eq!(deleted.map(|d| d.id), Some(inserted.id.clone()));
        assert!(backend.find_by_id("groups", &inserted.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let backend = MemoryBackend::new();
        let doc = backend.insert("groups", body(json!({}))).await.unwrap();

        assert!(backend.find_by_id("contacts", &doc.id).await.unwrap().is_none());
        assert!(backend.find("contacts", &Condition::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_absent() {
        let backend = MemoryBackend::new();

        assert!(backend.update("groups", "nope", Map::new()).await.unwrap().is_none());
        assert!(backend.delete("groups", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_closed_backend_rejects_operations() {
        let backend = MemoryBackend::new();
        backend.close().await.unwrap();

        assert!(matches!(backend.ping().await, Err(BackendError::Closed)));
        assert!(matches!(
            backend.insert("groups", Map::new()).await,
            Err(BackendError::Closed)
        ));
    }
}
