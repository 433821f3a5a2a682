//! Storage backend contract.
//!
//! Backends store schema-less JSON bodies in named collections and know
//! nothing about models, validation or the output transform.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::document::RawDocument;
use super::query::Condition;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Low-level backend failures. Never crosses the adapter boundary.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stored document {0} is not a JSON object")]
    Corrupt(String),

    #[error("Backend is closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Document backend trait for dependency injection.
///
/// Unknown ids are reported as `None`, never as errors.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Insert a body and return it with its assigned id
    async fn insert(&self, collection: &str, body: Map<String, Value>) -> BackendResult<RawDocument>;

    /// All documents of a collection matching a condition, in insertion order
    async fn find(&self, collection: &str, condition: &Condition) -> BackendResult<Vec<RawDocument>>;

    async fn find_by_id(&self, collection: &str, id: &str) -> BackendResult<Option<RawDocument>>;

    /// Merge a patch into a document and bump its revision
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> BackendResult<Option<RawDocument>>;

    /// Delete a document, returning what was removed
    async fn delete(&self, collection: &str, id: &str) -> BackendResult<Option<RawDocument>>;

    /// Check connectivity
    async fn ping(&self) -> BackendResult<()>;

    /// Release underlying resources
    async fn close(&self) -> BackendResult<()>;
}

/// Fresh document identifier.
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Shallow-merge a patch into a body; `null` values clear fields.
pub(crate) fn merge_patch(body: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (field, value) in patch {
        if value.is_null() {
            body.remove(&field);
        } else {
            body.insert(field, value);
        }
    }
}
