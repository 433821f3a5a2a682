//! Document store adapter.
//!
//! Models are registered against a [`DocumentHandler`], which performs
//! validated CRUD and relation lookups over a pluggable [`DocumentBackend`].

mod backend;
mod connection;
mod document;
mod error;
mod handler;
mod memory;
mod query;
mod schema;
mod sql;

pub use backend::{BackendError, BackendResult, DocumentBackend};
pub use connection::Connection;
pub use document::{is_reserved_field, Document, RawDocument, RAW_ID_FIELD, REVISION_FIELD};
pub use error::{StoreError, StoreResult};
pub use handler::DocumentHandler;
pub use memory::MemoryBackend;
pub use query::{Condition, Projection};
pub use schema::{DocumentShape, FieldKind, FieldSpec, FieldValidator, Model, SchemaDescriptor};
pub use sql::SqlBackend;

#[cfg(any(test, feature = "test-utils"))]
pub use backend::MockDocumentBackend;
