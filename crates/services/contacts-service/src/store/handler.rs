//! Generic document access over registered models.
//!
//! Every data operation returns `StoreResult`: failures are logged and handed
//! back as values, never propagated as panics. Successful results pass
//! through the output transform, so callers only ever see `id` and never the
//! raw store identifier or revision counter.

use std::collections::HashMap;
use std::sync::RwLock;

use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error};

use super::backend::DocumentBackend;
use super::connection::Connection;
use super::document::{strip_reserved, Document};
use super::error::{StoreError, StoreResult};
use super::query::{Condition, Projection};
use super::schema::{DocumentShape, Model, SchemaDescriptor};

/// Document store adapter.
pub struct DocumentHandler {
    connection: Connection,
    models: RwLock<HashMap<String, Model>>,
}

impl DocumentHandler {
    /// Create an adapter over an injected connection
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            models: RwLock::new(HashMap::new()),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    // =========================================================================
    // Model registration
    // =========================================================================

    /// Register a collection from a static shape.
    pub fn create_model<S: DocumentShape>(&self) -> StoreResult<Model> {
        self.register(S::NAME, S::schema())
    }

    /// Register a collection from a runtime field map.
    pub fn define_model(&self, name: &str, schema: SchemaDescriptor) -> StoreResult<Model> {
        self.register(name, schema)
    }

    /// Look up a previously registered model
    pub fn model(&self, name: &str) -> Option<Model> {
        self.models
            .read()
            .ok()
            .and_then(|models| models.get(name).cloned())
    }

    fn register(&self, name: &str, schema: SchemaDescriptor) -> StoreResult<Model> {
        let result = self.try_register(name, schema);
        if let Err(e) = &result {
            error!("{}", e);
        }
        result
    }

    fn try_register(&self, name: &str, schema: SchemaDescriptor) -> StoreResult<Model> {
        if name.trim().is_empty() {
            return Err(StoreError::model_creation(name, "model name cannot be empty"));
        }
        schema
            .check_definition()
            .map_err(|reason| StoreError::model_creation(name, reason))?;

        let mut models = self
            .models
            .write()
            .map_err(|_| StoreError::model_creation(name, "model registry is poisoned"))?;

        if let Some(existing) = models.get(name) {
            return if existing.schema() == &schema {
                Ok(existing.clone())
            } else {
                Err(StoreError::model_creation(
                    name,
                    "a model with this name is already registered with a different schema",
                ))
            };
        }

        let model = Model::new(name.to_string(), schema);
        models.insert(name.to_string(), model.clone());
        debug!(model = name, "Registered model");
        Ok(model)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert one document.
    pub async fn add_document<T>(&self, model: &Model, data: &T) -> StoreResult<Document>
    where
        T: Serialize + ?Sized + Sync,
    {
        let result = self.try_add(model, data).await;
        log_outcome("add_document", model, &result);
        result
    }

    async fn try_add<T>(&self, model: &Model, data: &T) -> StoreResult<Document>
    where
        T: Serialize + ?Sized + Sync,
    {
        const ACTION: &str = "adding document to";
        let backend = self.connection.backend()?;

        let mut body = to_object(model, data)?;
        strip_reserved(&mut body);
        model.schema().retain_known(&mut body);
        model.schema().apply_defaults(&mut body);
        model
            .schema()
            .validate_document(&body)
            .map_err(|message| StoreError::validation(model.name(), message))?;
        check_unique(backend, model, &body, None).await?;

        let raw = backend
            .insert(model.name(), body)
            .await
            .map_err(|e| StoreError::operation(ACTION, model.name(), e))?;
        Ok(Document::from_raw(raw))
    }

    /// Delete by id, returning the removed document.
    pub async fn remove_document(&self, model: &Model, id: &str) -> StoreResult<Option<Document>> {
        let result = async {
            self.connection
                .backend()?
                .delete(model.name(), id)
                .await
                .map(|raw| raw.map(Document::from_raw))
                .map_err(|e| StoreError::operation("removing document from", model.name(), e))
        }
        .await;
        log_outcome("remove_document", model, &result);
        result
    }

    /// Apply a partial update, returning the post-update document.
    pub async fn edit_document<T>(
        &self,
        model: &Model,
        id: &str,
        patch: &T,
    ) -> StoreResult<Option<Document>>
    where
        T: Serialize + ?Sized + Sync,
    {
        let result = self.try_edit(model, id, patch).await;
        log_outcome("edit_document", model, &result);
        result
    }

    async fn try_edit<T>(&self, model: &Model, id: &str, patch: &T) -> StoreResult<Option<Document>>
    where
        T: Serialize + ?Sized + Sync,
    {
        const ACTION: &str = "editing document in";
        let backend = self.connection.backend()?;

        let mut patch = to_object(model, patch)?;
        strip_reserved(&mut patch);
        model.schema().retain_known(&mut patch);
        model
            .schema()
            .validate_patch(&patch)
            .map_err(|message| StoreError::validation(model.name(), message))?;
        check_unique(backend, model, &patch, Some(id)).await?;

        let raw = backend
            .update(model.name(), id, patch)
            .await
            .map_err(|e| StoreError::operation(ACTION, model.name(), e))?;
        Ok(raw.map(Document::from_raw))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// First document matching a condition; `Ok(None)` when nothing matches.
    pub async fn search_one(
        &self,
        model: &Model,
        condition: &Condition,
        projection: Option<&Projection>,
    ) -> StoreResult<Option<Document>> {
        let result = self
            .find(model, condition, projection, "searching for one document in")
            .await
            .map(|docs| docs.into_iter().next());
        log_outcome("search_one", model, &result);
        result
    }

    /// Document by id; unknown or malformed ids yield `Ok(None)`.
    pub async fn search_by_id(
        &self,
        model: &Model,
        id: &str,
        projection: Option<&Projection>,
    ) -> StoreResult<Option<Document>> {
        let result = async {
            self.connection
                .backend()?
                .find_by_id(model.name(), id)
                .await
                .map(|raw| raw.map(|raw| project(Document::from_raw(raw), projection)))
                .map_err(|e| StoreError::operation("searching for document in", model.name(), e))
        }
        .await;
        log_outcome("search_by_id", model, &result);
        result
    }

    /// Every document of the collection.
    pub async fn search_all(
        &self,
        model: &Model,
        projection: Option<&Projection>,
    ) -> StoreResult<Vec<Document>> {
        let result = self
            .find(model, &Condition::new(), projection, "searching for all documents in")
            .await;
        log_outcome("search_all", model, &result);
        result
    }

    /// Every document matching a condition.
    pub async fn search_many(
        &self,
        model: &Model,
        condition: &Condition,
        projection: Option<&Projection>,
    ) -> StoreResult<Vec<Document>> {
        let result = self
            .find(model, condition, projection, "searching for documents in")
            .await;
        log_outcome("search_many", model, &result);
        result
    }

    /// Documents whose `relation_field` equals `id` (all documents when `id`
    /// is `None`), with that field dereferenced into the referenced
    /// document(s) when the schema declares it as a reference.
    pub async fn search_relations(
        &self,
        model: &Model,
        id: Option<&str>,
        relation_field: &str,
    ) -> StoreResult<Vec<Document>> {
        let result = self.try_search_relations(model, id, relation_field).await;
        log_outcome("search_relations", model, &result);
        result
    }

    async fn try_search_relations(
        &self,
        model: &Model,
        id: Option<&str>,
        relation_field: &str,
    ) -> StoreResult<Vec<Document>> {
        const ACTION: &str = "searching for all documents and their relations in";
        let backend = self.connection.backend()?;

        let condition = match id {
            Some(id) => Condition::new().eq(relation_field, id),
            None => Condition::new(),
        };
        let documents: Vec<Document> = backend
            .find(model.name(), &condition)
            .await
            .map_err(|e| StoreError::operation(ACTION, model.name(), e))?
            .into_iter()
            .map(Document::from_raw)
            .collect();

        let Some(target) = model.schema().relation_target(relation_field) else {
            return Ok(documents);
        };

        try_join_all(
            documents
                .into_iter()
                .map(|doc| populate(backend, model, target, relation_field, doc)),
        )
        .await
    }

    async fn find(
        &self,
        model: &Model,
        condition: &Condition,
        projection: Option<&Projection>,
        action: &'static str,
    ) -> StoreResult<Vec<Document>> {
        let raws = self
            .connection
            .backend()?
            .find(model.name(), condition)
            .await
            .map_err(|e| StoreError::operation(action, model.name(), e))?;

        Ok(raws
            .into_iter()
            .map(|raw| project(Document::from_raw(raw), projection))
            .collect())
    }
}

/// Replace a reference field with the referenced document(s).
async fn populate(
    backend: &dyn DocumentBackend,
    model: &Model,
    target: &str,
    field: &str,
    mut document: Document,
) -> StoreResult<Document> {
    const ACTION: &str = "resolving relations of";

    let resolved = match document.fields.get(field) {
        Some(Value::String(id)) => backend
            .find_by_id(target, id)
            .await
            .map_err(|e| StoreError::operation(ACTION, model.name(), e))?
            .map_or(Value::Null, |raw| Document::from_raw(raw).to_value()),
        Some(Value::Array(ids)) => {
            let mut embedded = Vec::with_capacity(ids.len());
            for id in ids.iter().filter_map(Value::as_str) {
                if let Some(raw) = backend
                    .find_by_id(target, id)
                    .await
                    .map_err(|e| StoreError::operation(ACTION, model.name(), e))?
                {
                    embedded.push(Document::from_raw(raw).to_value());
                }
            }
            Value::Array(embedded)
        }
        _ => return Ok(document),
    };

    document.fields.insert(field.to_string(), resolved);
    Ok(document)
}

/// Reject values already held by another document in unique fields.
async fn check_unique(
    backend: &dyn DocumentBackend,
    model: &Model,
    body: &Map<String, Value>,
    exclude_id: Option<&str>,
) -> StoreResult<()> {
    for field in model.schema().unique_fields() {
        let Some(value) = body.get(field).filter(|v| !v.is_null()) else {
            continue;
        };

        let condition = Condition::new().eq(field.clone(), value.clone());
        let clashes = backend
            .find(model.name(), &condition)
            .await
            .map_err(|e| StoreError::operation("checking unique fields of", model.name(), e))?;

        if clashes.iter().any(|doc| Some(doc.id.as_str()) != exclude_id) {
            return Err(StoreError::validation(
                model.name(),
                format!("Path `{}` must be unique; {} is already taken.", field, value),
            ));
        }
    }
    Ok(())
}

fn to_object<T: Serialize + ?Sized>(model: &Model, data: &T) -> StoreResult<Map<String, Value>> {
    match serde_json::to_value(data) {
        Ok(Value::Object(body)) => Ok(body),
        Ok(_) => Err(StoreError::validation(model.name(), "document must be an object")),
        Err(e) => Err(StoreError::validation(model.name(), e.to_string())),
    }
}

fn project(document: Document, projection: Option<&Projection>) -> Document {
    match projection {
        Some(projection) => projection.apply(document),
        None => document,
    }
}

fn log_outcome<T>(operation: &'static str, model: &Model, result: &StoreResult<T>) {
    match result {
        Ok(_) => debug!(operation, model = model.name(), "Store operation succeeded"),
        Err(e) => error!(operation, model = model.name(), error = %e, "Store operation failed"),
    }
}
