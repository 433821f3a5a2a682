//! SeaORM-backed document backend.
//!
//! Bodies are stored as JSON in the shared `documents` table. String
//! equality constraints are pushed into SQL as a prefilter on Postgres and
//! SQLite; the full condition is then evaluated on the decoded bodies so
//! the same semantics hold on every dialect.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde_json::{Map, Value};

use domain::ID_FIELD;

use crate::infra::entities::document::{self, ActiveModel, Entity as DocumentEntity};

use super::backend::{merge_patch, new_document_id, BackendError, BackendResult, DocumentBackend};
use super::document::{RawDocument, RAW_ID_FIELD};
use super::query::Condition;

/// Concrete implementation of DocumentBackend over a SQL database
pub struct SqlBackend {
    db: DatabaseConnection,
    dialect: DbBackend,
}

impl SqlBackend {
    /// Create new backend instance
    pub fn new(db: DatabaseConnection) -> Self {
        let dialect = db.get_database_backend();
        Self { db, dialect }
    }

    /// SQL prefilter for one string constraint. Matches a superset of what
    /// `Condition::matches` accepts: a field equal to the value or an array
    /// field containing it.
    fn field_filter(&self, field: &str, value: &str) -> Option<SimpleExpr> {
        if field == ID_FIELD || field == RAW_ID_FIELD {
            return Some(document::Column::Id.eq(value));
        }

        match self.dialect {
            DbBackend::Postgres => Some(Expr::cust_with_values(
                "(body::jsonb -> ?::text) @> to_jsonb(?::text)",
                [field.to_string(), value.to_string()],
            )),
            DbBackend::Sqlite => Some(Expr::cust_with_values(
                "EXISTS (SELECT 1 FROM json_each(documents.body, ?) WHERE json_each.value = ?)",
                [format!("$.\"{}\"", field), value.to_string()],
            )),
            _ => None,
        }
    }

    async fn find_row(&self, collection: &str, id: &str) -> BackendResult<Option<document::Model>> {
        DocumentEntity::find_by_id(id.to_string())
            .filter(document::Column::Collection.eq(collection))
            .one(&self.db)
            .await
            .map_err(BackendError::from)
    }
}

#[async_trait]
impl DocumentBackend for SqlBackend {
    async fn insert(&self, collection: &str, body: Map<String, Value>) -> BackendResult<RawDocument> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(new_document_id()),
            collection: Set(collection.to_string()),
            body: Set(Value::Object(body)),
            revision: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        RawDocument::try_from(model)
    }

    async fn find(&self, collection: &str, condition: &Condition) -> BackendResult<Vec<RawDocument>> {
        let mut query = DocumentEntity::find().filter(document::Column::Collection.eq(collection));
        for (field, value) in condition.fields() {
            if let Some(expr) = value.as_str().and_then(|v| self.field_filter(field, v)) {
                query = query.filter(expr);
            }
        }

        let models = query
            .order_by_asc(document::Column::CreatedAt)
            .order_by_asc(document::Column::Id)
            .all(&self.db)
            .await?;

        let mut documents = Vec::with_capacity(models.len());
        for model in models {
            let raw = RawDocument::try_from(model)?;
            if condition.matches(&raw.id, &raw.body) {
                documents.push(raw);
            }
        }
        Ok(documents)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> BackendResult<Option<RawDocument>> {
        self.find_row(collection, id)
            .await?
            .map(RawDocument::try_from)
            .transpose()
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> BackendResult<Option<RawDocument>> {
        let Some(model) = self.find_row(collection, id).await? else {
            return Ok(None);
        };

        let revision = model.revision;
        let mut current = RawDocument::try_from(model.clone())?;
        merge_patch(&mut current.body, patch);

        let mut active: ActiveModel = model.into();
        active.body = Set(Value::Object(current.body));
        active.revision = Set(revision + 1);
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        RawDocument::try_from(model).map(Some)
    }

    async fn delete(&self, collection: &str, id: &str) -> BackendResult<Option<RawDocument>> {
        let Some(model) = self.find_row(collection, id).await? else {
            return Ok(None);
        };

        let result = DocumentEntity::delete_by_id(model.id.clone())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            // Removed concurrently between the read and the delete
            return Ok(None);
        }

        RawDocument::try_from(model).map(Some)
    }

    async fn ping(&self) -> BackendResult<()> {
        self.db.ping().await.map_err(BackendError::from)
    }

    async fn close(&self) -> BackendResult<()> {
        self.db.clone().close().await.map_err(BackendError::from)
    }
}
