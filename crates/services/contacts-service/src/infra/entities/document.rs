//! Document row entity for SeaORM.
//!
//! Every collection shares one table; `collection` partitions the rows and
//! `body` holds the schema-less JSON object.

use sea_orm::entity::prelude::*;

use crate::store::{BackendError, RawDocument};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub collection: String,
    pub body: Json,
    /// Incremented on every update, never exposed
    pub revision: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert a database row into the backend representation
impl TryFrom<Model> for RawDocument {
    type Error = BackendError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        match model.body {
            Json::Object(body) => Ok(RawDocument {
                id: model.id,
                revision: i64::from(model.revision),
                body,
            }),
            _ => Err(BackendError::Corrupt(model.id)),
        }
    }
}
