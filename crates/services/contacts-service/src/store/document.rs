//! Documents as presented across the adapter boundary.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use domain::ID_FIELD;

/// Raw identifier field used by the underlying store
pub const RAW_ID_FIELD: &str = "_id";

/// Revision counter field used by the underlying store
pub const REVISION_FIELD: &str = "__v";

const RESERVED_FIELDS: [&str; 3] = [ID_FIELD, RAW_ID_FIELD, REVISION_FIELD];

/// Check whether a field name is owned by the store rather than the schema
pub fn is_reserved_field(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
}

/// Remove identifier and revision fields from caller-supplied data.
pub(crate) fn strip_reserved(body: &mut Map<String, Value>) {
    for field in RESERVED_FIELDS {
        body.remove(field);
    }
}

/// A document exactly as a backend stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: String,
    pub revision: i64,
    pub body: Map<String, Value>,
}

/// A stored document with its derived public `id`.
///
/// Serializes flat: `{ "id": "...", ...fields }`. Never carries the raw
/// store identifier or the revision counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Output transform applied to everything a backend returns.
    pub fn from_raw(raw: RawDocument) -> Self {
        let mut fields = raw.body;
        strip_reserved(&mut fields);
        Self { id: raw.id, fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Flat JSON object including `id`.
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        object.extend(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Value::Object(object)
    }

    /// Serialize a typed entity carrying an `id` field.
    pub fn from_entity<T: Serialize>(entity: &T) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(entity)?)
    }

    /// Deserialize into a typed entity.
    pub fn into_entity<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        let mut object = self.fields;
        object.insert(ID_FIELD.to_string(), Value::String(self.id));
        serde_json::from_value(Value::Object(object))
    }
}
