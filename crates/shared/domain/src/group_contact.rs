//! Group membership join entity.

use serde::{Deserialize, Serialize};

/// Records that a contact is currently a member of a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupContact {
    pub id: String,
    pub id_group: String,
    pub id_contact: String,
}

/// Membership pair used when inserting a join row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroupContact {
    pub id_group: String,
    pub id_contact: String,
}

impl NewGroupContact {
    pub fn new(id_group: impl Into<String>, id_contact: impl Into<String>) -> Self {
        Self {
            id_group: id_group.into(),
            id_contact: id_contact.into(),
        }
    }
}
