//! Group domain entity and related types.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_CONTACTS;

/// A named set of contacts owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    pub id_user: String,
    #[serde(default = "default_max_contacts")]
    pub max_contacts: u32,
}

fn default_max_contacts() -> u32 {
    DEFAULT_MAX_CONTACTS
}

impl Group {
    /// Check whether a group holding `members` contacts can take one more
    pub fn has_room_for(&self, members: usize) -> bool {
        members < self.max_contacts as usize
    }
}

/// Group creation data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub name: String,
    pub description: String,
    pub id_user: String,
    /// Capacity (defaults to 50 when omitted)
    #[serde(default = "default_max_contacts")]
    pub max_contacts: u32,
}

impl NewGroup {
    /// Create group data with the default capacity
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        id_user: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            id_user: id_user.into(),
            max_contacts: DEFAULT_MAX_CONTACTS,
        }
    }

    /// Override the capacity
    pub fn with_max_contacts(mut self, max_contacts: u32) -> Self {
        self.max_contacts = max_contacts;
        self
    }
}

/// Partial group update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_contacts: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_uses_camel_case_fields() {
        let group: Group = serde_json::from_value(serde_json::json!({
            "id": "g1",
            "name": "Friends",
            "description": "d",
            "idUser": "u1",
            "maxContacts": 3
        }))
        .unwrap();

        assert_eq!(group.id_user, "u1");
        assert_eq!(group.max_contacts, 3);
    }

    #[test]
    fn test_missing_capacity_defaults_to_fifty() {
        let group: NewGroup = serde_json::from_value(serde_json::json!({
            "name": "Friends",
            "description": "d",
            "idUser": "u1"
        }))
        .unwrap();

        assert_eq!(group.max_contacts, DEFAULT_MAX_CONTACTS);
    }

    #[test]
    fn test_has_room_for() {
        let group = Group {
            id: "g1".to_string(),
            name: "Friends".to_string(),
            description: "d".to_string(),
            id_user: "u1".to_string(),
            max_contacts: 2,
        };

        assert!(group.has_room_for(1));
        assert!(!group.has_room_for(2));
    }

    #[test]
    fn test_update_skips_absent_fields() {
        let patch = UpdateGroup {
            name: Some("Family".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Family" }));
    }
}
