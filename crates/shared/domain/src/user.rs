//! User domain entity and related types.

use serde::{Deserialize, Serialize};

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    /// Contact references owned by this user
    #[serde(default)]
    pub contacts: Vec<String>,
}

impl User {
    /// Check whether the user holds a reference to a contact
    pub fn owns_contact(&self, id_contact: &str) -> bool {
        self.contacts.iter().any(|c| c == id_contact)
    }
}

/// User registration data (plain password, hashed before storage)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub image: Option<String>,
    pub date_of_birth: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: "u1".to_string(),
            username: "alice01".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            image: None,
            date_of_birth: None,
            contacts: vec![],
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["username"], "alice01");
    }
}
