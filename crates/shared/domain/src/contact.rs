//! Contact domain entity and related types.

use serde::{Deserialize, Serialize};

/// A contact owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Phone numbers, at least one
    pub numbers: Vec<String>,
    pub image: String,
    pub id_user: String,
}

/// Contact creation data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub numbers: Vec<String>,
    /// Falls back to the stock avatar when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub id_user: String,
}

/// Partial contact update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}
