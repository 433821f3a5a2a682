//! Contact service - contact CRUD and owner bookkeeping.
//!
//! Every contact is referenced from its owner's `contacts` list. Deleting a
//! contact also removes its group memberships and that reference.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use common::{AppResult, OptionExt};
use domain::{Contact, NewContact, UpdateContact, User, CONTACTS_FIELD, ID_USER_FIELD};

use crate::schemas::Collections;
use crate::store::{Condition, DocumentHandler};

use super::entity;
use super::group_service::{GroupService, MembershipFilter};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Contact service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ContactService: Send + Sync {
    /// Create a contact and reference it from its owner
    async fn create_contact(&self, contact: NewContact) -> AppResult<Contact>;

    async fn get_contact(&self, id: &str) -> AppResult<Contact>;

    async fn get_contacts_by_user_id(&self, id_user: &str) -> AppResult<Vec<Contact>>;

    async fn update_contact(&self, id: &str, patch: UpdateContact) -> AppResult<Contact>;

    /// Delete a contact with its memberships and owner reference
    async fn delete_contact(&self, id: &str) -> AppResult<Contact>;
}

/// Concrete implementation of ContactService over the document store.
pub struct ContactManager {
    store: Arc<DocumentHandler>,
    collections: Collections,
    groups: Arc<dyn GroupService>,
}

impl ContactManager {
    pub fn new(
        store: Arc<DocumentHandler>,
        collections: Collections,
        groups: Arc<dyn GroupService>,
    ) -> Self {
        Self {
            store,
            collections,
            groups,
        }
    }

    async fn owner(&self, id_user: &str) -> AppResult<Option<User>> {
        self.store
            .search_by_id(&self.collections.users, id_user, None)
            .await?
            .map(entity)
            .transpose()
    }

    async fn set_owner_contacts(&self, id_user: &str, contacts: Vec<String>) -> AppResult<()> {
        self.store
            .edit_document(
                &self.collections.users,
                id_user,
                &json!({ CONTACTS_FIELD: contacts }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ContactService for ContactManager {
    async fn create_contact(&self, contact: NewContact) -> AppResult<Contact> {
        let mut owner = self
            .owner(&contact.id_user)
            .await?
            .ok_or_not_found(format!("User {} not found", contact.id_user))?;

        let created: Contact =
            entity(self.store.add_document(&self.collections.contacts, &contact).await?)?;

        owner.contacts.push(created.id.clone());
        self.set_owner_contacts(&owner.id, owner.contacts).await?;

        info!(id_contact = %created.id, id_user = %created.id_user, "Contact created");
        Ok(created)
    }

    async fn get_contact(&self, id: &str) -> AppResult<Contact> {
        self.store
            .search_by_id(&self.collections.contacts, id, None)
            .await?
            .ok_or_not_found(format!("Contact {} not found", id))
            .and_then(entity)
    }

    async fn get_contacts_by_user_id(&self, id_user: &str) -> AppResult<Vec<Contact>> {
        let condition = Condition::new().eq(ID_USER_FIELD, id_user);
        self.store
            .search_many(&self.collections.contacts, &condition, None)
            .await?
            .into_iter()
            .map(entity)
            .collect()
    }

    async fn update_contact(&self, id: &str, patch: UpdateContact) -> AppResult<Contact> {
        self.store
            .edit_document(&self.collections.contacts, id, &patch)
            .await?
            .ok_or_not_found(format!("Contact {} not found", id))
            .and_then(entity)
    }

    async fn delete_contact(&self, id: &str) -> AppResult<Contact> {
        let contact = self.get_contact(id).await?;

        let memberships = self
            .groups
            .remove_group_contacts(MembershipFilter::by_contact(id))
            .await?;

        if let Some(owner) = self.owner(&contact.id_user).await? {
            if owner.owns_contact(id) {
                let remaining = owner.contacts.into_iter().filter(|c| c != id).collect();
                self.set_owner_contacts(&owner.id, remaining).await?;
            }
        }

        let removed = self
            .store
            .remove_document(&self.collections.contacts, id)
            .await?
            .ok_or_not_found(format!("Contact {} not found", id))
            .and_then(entity)?;

        info!(id_contact = id, memberships = memberships.len(), "Contact deleted");
        Ok(removed)
    }
}
