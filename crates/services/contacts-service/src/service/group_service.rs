//! Group service - groups and their contact memberships.
//!
//! Membership is stored as join rows (`idGroup`, `idContact`). Deleting
//! either side cleans up its join rows explicitly; the store enforces no
//! foreign keys.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{info, warn};

use common::{AppError, AppResult};
use domain::{
    Contact, Group, GroupContact, NewGroup, NewGroupContact, UpdateGroup, ID_CONTACT_FIELD,
    ID_GROUP_FIELD, ID_USER_FIELD,
};

use crate::schemas::Collections;
use crate::store::{Condition, Document, DocumentHandler, Model};

use super::{entity, failed};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Checks applied before a contact is added to a group.
///
/// Both are off by default, so repeated adds create repeated rows and
/// capacity is informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MembershipPolicy {
    /// Refuse to add a pair that already exists
    pub reject_duplicates: bool,
    /// Refuse to add to a group already holding `maxContacts` members
    pub enforce_capacity: bool,
}

impl MembershipPolicy {
    /// Both checks enabled
    pub fn strict() -> Self {
        Self {
            reject_duplicates: true,
            enforce_capacity: true,
        }
    }
}

/// Selects join rows by exactly one side of the membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipFilter {
    pub id_group: Option<String>,
    pub id_contact: Option<String>,
}

impl MembershipFilter {
    pub fn by_group(id_group: impl Into<String>) -> Self {
        Self {
            id_group: Some(id_group.into()),
            id_contact: None,
        }
    }

    pub fn by_contact(id_contact: impl Into<String>) -> Self {
        Self {
            id_group: None,
            id_contact: Some(id_contact.into()),
        }
    }

    fn condition(&self) -> AppResult<Condition> {
        fn provided(id: &Option<String>) -> Option<&str> {
            id.as_deref().filter(|id| !id.is_empty())
        }

        match (provided(&self.id_group), provided(&self.id_contact)) {
            (Some(id_group), None) => Ok(Condition::new().eq(ID_GROUP_FIELD, id_group)),
            (None, Some(id_contact)) => Ok(Condition::new().eq(ID_CONTACT_FIELD, id_contact)),
            _ => Err(AppError::bad_request(
                "Either idGroup or idContact must be provided",
            )),
        }
    }

    fn ids(&self) -> [(&'static str, &str); 2] {
        [
            (ID_GROUP_FIELD, self.id_group.as_deref().unwrap_or("-")),
            (ID_CONTACT_FIELD, self.id_contact.as_deref().unwrap_or("-")),
        ]
    }
}

/// Group service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait GroupService: Send + Sync {
    /// Create a group (capacity defaults to 50)
    async fn create_group(&self, group: NewGroup) -> AppResult<Group>;

    /// Groups owned by a user; empty when the lookup itself fails
    async fn get_groups_by_user_id(&self, id_user: &str) -> AppResult<Vec<Group>>;

    /// Get a group, failing with `NotFound("Group not found")`
    async fn get_info_group(&self, id: &str) -> AppResult<Group>;

    async fn update_group(&self, id: &str, patch: UpdateGroup) -> AppResult<Group>;

    async fn view_all_groups(&self) -> AppResult<Vec<Group>>;

    /// Insert a membership row, subject to the membership policy
    async fn add_contact_to_group(&self, id_group: &str, id_contact: &str)
        -> AppResult<GroupContact>;

    /// Delete every membership row of a pair, returning the first
    async fn remove_contact_from_group(
        &self,
        id_group: &str,
        id_contact: &str,
    ) -> AppResult<GroupContact>;

    /// Delete every membership row of one group or one contact
    async fn remove_group_contacts(&self, filter: MembershipFilter)
        -> AppResult<Vec<GroupContact>>;

    /// Delete a group after deleting its membership rows
    async fn delete_group_and_contacts(&self, id_group: &str) -> AppResult<Group>;

    async fn get_groups_by_contact_id(&self, id_contact: &str) -> AppResult<Vec<Group>>;

    async fn get_contacts_by_group_id(&self, id_group: &str) -> AppResult<Vec<Contact>>;
}

/// Concrete implementation of GroupService over the document store.
pub struct GroupManager {
    store: Arc<DocumentHandler>,
    collections: Collections,
    policy: MembershipPolicy,
}

impl GroupManager {
    /// Create new group service instance with the permissive policy
    pub fn new(store: Arc<DocumentHandler>, collections: Collections) -> Self {
        Self {
            store,
            collections,
            policy: MembershipPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MembershipPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn groups(&self) -> &Model {
        &self.collections.groups
    }

    fn memberships(&self) -> &Model {
        &self.collections.group_contacts
    }

    async fn find_group(&self, id: &str) -> AppResult<Option<Group>> {
        self.store
            .search_by_id(self.groups(), id, None)
            .await?
            .map(entity)
            .transpose()
    }

    async fn membership_rows(&self, condition: &Condition) -> AppResult<Vec<Document>> {
        Ok(self
            .store
            .search_many(self.memberships(), condition, None)
            .await?)
    }

    async fn check_policy(&self, id_group: &str, id_contact: &str) -> AppResult<()> {
        if self.policy.enforce_capacity {
            let group = self
                .find_group(id_group)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Group {} not found", id_group)))?;
            let members = self
                .membership_rows(&Condition::new().eq(ID_GROUP_FIELD, id_group))
                .await?
                .len();

            if !group.has_room_for(members) {
                return Err(AppError::CapacityExceeded {
                    group: group.id,
                    max_contacts: group.max_contacts,
                });
            }
        }

        if self.policy.reject_duplicates {
            let pair = Condition::new()
                .eq(ID_GROUP_FIELD, id_group)
                .eq(ID_CONTACT_FIELD, id_contact);
            if self
                .store
                .search_one(self.memberships(), &pair, None)
                .await?
                .is_some()
            {
                return Err(AppError::conflict(format!(
                    "Contact {} in group {}",
                    id_contact, id_group
                )));
            }
        }

        Ok(())
    }

    async fn delete_memberships(&self, filter: &MembershipFilter) -> AppResult<Vec<GroupContact>> {
        let condition = filter.condition()?;
        let rows = self.membership_rows(&condition).await?;

        let removed = try_join_all(
            rows.iter()
                .map(|row| self.store.remove_document(self.memberships(), &row.id)),
        )
        .await?;

        removed.into_iter().flatten().map(entity).collect()
    }

    /// Follow the unpopulated side of each join row into `target`.
    async fn resolve_rows<T>(
        &self,
        rows: Vec<Document>,
        key: &str,
        target: &Model,
    ) -> AppResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        let ids: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get_str(key).map(str::to_string))
            .collect();

        let found = try_join_all(
            ids.iter()
                .map(|id| self.store.search_by_id(target, id, None)),
        )
        .await?;

        found.into_iter().flatten().map(entity).collect()
    }
}

#[async_trait]
impl GroupService for GroupManager {
    async fn create_group(&self, group: NewGroup) -> AppResult<Group> {
        let result: AppResult<Group> = async {
            let doc = self.store.add_document(self.groups(), &group).await?;
            entity(doc)
        }
        .await;

        let group = result.map_err(|e| {
            failed(
                "Error creating group",
                &[(ID_USER_FIELD, group.id_user.as_str())],
                e,
            )
        })?;
        info!(id_group = %group.id, "Group created");
        Ok(group)
    }

    async fn get_groups_by_user_id(&self, id_user: &str) -> AppResult<Vec<Group>> {
        let rows = match self
            .store
            .search_relations(self.groups(), Some(id_user), ID_USER_FIELD)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(id_user, error = %e, "Could not look up groups of user");
                return Ok(Vec::new());
            }
        };

        // Relation rows carry the populated owner; re-read the plain groups.
        let result: AppResult<Vec<Group>> = async {
            let found = try_join_all(
                rows.iter()
                    .map(|row| self.store.search_by_id(self.groups(), &row.id, None)),
            )
            .await?;
            found.into_iter().flatten().map(entity).collect()
        }
        .await;

        result.map_err(|e| {
            failed(
                "Error getting all groups by user id",
                &[(ID_USER_FIELD, id_user)],
                e,
            )
        })
    }

    async fn get_info_group(&self, id: &str) -> AppResult<Group> {
        match self.find_group(id).await {
            Ok(Some(group)) => Ok(group),
            Ok(None) => Err(AppError::not_found("Group not found")),
            Err(e) => Err(failed("Error getting group info", &[(ID_GROUP_FIELD, id)], e)),
        }
    }

    async fn update_group(&self, id: &str, patch: UpdateGroup) -> AppResult<Group> {
        let result: AppResult<Group> = async {
            let doc = self
                .store
                .edit_document(self.groups(), id, &patch)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Group {} not found", id)))?;
            entity(doc)
        }
        .await;

        result.map_err(|e| failed("Error updating group", &[(ID_GROUP_FIELD, id)], e))
    }

    async fn view_all_groups(&self) -> AppResult<Vec<Group>> {
        let result: AppResult<Vec<Group>> = async {
            let docs = self.store.search_all(self.groups(), None).await?;
            docs.into_iter().map(entity).collect()
        }
        .await;

        result.map_err(|e| failed("Error getting all groups", &[], e))
    }

    async fn add_contact_to_group(
        &self,
        id_group: &str,
        id_contact: &str,
    ) -> AppResult<GroupContact> {
        let result: AppResult<GroupContact> = async {
            self.check_policy(id_group, id_contact).await?;
            let row = NewGroupContact::new(id_group, id_contact);
            let doc = self.store.add_document(self.memberships(), &row).await?;
            entity(doc)
        }
        .await;

        result.map_err(|e| {
            failed(
                "Error adding contact to group",
                &[(ID_GROUP_FIELD, id_group), (ID_CONTACT_FIELD, id_contact)],
                e,
            )
        })
    }

    async fn remove_contact_from_group(
        &self,
        id_group: &str,
        id_contact: &str,
    ) -> AppResult<GroupContact> {
        let result: AppResult<GroupContact> = async {
            let pair = Condition::new()
                .eq(ID_GROUP_FIELD, id_group)
                .eq(ID_CONTACT_FIELD, id_contact);
            let not_member = || {
                AppError::not_found(format!(
                    "Contact {} is not a member of group {}",
                    id_contact, id_group
                ))
            };

            // Repeated adds leave one row per add; drop them all.
            let rows = self.membership_rows(&pair).await?;
            let removed = try_join_all(
                rows.iter()
                    .map(|row| self.store.remove_document(self.memberships(), &row.id)),
            )
            .await?;

            let first = removed.into_iter().flatten().next().ok_or_else(not_member)?;
            entity(first)
        }
        .await;

        result.map_err(|e| {
            failed(
                "Error removing contact from group",
                &[(ID_GROUP_FIELD, id_group), (ID_CONTACT_FIELD, id_contact)],
                e,
            )
        })
    }

    async fn remove_group_contacts(
        &self,
        filter: MembershipFilter,
    ) -> AppResult<Vec<GroupContact>> {
        self.delete_memberships(&filter)
            .await
            .map_err(|e| failed("Error removing group contacts", &filter.ids(), e))
    }

    async fn delete_group_and_contacts(&self, id_group: &str) -> AppResult<Group> {
        let result: AppResult<Group> = async {
            let memberships = self
                .delete_memberships(&MembershipFilter::by_group(id_group))
                .await?;
            let doc = self
                .store
                .remove_document(self.groups(), id_group)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Group {} not found", id_group)))?;

            info!(id_group, removed = memberships.len(), "Group deleted");
            entity(doc)
        }
        .await;

        result.map_err(|e| {
            failed(
                "Error deleting group and contacts",
                &[(ID_GROUP_FIELD, id_group)],
                e,
            )
        })
    }

    async fn get_groups_by_contact_id(&self, id_contact: &str) -> AppResult<Vec<Group>> {
        let result: AppResult<Vec<Group>> = async {
            let rows = self
                .store
                .search_relations(self.memberships(), Some(id_contact), ID_CONTACT_FIELD)
                .await?;
            if rows.is_empty() {
                return Ok(Vec::new());
            }

            let groups: Vec<Group> = self.resolve_rows(rows, ID_GROUP_FIELD, self.groups()).await?;
            if groups.is_empty() {
                return Err(AppError::not_found(
                    "No groups found for the provided contact id",
                ));
            }
            Ok(groups)
        }
        .await;

        result.map_err(|e| {
            failed(
                "Error getting all groups by contact id",
                &[(ID_CONTACT_FIELD, id_contact)],
                e,
            )
        })
    }

    async fn get_contacts_by_group_id(&self, id_group: &str) -> AppResult<Vec<Contact>> {
        let result: AppResult<Vec<Contact>> = async {
            let rows = self
                .store
                .search_relations(self.memberships(), Some(id_group), ID_GROUP_FIELD)
                .await?;
            if rows.is_empty() {
                return Ok(Vec::new());
            }

            let contacts: Vec<Contact> = self
                .resolve_rows(rows, ID_CONTACT_FIELD, &self.collections.contacts)
                .await?;
            if contacts.is_empty() {
                return Err(AppError::not_found(
                    "No contacts found for the provided group id",
                ));
            }
            Ok(contacts)
        }
        .await;

        result.map_err(|e| {
            failed(
                "Error getting all contacts by group id",
                &[(ID_GROUP_FIELD, id_group)],
                e,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BackendError, Connection, MockDocumentBackend, StoreError};

    async fn manager_over(backend: MockDocumentBackend) -> GroupManager {
        let store = Arc::new(DocumentHandler::new(Connection::with_backend(Arc::new(
            backend,
        ))));
        let collections = Collections::register(&store).unwrap();
        GroupManager::new(store, collections)
    }

    #[test]
    fn test_filter_requires_exactly_one_side() {
        assert!(MembershipFilter::by_group("g1").condition().is_ok());
        assert!(MembershipFilter::by_contact("c1").condition().is_ok());

        let neither = MembershipFilter::default().condition().unwrap_err();
        assert!(matches!(neither, AppError::BadRequest(_)));

        let both = MembershipFilter {
            id_group: Some("g1".to_string()),
            id_contact: Some("c1".to_string()),
        };
        assert!(matches!(both.condition(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_filter_treats_empty_ids_as_missing() {
        let empty_group = MembershipFilter {
            id_group: Some(String::new()),
            id_contact: None,
        };
        assert!(matches!(
            empty_group.condition(),
            Err(AppError::BadRequest(_))
        ));

        let empty_group_with_contact = MembershipFilter {
            id_group: Some(String::new()),
            id_contact: Some("c1".to_string()),
        };
        assert!(empty_group_with_contact.condition().is_ok());
    }

    #[test]
    fn test_default_policy_is_permissive() {
        assert_eq!(
            MembershipPolicy::default(),
            MembershipPolicy {
                reject_duplicates: false,
                enforce_capacity: false,
            }
        );
    }

    #[tokio::test]
    async fn test_user_groups_swallow_lookup_failure() {
        let mut backend = MockDocumentBackend::new();
        backend
            .expect_find()
            .returning(|_, _| Err(BackendError::Other("connection reset".to_string())));

        let manager = manager_over(backend).await;
        let groups = manager.get_groups_by_user_id("u1").await.unwrap();
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn test_store_failures_are_wrapped_with_context() {
        let mut backend = MockDocumentBackend::new();
        backend
            .expect_find()
            .returning(|_, _| Err(BackendError::Other("connection reset".to_string())));
        backend
            .expect_find_by_id()
            .returning(|_, _| Err(BackendError::Other("connection reset".to_string())));

        let manager = manager_over(backend).await;

        let err = manager.view_all_groups().await.unwrap_err();
        assert!(err.to_string().starts_with("Error getting all groups: "));
        assert_eq!(err.code(), "STORE_ERROR");

        let err = manager.get_info_group("g1").await.unwrap_err();
        assert!(err.to_string().starts_with("Error getting group info: "));

        let err = manager
            .remove_group_contacts(MembershipFilter::by_group("g1"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Error removing group contacts: "));
    }

    #[tokio::test]
    async fn test_missing_group_info_is_not_wrapped() {
        let mut backend = MockDocumentBackend::new();
        backend.expect_find_by_id().returning(|_, _| Ok(None));

        let manager = manager_over(backend).await;
        let err = manager.get_info_group("g1").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref msg) if msg == "Group not found"));
    }

    #[tokio::test]
    async fn test_disconnected_store_surfaces_as_store_error() {
        let store = Arc::new(DocumentHandler::new(Connection::init("memory://").await.unwrap()));
        let collections = Collections::register(&store).unwrap();
        store.connection().shutdown().await.unwrap();

        let manager = GroupManager::new(store, collections);
        let err = manager
            .create_group(NewGroup::new("Friends", "Close friends", "u1"))
            .await
            .unwrap_err();

        assert!(matches!(err.root_cause(), AppError::Store(msg) if msg == &StoreError::Disconnected.to_string()));
    }
}
