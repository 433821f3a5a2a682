//! Service container - wires every service over one store connection.

use std::sync::Arc;

use crate::schemas::Collections;
use crate::store::{Connection, DocumentHandler, StoreResult};

use super::{
    ContactManager, ContactService, GroupManager, GroupService, MembershipPolicy, UserManager,
    UserService,
};

/// Centralized access to the contacts services.
#[derive(Clone)]
pub struct Services {
    store: Arc<DocumentHandler>,
    group_service: Arc<dyn GroupService>,
    contact_service: Arc<dyn ContactService>,
    user_service: Arc<dyn UserService>,
}

impl Services {
    /// Build every service over a connection, registering the collections.
    pub fn from_connection(connection: Connection, policy: MembershipPolicy) -> StoreResult<Self> {
        let store = Arc::new(DocumentHandler::new(connection));
        let collections = Collections::register(&store)?;

        let group_service: Arc<dyn GroupService> =
            Arc::new(GroupManager::new(store.clone(), collections.clone()).with_policy(policy));
        let contact_service = Arc::new(ContactManager::new(
            store.clone(),
            collections.clone(),
            group_service.clone(),
        ));
        let user_service = Arc::new(UserManager::new(store.clone(), collections));

        Ok(Self {
            store,
            group_service,
            contact_service,
            user_service,
        })
    }

    pub fn groups(&self) -> Arc<dyn GroupService> {
        self.group_service.clone()
    }

    pub fn contacts(&self) -> Arc<dyn ContactService> {
        self.contact_service.clone()
    }

    pub fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    /// Underlying store adapter
    pub fn store(&self) -> &DocumentHandler {
        &self.store
    }

    /// Close the shared connection.
    pub async fn shutdown(&self) -> StoreResult<()> {
        self.store.connection().shutdown().await
    }
}
