//! Document shapes of the contacts domain.
//!
//! Each domain entity declares its stored field map here; [`Collections`]
//! registers all of them against a handler in one step.

mod shapes;

use domain::{Contact, Group, GroupContact, User};

use crate::store::{DocumentHandler, Model, StoreResult};

/// Registered models of every contacts collection.
#[derive(Debug, Clone)]
pub struct Collections {
    pub users: Model,
    pub contacts: Model,
    pub groups: Model,
    pub group_contacts: Model,
}

impl Collections {
    /// Register (or fetch the already registered) models.
    pub fn register(handler: &DocumentHandler) -> StoreResult<Self> {
        Ok(Self {
            users: handler.create_model::<User>()?,
            contacts: handler.create_model::<Contact>()?,
            groups: handler.create_model::<Group>()?,
            group_contacts: handler.create_model::<GroupContact>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Connection;

    #[tokio::test]
    async fn test_register_is_repeatable() {
        let handler = DocumentHandler::new(Connection::init("memory://").await.unwrap());

        let first = Collections::register(&handler).unwrap();
        let second = Collections::register(&handler).unwrap();

        assert_eq!(first.groups.name(), "groups");
        assert_eq!(second.group_contacts.name(), "groupcontacts");
        assert_eq!(first.contacts.schema(), second.contacts.schema());
    }
}
