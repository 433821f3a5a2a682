//! Service layer - contacts domain use cases.
//!
//! Services sit on top of the document store adapter and raise `AppError`
//! instead of returning store errors as values.

mod contact_service;
mod container;
mod group_service;
mod user_service;

pub use contact_service::{ContactManager, ContactService};
pub use container::Services;
pub use group_service::{GroupManager, GroupService, MembershipFilter, MembershipPolicy};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use contact_service::MockContactService;
#[cfg(any(test, feature = "test-utils"))]
pub use group_service::MockGroupService;
#[cfg(any(test, feature = "test-utils"))]
pub use user_service::MockUserService;

use serde::de::DeserializeOwned;
use tracing::error;

use common::{AppError, AppResult};

use crate::store::Document;

/// Deserialize a stored document into a domain entity.
pub(crate) fn entity<T: DeserializeOwned>(document: Document) -> AppResult<T> {
    let id = document.id.clone();
    document
        .into_entity()
        .map_err(|e| AppError::internal(format!("Stored document {} is malformed: {}", id, e)))
}

/// Log a failed operation with the ids it was called with and wrap the cause.
pub(crate) fn failed(context: &'static str, ids: &[(&str, &str)], err: AppError) -> AppError {
    let ids = ids
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(" ");
    error!(ids = %ids, error = %err, "{}", context);
    AppError::operation(context, err)
}
