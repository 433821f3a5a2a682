//! User service - Handles user registration and lookup.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use common::{AppError, AppResult, OptionExt};
use domain::{NewUser, Password, User, USERNAME_FIELD};

use crate::schemas::Collections;
use crate::store::{Condition, DocumentHandler};

use super::entity;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Register a user, hashing the password before storage
    async fn register_user(&self, user: NewUser) -> AppResult<User>;

    async fn get_user(&self, id: &str) -> AppResult<User>;

    async fn get_user_by_username(&self, username: &str) -> AppResult<User>;
}

/// Stored form of a user
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord<'a> {
    username: &'a str,
    email: &'a str,
    password_hash: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_of_birth: Option<&'a str>,
}

/// Concrete implementation of UserService over the document store.
pub struct UserManager {
    store: Arc<DocumentHandler>,
    collections: Collections,
}

impl UserManager {
    pub fn new(store: Arc<DocumentHandler>, collections: Collections) -> Self {
        Self { store, collections }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn register_user(&self, user: NewUser) -> AppResult<User> {
        let users = &self.collections.users;

        // Check if username already exists
        let taken = Condition::new().eq(USERNAME_FIELD, user.username.as_str());
        if self.store.search_one(users, &taken, None).await?.is_some() {
            return Err(AppError::conflict(format!("Username {}", user.username)));
        }

        let password = Password::new(&user.password)?;
        let record = UserRecord {
            username: &user.username,
            email: &user.email,
            password_hash: password.as_str(),
            image: user.image.as_deref(),
            date_of_birth: user.date_of_birth.as_deref(),
        };

        let created: User = entity(self.store.add_document(users, &record).await?)?;
        info!(id_user = %created.id, "User registered");
        Ok(created)
    }

    async fn get_user(&self, id: &str) -> AppResult<User> {
        self.store
            .search_by_id(&self.collections.users, id, None)
            .await?
            .ok_or_not_found(format!("User {} not found", id))
            .and_then(entity)
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<User> {
        let condition = Condition::new().eq(USERNAME_FIELD, username);
        self.store
            .search_one(&self.collections.users, &condition, None)
            .await?
            .ok_or_not_found(format!("User {} not found", username))
            .and_then(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Connection;

    async fn manager() -> UserManager {
        let store = Arc::new(DocumentHandler::new(Connection::init("memory://").await.unwrap()));
        let collections = Collections::register(&store).unwrap();
        UserManager::new(store, collections)
    }

    fn alice() -> NewUser {
        NewUser {
            username: "alice01".to_string(),
            email: "alice@example.com".to_string(),
            password: "correct-horse".to_string(),
            image: None,
            date_of_birth: Some("1990-04-12".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let manager = manager().await;

        let user = manager.register_user(alice()).await.unwrap();
        assert_ne!(user.password_hash, "correct-horse");
        assert!(Password::from_hash(user.password_hash.clone()).verify("correct-horse"));
        assert!(user.contacts.is_empty());

        let found = manager.get_user_by_username("alice01").await.unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_taken_username() {
        let manager = manager().await;
        manager.register_user(alice()).await.unwrap();

        let err = manager.register_user(alice()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "Username alice01 already exists");
    }

    #[tokio::test]
    async fn test_register_validates_fields() {
        let manager = manager().await;

        let short_password = NewUser {
            password: "short".to_string(),
            ..alice()
        };
        assert!(matches!(
            manager.register_user(short_password).await,
            Err(AppError::Validation(_))
        ));

        let bad_username = NewUser {
            username: "no".to_string(),
            ..alice()
        };
        assert!(matches!(
            manager.register_user(bad_username).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let manager = manager().await;
        assert!(manager.get_user("missing").await.unwrap_err().is_not_found());
    }
}
