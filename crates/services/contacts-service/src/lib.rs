//! Contacts Service Library
//!
//! This crate provides the document store adapter, the contacts entity
//! schemas and the group/contact relation services built on top of them.

pub mod config;
pub mod infra;
pub mod schemas;
pub mod service;
pub mod store;

use serde_json::Value;
use tracing::info;

use crate::config::ContactsServiceConfig;
use crate::infra::Database;
use crate::service::{MembershipPolicy, Services};
use crate::store::{Connection, Document, Projection};

/// Connect to the configured store and build the services over it.
pub async fn connect(config: &ContactsServiceConfig) -> Result<Services, Box<dyn std::error::Error>> {
    let connection = Connection::init_with(&config.store).await?;
    let policy = MembershipPolicy {
        reject_duplicates: config.reject_duplicate_members,
        enforce_capacity: config.enforce_group_capacity,
    };

    Ok(Services::from_connection(connection, policy)?)
}

/// Groups owned by a user as JSON, optionally narrowed to `fields`
/// (`"name description"` keeps, `"-description"` drops).
pub async fn user_groups(
    services: &Services,
    id_user: &str,
    fields: Option<&str>,
) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    let projection = fields.map(str::parse::<Projection>).transpose()?;
    let groups = services.groups().get_groups_by_user_id(id_user).await?;

    groups
        .iter()
        .map(|group| -> Result<Value, Box<dyn std::error::Error>> {
            let document = Document::from_entity(group)?;
            Ok(match &projection {
                Some(projection) => projection.apply(document),
                None => document,
            }
            .to_value())
        })
        .collect()
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = ContactsServiceConfig::from_env();
    let db = Database::connect_without_migrations(&config.store).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}
