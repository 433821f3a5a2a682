//! Infrastructure layer - SQL connection, migrations and row entities.

mod db;
pub mod entities;
pub mod migrations;

pub use db::Database;
pub use migrations::Migrator;
