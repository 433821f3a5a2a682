//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! users, their contacts, groups and the membership rows linking them.

pub mod constants;
pub mod contact;
pub mod error;
pub mod group;
pub mod group_contact;
pub mod password;
pub mod rules;
pub mod user;

pub use constants::*;
pub use contact::{Contact, NewContact, UpdateContact};
pub use error::{DomainError, DomainResult};
pub use group::{Group, NewGroup, UpdateGroup};
pub use group_contact::{GroupContact, NewGroupContact};
pub use password::Password;
pub use rules::FieldRule;
pub use user::{NewUser, User};
