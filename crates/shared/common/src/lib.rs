//! Common utilities shared across services.
//!
//! This crate provides:
//! - The service-tier error type raised by every service operation
//! - Configuration structures

pub mod config;
pub mod error;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
