//! Service-tier error handling.
//!
//! Store adapters report failures as values; services raise `AppError`
//! instead, so callers can treat every service call as fail-fast and
//! propagate with `?`.

use domain::DomainError;
use thiserror::Error;

/// Application error types raised by service operations.
#[derive(Error, Debug)]
pub enum AppError {
    // Resource errors
    #[error("{0}")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("Group {group} is full ({max_contacts} contacts)")]
    CapacityExceeded { group: String, max_contacts: u32 },

    // Validation
    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    // Store errors surfaced from the adapter tier
    #[error("{0}")]
    Store(String),

    /// A failed service operation, carrying the underlying cause
    #[error("{context}: {source}")]
    Operation {
        context: String,
        #[source]
        source: Box<AppError>,
    },

    // Internal
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Operation { source, .. } => source.code(),
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Innermost error of an operation chain
    pub fn root_cause(&self) -> &AppError {
        match self {
            AppError::Operation { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether the root cause is a missing resource
    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), AppError::NotFound(_))
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Password(msg) => AppError::Validation(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, what: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, what: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(what.into()))
    }
}

/// Convenience constructors
impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn conflict(entity: impl Into<String>) -> Self {
        AppError::Conflict(entity.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Wrap a failure with the operation that produced it
    pub fn operation(context: impl Into<String>, source: AppError) -> Self {
        AppError::Operation {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_chain_message() {
        let err = AppError::operation(
            "Error removing contact from group",
            AppError::not_found("GroupContact with idGroup g1 and idContact c1 not found"),
        );

        assert_eq!(
            err.to_string(),
            "Error removing contact from group: GroupContact with idGroup g1 and idContact c1 not found"
        );
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_domain_error_conversion() {
        let err: AppError = DomainError::password("Password must not be empty").into();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.to_string(), "Password must not be empty");
    }

    #[test]
    fn test_option_ext() {
        let missing: Option<u8> = None;
        let err = missing.ok_or_not_found("Group not found").unwrap_err();
        assert_eq!(err.to_string(), "Group not found");
    }
}
