//! Store-tier errors.
//!
//! Adapter operations never panic or propagate raw backend failures: every
//! failure is returned as a `StoreError` value, which serializes to the
//! tagged form `{ "error": "<message>" }`.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

use common::AppError;

use super::backend::BackendError;

/// Errors returned as values by the document store adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Error connecting to database: {0}")]
    Connection(String),

    #[error("Error disconnecting from database: {0}")]
    Disconnect(String),

    #[error("Not connected to database")]
    Disconnected,

    /// Registration of a shape failed
    #[error("Error creating model for class {shape}: {reason}")]
    ModelCreation { shape: String, reason: String },

    /// A document or patch does not satisfy the model schema
    #[error("Validation failed for model {model}: {message}")]
    Validation { model: String, message: String },

    /// A backend operation failed
    #[error("Error {action} model {model}. Error: {cause}")]
    Operation {
        action: &'static str,
        model: String,
        cause: String,
    },
}

impl StoreError {
    pub fn model_creation(shape: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::ModelCreation {
            shape: shape.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(model: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Validation {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Wrap a backend failure for the given action and model.
    pub(crate) fn operation(action: &'static str, model: &str, cause: BackendError) -> Self {
        match cause {
            BackendError::Closed => StoreError::Disconnected,
            other => StoreError::Operation {
                action,
                model: model.to_string(),
                cause: other.to_string(),
            },
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation { .. })
    }
}

impl Serialize for StoreError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tagged = serializer.serialize_struct("StoreError", 1)?;
        tagged.serialize_field("error", &self.to_string())?;
        tagged.end()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation { .. } => AppError::Validation(err.to_string()),
            other => AppError::Store(other.to_string()),
        }
    }
}

/// Result type alias for adapter operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_serialization() {
        let err = StoreError::Operation {
            action: "adding document to",
            model: "groups".to_string(),
            cause: "boom".to_string(),
        };

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "error": "Error adding document to model groups. Error: boom" })
        );
    }

    #[test]
    fn test_closed_backend_maps_to_disconnected() {
        let err = StoreError::operation("searching", "groups", BackendError::Closed);
        assert_eq!(err, StoreError::Disconnected);
    }

    #[test]
    fn test_validation_becomes_app_validation() {
        let err: AppError = StoreError::validation("groups", "name is required").into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
