use async_trait::async_trait;
use formwright_domain::{FieldPath, FieldValue};
use thiserror::Error;

/// Failure reported by an external submit handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", message.as_deref().unwrap_or("submission failed"))]
pub struct SubmitError {
    message: Option<String>,
}

impl SubmitError {
    /// Creates a failure carrying a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// Creates a failure without a message.
    #[must_use]
    pub fn silent() -> Self {
        Self { message: None }
    }

    /// Returns the human-readable message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// External collaborator receiving validated form values.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    /// Submits the validated form value. The success payload is ignored.
    async fn submit(&self, values: FieldValue) -> Result<(), SubmitError>;
}

/// Asynchronous per-field predicate, such as a server-side uniqueness check.
#[async_trait]
pub trait AsyncFieldCheck: Send + Sync {
    /// Returns the failure message, or `None` when the value is accepted.
    async fn check(&self, path: &FieldPath, value: &FieldValue, form: &FieldValue)
    -> Option<String>;
}
