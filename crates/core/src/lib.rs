//! Shared primitives for all Rust crates in Formwright.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across Formwright crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Common application error categories.
///
/// Field-level validation failures are not represented here: they are
/// collected into an error map and never escape the validation engine.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation conflicts with the current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A strict-mode registry was asked to write a path it does not know.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Removing a field-array entry would drop below the declared minimum.
    #[error("field array '{path}' requires at least {minimum} entries")]
    MinimumCountViolation {
        /// Field-array path.
        path: String,
        /// Minimum entry count declared by the rule set.
        minimum: usize,
    },

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
