use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::FieldPath;

/// Key of the synthetic root path used for submission-level failures.
pub const ROOT_ERROR_KEY: &str = "root";

/// Category of a field failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// Value is missing.
    Required,
    /// Value could not be coerced to the declared shape.
    Type,
    /// Text is shorter than allowed.
    TooShort,
    /// Text is longer than allowed.
    TooLong,
    /// Number is below the lower bound.
    TooSmall,
    /// Number is above the upper bound.
    TooBig,
    /// Text does not match a pattern or format.
    Pattern,
    /// Value is not one of the allowed options.
    InvalidOption,
    /// List has fewer items than required.
    TooFewItems,
    /// List has more items than allowed.
    TooManyItems,
    /// Custom synchronous predicate failed.
    Custom,
    /// Asynchronous predicate failed.
    Async,
    /// Whole-form refinement failed.
    CrossField,
    /// External submit handler failed.
    Submission,
}

impl FieldErrorKind {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Type => "type",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::TooSmall => "too_small",
            Self::TooBig => "too_big",
            Self::Pattern => "pattern",
            Self::InvalidOption => "invalid_option",
            Self::TooFewItems => "too_few_items",
            Self::TooManyItems => "too_many_items",
            Self::Custom => "custom",
            Self::Async => "async",
            Self::CrossField => "cross_field",
            Self::Submission => "submission",
        }
    }

    /// Returns whether the failure came from a per-field rule.
    #[must_use]
    pub fn is_field_level(&self) -> bool {
        !matches!(self, Self::CrossField | Self::Submission)
    }
}

/// One failure message attached to a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    kind: FieldErrorKind,
    message: String,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub fn new(kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the failure category.
    #[must_use]
    pub fn kind(&self) -> FieldErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Path-to-message mapping of current failures. Absence of a key means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorMap {
    entries: BTreeMap<FieldPath, FieldError>,
}

impl ErrorMap {
    /// Creates an empty error map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the synthetic root path.
    #[must_use]
    pub fn root_path() -> FieldPath {
        FieldPath::root().key(ROOT_ERROR_KEY)
    }

    /// Returns whether no failure is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of failing paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the failure at `path`.
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&FieldError> {
        self.entries.get(path)
    }

    /// Returns the message at `path`.
    #[must_use]
    pub fn message(&self, path: &FieldPath) -> Option<&str> {
        self.entries.get(path).map(FieldError::message)
    }

    /// Returns the root-level failure.
    #[must_use]
    pub fn root(&self) -> Option<&FieldError> {
        self.entries.get(&Self::root_path())
    }

    /// Returns whether a failure is recorded at `path`.
    #[must_use]
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Records a failure, replacing any previous one at the same path.
    pub fn insert(&mut self, path: FieldPath, error: FieldError) {
        self.entries.insert(path, error);
    }

    /// Records a failure only when the path has none yet.
    pub fn insert_if_absent(&mut self, path: FieldPath, error: FieldError) {
        self.entries.entry(path).or_insert(error);
    }

    /// Records or clears the failure at `path`.
    pub fn set(&mut self, path: FieldPath, error: Option<FieldError>) {
        match error {
            Some(error) => {
                self.entries.insert(path, error);
            }
            None => {
                self.entries.remove(&path);
            }
        }
    }

    /// Sets the root-level failure.
    pub fn set_root(&mut self, error: FieldError) {
        self.entries.insert(Self::root_path(), error);
    }

    /// Clears the failure at `path`.
    pub fn remove(&mut self, path: &FieldPath) -> Option<FieldError> {
        self.entries.remove(path)
    }

    /// Clears every failure at `prefix` or below it.
    pub fn remove_prefix(&mut self, prefix: &FieldPath) {
        self.entries.retain(|path, _| !path.starts_with(prefix));
    }

    /// Returns whether any per-field rule failure is recorded.
    #[must_use]
    pub fn has_field_errors(&self) -> bool {
        self.entries.values().any(|error| error.kind().is_field_level())
    }

    /// Iterates failures in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &FieldError)> {
        self.entries.iter()
    }

    /// Drops the failures of list item `removed` under `list_path` and shifts
    /// the failures of later items down by one position.
    pub fn remove_list_item(&mut self, list_path: &FieldPath, removed: usize) {
        self.reindex_list(list_path, |index| match index {
            index if index == removed => None,
            index if index > removed => Some(index - 1),
            index => Some(index),
        });
    }

    /// Rewrites list item positions under `list_path`. Items mapped to `None` are dropped.
    pub fn reindex_list(
        &mut self,
        list_path: &FieldPath,
        mut remap: impl FnMut(usize) -> Option<usize>,
    ) {
        let entries = std::mem::take(&mut self.entries);
        for (path, error) in entries {
            match path.index_under(list_path) {
                Some(index) => {
                    if let Some(next) = remap(index) {
                        self.entries
                            .insert(path.with_index_under(list_path, next), error);
                    }
                }
                None => {
                    self.entries.insert(path, error);
                }
            }
        }
    }
}

impl FromIterator<(FieldPath, FieldError)> for ErrorMap {
    fn from_iter<T: IntoIterator<Item = (FieldPath, FieldError)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
