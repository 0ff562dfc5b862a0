use std::fmt::{Display, Formatter};
use std::str::FromStr;

use formwright_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// One segment of a field path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// Named member of a group.
    Key(String),
    /// Position inside a list.
    Index(usize),
    /// Any position inside a list. Only valid in rule paths.
    Wildcard,
}

impl Display for PathSegment {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key(key) => formatter.write_str(key),
            Self::Index(index) => write!(formatter, "{index}"),
            Self::Wildcard => formatter.write_str("*"),
        }
    }
}

/// Dotted, indexed location of a value inside a form (`address.city`, `hobbies.0.name`).
///
/// The empty path addresses the whole form value.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Path of the whole form value.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dotted path. Purely numeric segments become list indices and
    /// `*` becomes a wildcard.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for raw in trimmed.split('.') {
            if raw.is_empty() {
                return Err(AppError::Validation(format!(
                    "field path '{trimmed}' contains an empty segment"
                )));
            }

            let segment = if raw == "*" {
                PathSegment::Wildcard
            } else if raw.bytes().all(|byte| byte.is_ascii_digit()) {
                let index = raw.parse::<usize>().map_err(|error| {
                    AppError::Validation(format!(
                        "field path '{trimmed}' has invalid index '{raw}': {error}"
                    ))
                })?;
                PathSegment::Index(index)
            } else {
                PathSegment::Key(raw.to_owned())
            };
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns whether this is the whole-form path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns whether the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a child path addressing a group member.
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.into()));
        Self { segments }
    }

    /// Returns a child path addressing a list position.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Returns a child path addressing any list position.
    #[must_use]
    pub fn wildcard(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Wildcard);
        Self { segments }
    }

    /// Returns the parent path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    /// Returns the last segment.
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Returns whether `prefix` is this path or one of its ancestors.
    #[must_use]
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Returns whether the path contains wildcard segments.
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, PathSegment::Wildcard))
    }

    /// Returns the rule lookup key: every index is replaced by a wildcard.
    #[must_use]
    pub fn template(&self) -> Self {
        Self {
            segments: self
                .segments
                .iter()
                .map(|segment| match segment {
                    PathSegment::Index(_) => PathSegment::Wildcard,
                    other => other.clone(),
                })
                .collect(),
        }
    }

    /// Returns whether a concrete path is matched by this (possibly wildcard) path.
    #[must_use]
    pub fn matches(&self, concrete: &FieldPath) -> bool {
        self.segments.len() == concrete.segments.len()
            && self
                .segments
                .iter()
                .zip(&concrete.segments)
                .all(|(pattern, segment)| match (pattern, segment) {
                    (PathSegment::Wildcard, PathSegment::Index(_)) => true,
                    (left, right) => left == right,
                })
    }

    /// Returns the list index that follows `list_path` in this path.
    #[must_use]
    pub fn index_under(&self, list_path: &FieldPath) -> Option<usize> {
        if !self.starts_with(list_path) {
            return None;
        }

        match self.segments.get(list_path.len()) {
            Some(PathSegment::Index(index)) => Some(*index),
            _ => None,
        }
    }

    /// Returns a copy whose index directly under `list_path` is replaced.
    ///
    /// Paths that do not continue with an index under `list_path` are returned unchanged.
    #[must_use]
    pub fn with_index_under(&self, list_path: &FieldPath, index: usize) -> Self {
        let mut segments = self.segments.clone();
        if self.index_under(list_path).is_some() {
            segments[list_path.len()] = PathSegment::Index(index);
        }
        Self { segments }
    }
}

impl Display for FieldPath {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 {
                formatter.write_str(".")?;
            }
            write!(formatter, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FieldPath> for String {
    fn from(value: FieldPath) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{FieldPath, PathSegment};

    fn path(value: &str) -> FieldPath {
        FieldPath::parse(value).unwrap_or_else(|error| panic!("invalid test path: {error}"))
    }

    #[test]
    fn numeric_segments_become_indices() {
        let parsed = path("hobbies.0.name");
        assert_eq!(
            parsed.segments(),
            &[
                PathSegment::Key("hobbies".to_owned()),
                PathSegment::Index(0),
                PathSegment::Key("name".to_owned()),
            ]
        );
    }

    #[test]
    fn empty_segment_is_rejected() {
        assert!(FieldPath::parse("address..city").is_err());
    }

    #[test]
    fn template_replaces_indices_with_wildcards() {
        assert_eq!(path("hobbies.3.name").template(), path("hobbies.*.name"));
        assert!(path("hobbies.*.name").matches(&path("hobbies.12.name")));
        assert!(!path("hobbies.*.name").matches(&path("hobbies.name")));
    }

    #[test]
    fn index_under_reads_and_rewrites_array_position() {
        let list = path("hobbies");
        let item = path("hobbies.2.name");
        assert_eq!(item.index_under(&list), Some(2));
        assert_eq!(item.with_index_under(&list, 1), path("hobbies.1.name"));
        assert_eq!(path("address.city").index_under(&list), None);
    }

    proptest! {
        #[test]
        fn display_round_trips_through_parse(
            keys in proptest::collection::vec("[a-z][a-zA-Z]{0,6}", 1..4),
            index in 0usize..50,
        ) {
            let mut raw = keys.join(".");
            raw.push_str(&format!(".{index}"));
            let parsed = path(raw.as_str());
            prop_assert_eq!(parsed.to_string(), raw);
        }
    }
}
