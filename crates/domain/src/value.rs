use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use formwright_core::{AppError, AppResult};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::{FieldPath, PathSegment};

/// Current value of a field or field group.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldValue {
    /// No value (`undefined`/`null` on the input side).
    #[default]
    Null,
    /// Checkbox state.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Raw or textual value.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Ordered repeated values.
    List(Vec<FieldValue>),
    /// Named members.
    Group(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Creates a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Creates a group from key/value pairs.
    #[must_use]
    pub fn group<K, I>(members: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        Self::Group(
            members
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Returns whether the value counts as absent for required checks:
    /// null, empty text or an empty list.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Returns the JavaScript-style truthiness used by dependency conditions.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0.0 && !value.is_nan(),
            Self::Text(text) => !text.is_empty(),
            Self::Date(_) | Self::List(_) | Self::Group(_) => true,
        }
    }

    /// Returns the text payload.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Returns the numeric payload.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the boolean payload.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the list payload.
    #[must_use]
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Short type name used in coercion messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "undefined",
            Self::Bool(_) => "boolean",
            Self::Number(value) if value.is_nan() => "nan",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Date(_) => "date",
            Self::List(_) => "array",
            Self::Group(_) => "object",
        }
    }

    /// Returns the value at `path`.
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&FieldValue> {
        let mut current = self;
        for segment in path.segments() {
            current = match (segment, current) {
                (PathSegment::Key(key), Self::Group(members)) => members.get(key)?,
                (PathSegment::Index(index), Self::List(items)) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Returns a mutable reference to the value at `path`.
    pub fn get_mut(&mut self, path: &FieldPath) -> Option<&mut FieldValue> {
        let mut current = self;
        for segment in path.segments() {
            current = match (segment, current) {
                (PathSegment::Key(key), Self::Group(members)) => members.get_mut(key)?,
                (PathSegment::Index(index), Self::List(items)) => items.get_mut(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Stores `value` at `path`.
    ///
    /// The parent must already exist. A missing member of an existing group is
    /// created; list positions must already exist.
    pub fn set(&mut self, path: &FieldPath, value: FieldValue) -> AppResult<()> {
        let Some(parent_path) = path.parent() else {
            *self = value;
            return Ok(());
        };

        let parent = self
            .get_mut(&parent_path)
            .ok_or_else(|| AppError::NotFound(format!("no value at '{parent_path}'")))?;

        match (path.last(), parent) {
            (Some(PathSegment::Key(key)), Self::Group(members)) => {
                members.insert(key.clone(), value);
                Ok(())
            }
            (Some(PathSegment::Index(index)), Self::List(items)) => {
                let slot = items
                    .get_mut(*index)
                    .ok_or_else(|| AppError::NotFound(format!("no value at '{path}'")))?;
                *slot = value;
                Ok(())
            }
            _ => Err(AppError::Validation(format!(
                "cannot store a value at '{path}'"
            ))),
        }
    }

    /// Returns every leaf value keyed by its path.
    ///
    /// Empty lists and groups are reported as leaves so that their path stays visible.
    #[must_use]
    pub fn leaves(&self) -> BTreeMap<FieldPath, FieldValue> {
        let mut leaves = BTreeMap::new();
        self.collect_leaves(FieldPath::root(), &mut leaves);
        leaves
    }

    fn collect_leaves(&self, path: FieldPath, leaves: &mut BTreeMap<FieldPath, FieldValue>) {
        match self {
            Self::Group(members) if !members.is_empty() => {
                for (key, member) in members {
                    member.collect_leaves(path.key(key.as_str()), leaves);
                }
            }
            Self::List(items) if !items.is_empty() => {
                for (index, item) in items.iter().enumerate() {
                    item.collect_leaves(path.index(index), leaves);
                }
            }
            _ => {
                leaves.insert(path, self.clone());
            }
        }
    }

    /// Converts the value into JSON. Dates become ISO-8601 strings.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::Number(value) => Number::from_f64(*value).map_or(Value::Null, Value::Number),
            Self::Text(text) => Value::String(text.clone()),
            Self::Date(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Group(members) => Value::Object(
                members
                    .iter()
                    .map(|(key, member)| (key.clone(), member.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }

    /// Parses ISO-8601 dates and RFC 3339 timestamps.
    #[must_use]
    pub fn parse_date(raw: &str) -> Option<NaiveDate> {
        let trimmed = raw.trim();
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(trimmed)
                    .ok()
                    .map(|timestamp| timestamp.date_naive())
            })
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(number) => number.as_f64().map_or(Self::Null, Self::Number),
            Value::String(text) => Self::Text(text),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(members) => Self::Group(
                members
                    .into_iter()
                    .map(|(key, member)| (key, Self::from(member)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::FieldValue;
    use crate::FieldPath;

    fn path(value: &str) -> FieldPath {
        FieldPath::parse(value).unwrap_or_else(|error| panic!("invalid test path: {error}"))
    }

    fn profile() -> FieldValue {
        FieldValue::from(json!({
            "address": { "city": "", "state": "" },
            "hobbies": [{ "name": "chess" }, { "name": "" }],
            "subscribe": false
        }))
    }

    #[test]
    fn get_walks_groups_and_lists() {
        let value = profile();
        assert_eq!(
            value.get(&path("hobbies.0.name")),
            Some(&FieldValue::text("chess"))
        );
        assert_eq!(value.get(&path("hobbies.5.name")), None);
        assert_eq!(value.get(&path("subscribe.deep")), None);
    }

    #[test]
    fn set_creates_missing_group_members_only() {
        let mut value = profile();
        let stored = value.set(&path("address.zip"), FieldValue::text("10115"));
        assert!(stored.is_ok());
        assert!(
            value
                .set(&path("hobbies.4.name"), FieldValue::text("go"))
                .is_err()
        );
        assert!(
            value
                .set(&path("missing.city"), FieldValue::text("x"))
                .is_err()
        );
    }

    #[test]
    fn leaves_are_keyed_by_concrete_path() {
        let leaves = profile().leaves();
        assert!(leaves.contains_key(&path("hobbies.1.name")));
        assert!(leaves.contains_key(&path("address.city")));
        assert!(!leaves.contains_key(&path("hobbies")));
    }

    #[test]
    fn truthiness_follows_checkbox_and_text_semantics() {
        assert!(!FieldValue::Bool(false).is_truthy());
        assert!(!FieldValue::text("").is_truthy());
        assert!(FieldValue::text(" ").is_truthy());
        assert!(!FieldValue::Number(f64::NAN).is_truthy());
    }

    #[test]
    fn dates_parse_from_iso_and_rfc3339() {
        assert!(FieldValue::parse_date("2026-03-01").is_some());
        assert!(FieldValue::parse_date("2026-03-01T10:00:00Z").is_some());
        assert!(FieldValue::parse_date("yesterday").is_none());
    }
}
