use std::fmt::{Debug, Formatter};
use std::sync::{Arc, LazyLock};

use formwright_core::{AppError, AppResult};
use regex::Regex;

use crate::{FieldError, FieldErrorKind, FieldPath, FieldValue};

/// Synchronous predicate over a single (already coerced) field value.
pub type ValuePredicate = Arc<dyn Fn(&FieldValue) -> bool + Send + Sync>;

static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok()
});

/// Declared value shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any value; no coercion or type check.
    Any,
    /// Text value.
    Text,
    /// Number, coerced from text input when needed.
    Number,
    /// Boolean checkbox state.
    Boolean,
    /// Calendar date, coerced from ISO-8601 text when needed.
    Date,
    /// Ordered list of values.
    List,
    /// Group of named values.
    Group,
}

impl FieldKind {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Text => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::List => "array",
            Self::Group => "object",
        }
    }

    /// Coerces a raw value into this shape.
    ///
    /// Text bound to a numeric field is parsed; text bound to a date field is
    /// parsed as ISO-8601. Everything else must already have the right shape.
    #[must_use]
    pub fn coerce(&self, value: &FieldValue) -> Option<FieldValue> {
        match (self, value) {
            (Self::Any, value) => Some(value.clone()),
            (Self::Text, FieldValue::Text(_)) => Some(value.clone()),
            (Self::Number, FieldValue::Number(number)) if !number.is_nan() => {
                Some(value.clone())
            }
            (Self::Number, FieldValue::Text(raw)) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .map(FieldValue::Number),
            (Self::Boolean, FieldValue::Bool(_)) => Some(value.clone()),
            (Self::Date, FieldValue::Date(_)) => Some(value.clone()),
            (Self::Date, FieldValue::Text(raw)) => FieldValue::parse_date(raw).map(FieldValue::Date),
            (Self::List, FieldValue::List(_)) => Some(value.clone()),
            (Self::Group, FieldValue::Group(_)) => Some(value.clone()),
            _ => None,
        }
    }
}

/// Kind of a single constraint.
#[derive(Clone)]
pub enum ConstraintKind {
    /// Value must not be null, empty text or an empty list.
    Required,
    /// Minimum text length in characters.
    MinLength(usize),
    /// Maximum text length in characters.
    MaxLength(usize),
    /// Inclusive numeric lower bound.
    Min(f64),
    /// Inclusive numeric upper bound.
    Max(f64),
    /// Text must match the regular expression.
    Pattern(Regex),
    /// Text must be an email address.
    Email,
    /// Text must be one of the options.
    OneOf(Vec<String>),
    /// Minimum list length.
    MinItems(usize),
    /// Maximum list length.
    MaxItems(usize),
    /// Custom synchronous predicate.
    Custom(ValuePredicate),
}

impl Debug for ConstraintKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => formatter.write_str("Required"),
            Self::MinLength(length) => write!(formatter, "MinLength({length})"),
            Self::MaxLength(length) => write!(formatter, "MaxLength({length})"),
            Self::Min(bound) => write!(formatter, "Min({bound})"),
            Self::Max(bound) => write!(formatter, "Max({bound})"),
            Self::Pattern(pattern) => write!(formatter, "Pattern({})", pattern.as_str()),
            Self::Email => formatter.write_str("Email"),
            Self::OneOf(options) => write!(formatter, "OneOf({options:?})"),
            Self::MinItems(count) => write!(formatter, "MinItems({count})"),
            Self::MaxItems(count) => write!(formatter, "MaxItems({count})"),
            Self::Custom(_) => formatter.write_str("Custom(..)"),
        }
    }
}

/// One constraint with the message reported when it fails.
#[derive(Debug, Clone)]
pub struct Constraint {
    kind: ConstraintKind,
    message: String,
}

impl Constraint {
    /// Creates a constraint.
    #[must_use]
    pub fn new(kind: ConstraintKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a pattern constraint from regex source.
    pub fn pattern(source: &str, message: impl Into<String>) -> AppResult<Self> {
        let pattern = Regex::new(source).map_err(|error| {
            AppError::Validation(format!("invalid pattern '{source}': {error}"))
        })?;
        Ok(Self::new(ConstraintKind::Pattern(pattern), message))
    }

    /// Returns the constraint kind.
    #[must_use]
    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Evaluates the constraint against a coerced value.
    ///
    /// Constraints that do not apply to the value's shape pass.
    #[must_use]
    pub fn check(&self, value: &FieldValue) -> Option<FieldError> {
        let failed_kind = match (&self.kind, value) {
            (ConstraintKind::Required, value) => value.is_missing().then_some(FieldErrorKind::Required),
            (ConstraintKind::MinLength(length), FieldValue::Text(text)) => {
                (text.chars().count() < *length).then_some(FieldErrorKind::TooShort)
            }
            (ConstraintKind::MaxLength(length), FieldValue::Text(text)) => {
                (text.chars().count() > *length).then_some(FieldErrorKind::TooLong)
            }
            (ConstraintKind::Min(bound), FieldValue::Number(number)) => {
                (number < bound).then_some(FieldErrorKind::TooSmall)
            }
            (ConstraintKind::Max(bound), FieldValue::Number(number)) => {
                (number > bound).then_some(FieldErrorKind::TooBig)
            }
            (ConstraintKind::Pattern(pattern), FieldValue::Text(text)) => {
                (!pattern.is_match(text)).then_some(FieldErrorKind::Pattern)
            }
            (ConstraintKind::Email, FieldValue::Text(text)) => {
                let matches = EMAIL_PATTERN
                    .as_ref()
                    .is_some_and(|pattern| pattern.is_match(text));
                (!matches).then_some(FieldErrorKind::Pattern)
            }
            (ConstraintKind::OneOf(options), FieldValue::Text(text)) => {
                (!options.iter().any(|option| option == text))
                    .then_some(FieldErrorKind::InvalidOption)
            }
            (ConstraintKind::OneOf(_), _) => Some(FieldErrorKind::InvalidOption),
            (ConstraintKind::MinItems(count), FieldValue::List(items)) => {
                (items.len() < *count).then_some(FieldErrorKind::TooFewItems)
            }
            (ConstraintKind::MaxItems(count), FieldValue::List(items)) => {
                (items.len() > *count).then_some(FieldErrorKind::TooManyItems)
            }
            (ConstraintKind::Custom(predicate), value) => {
                (!predicate(value)).then_some(FieldErrorKind::Custom)
            }
            _ => None,
        };

        failed_kind.map(|kind| FieldError::new(kind, self.message.as_str()))
    }
}

/// Ordered constraint list for one path.
#[derive(Debug, Clone)]
pub struct FieldRule {
    path: FieldPath,
    kind: FieldKind,
    type_message: Option<String>,
    constraints: Vec<Constraint>,
}

impl FieldRule {
    /// Creates a rule for `path` with the declared shape.
    #[must_use]
    pub fn new(path: FieldPath, kind: FieldKind) -> Self {
        Self {
            path,
            kind,
            type_message: None,
            constraints: Vec::new(),
        }
    }

    /// Sets the message reported when coercion fails.
    #[must_use]
    pub fn with_type_message(mut self, message: impl Into<String>) -> Self {
        self.type_message = Some(message.into());
        self
    }

    /// Appends a constraint. Evaluation follows insertion order.
    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Appends a constraint in place.
    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Replaces the declared shape.
    pub fn set_kind(&mut self, kind: FieldKind) {
        self.kind = kind;
    }

    /// Replaces the coercion failure message.
    pub fn set_type_message(&mut self, message: impl Into<String>) {
        self.type_message = Some(message.into());
    }

    /// Returns the rule path. May contain wildcards for list items.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Returns the declared shape.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns the constraints in evaluation order.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns the minimum item count, if declared.
    #[must_use]
    pub fn min_items(&self) -> Option<usize> {
        self.constraints
            .iter()
            .find_map(|constraint| match constraint.kind() {
                ConstraintKind::MinItems(count) => Some(*count),
                _ => None,
            })
    }

    /// Evaluates the rule against the value at its path.
    ///
    /// Order: required, then coercion, then the remaining constraints in
    /// declaration order. The first failure wins.
    #[must_use]
    pub fn check(&self, value: Option<&FieldValue>) -> Option<FieldError> {
        let value = value.unwrap_or(&FieldValue::Null);

        if value.is_missing() {
            if let Some(required) = self
                .constraints
                .iter()
                .find(|constraint| matches!(constraint.kind(), ConstraintKind::Required))
            {
                return Some(FieldError::new(
                    FieldErrorKind::Required,
                    required.message(),
                ));
            }
        }

        let Some(coerced) = self.kind.coerce(value) else {
            return Some(self.coercion_error(value));
        };

        self.constraints
            .iter()
            .filter(|constraint| !matches!(constraint.kind(), ConstraintKind::Required))
            .find_map(|constraint| constraint.check(&coerced))
    }

    fn coercion_error(&self, value: &FieldValue) -> FieldError {
        // A malformed list reports the minimum-count message when one exists.
        if self.kind == FieldKind::List {
            if let Some(constraint) = self
                .constraints
                .iter()
                .find(|constraint| matches!(constraint.kind(), ConstraintKind::MinItems(_)))
            {
                return FieldError::new(FieldErrorKind::TooFewItems, constraint.message());
            }
        }

        let message = self.type_message.clone().unwrap_or_else(|| {
            format!(
                "Expected {}, received {}",
                self.kind.as_str(),
                value.type_name()
            )
        });
        FieldError::new(FieldErrorKind::Type, message)
    }
}
