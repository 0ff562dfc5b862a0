//! Imperative rule style: an ordered list of checks registered per field.

use std::sync::Arc;

use formwright_core::AppResult;

use crate::{
    Constraint, ConstraintKind, FieldKind, FieldPath, FieldRule, FieldValue, FormPredicate,
    Refinement, RuleSet,
};

/// Checks registered for one field, in evaluation order.
#[derive(Debug, Clone)]
pub struct FieldRules {
    kind: FieldKind,
    type_message: Option<String>,
    constraints: Vec<Constraint>,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldRules {
    /// Creates an empty registration that accepts any value shape.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kind: FieldKind::Any,
            type_message: None,
            constraints: Vec::new(),
        }
    }

    fn with(mut self, kind: ConstraintKind, message: impl Into<String>) -> Self {
        self.constraints.push(Constraint::new(kind, message));
        self
    }

    /// Field must not be empty.
    #[must_use]
    pub fn required(self, message: impl Into<String>) -> Self {
        self.with(ConstraintKind::Required, message)
    }

    /// Minimum text length.
    #[must_use]
    pub fn min_length(self, length: usize, message: impl Into<String>) -> Self {
        self.with(ConstraintKind::MinLength(length), message)
    }

    /// Maximum text length.
    #[must_use]
    pub fn max_length(self, length: usize, message: impl Into<String>) -> Self {
        self.with(ConstraintKind::MaxLength(length), message)
    }

    /// Inclusive lower bound. Implies numeric coercion.
    #[must_use]
    pub fn min(mut self, bound: f64, message: impl Into<String>) -> Self {
        self.kind = FieldKind::Number;
        self.with(ConstraintKind::Min(bound), message)
    }

    /// Inclusive upper bound. Implies numeric coercion.
    #[must_use]
    pub fn max(mut self, bound: f64, message: impl Into<String>) -> Self {
        self.kind = FieldKind::Number;
        self.with(ConstraintKind::Max(bound), message)
    }

    /// Parses the input as a number before any bound check.
    #[must_use]
    pub fn value_as_number(mut self, message: impl Into<String>) -> Self {
        self.kind = FieldKind::Number;
        self.type_message = Some(message.into());
        self
    }

    /// Parses the input as a date.
    #[must_use]
    pub fn value_as_date(mut self, message: impl Into<String>) -> Self {
        self.kind = FieldKind::Date;
        self.type_message = Some(message.into());
        self
    }

    /// Declares the field as a checkbox.
    #[must_use]
    pub fn boolean(mut self) -> Self {
        self.kind = FieldKind::Boolean;
        self
    }

    /// Declares the field as a text input.
    #[must_use]
    pub fn text(mut self) -> Self {
        self.kind = FieldKind::Text;
        self
    }

    /// Declares the field as a multi-value input.
    #[must_use]
    pub fn list(mut self) -> Self {
        self.kind = FieldKind::List;
        self
    }

    /// Declares the field as a nested group.
    #[must_use]
    pub fn group(mut self) -> Self {
        self.kind = FieldKind::Group;
        self
    }

    /// Message reported when the input has the wrong shape.
    #[must_use]
    pub fn type_message(mut self, message: impl Into<String>) -> Self {
        self.type_message = Some(message.into());
        self
    }

    /// Text must match `source`.
    pub fn pattern(mut self, source: &str, message: impl Into<String>) -> AppResult<Self> {
        self.constraints.push(Constraint::pattern(source, message)?);
        Ok(self)
    }

    /// Text must be an email address.
    #[must_use]
    pub fn email(self, message: impl Into<String>) -> Self {
        self.with(ConstraintKind::Email, message)
    }

    /// Text must be one of `options`.
    #[must_use]
    pub fn one_of<I, S>(self, options: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = options.into_iter().map(Into::into).collect();
        self.with(ConstraintKind::OneOf(options), message)
    }

    /// List must contain at least `count` items.
    #[must_use]
    pub fn min_items(mut self, count: usize, message: impl Into<String>) -> Self {
        self.kind = FieldKind::List;
        self.with(ConstraintKind::MinItems(count), message)
    }

    /// Custom predicate.
    #[must_use]
    pub fn validate(
        self,
        message: impl Into<String>,
        predicate: impl Fn(&FieldValue) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.with(ConstraintKind::Custom(Arc::new(predicate)), message)
    }

    fn into_rule(self, path: FieldPath) -> FieldRule {
        let mut rule = FieldRule::new(path, self.kind);
        if let Some(message) = self.type_message {
            rule.set_type_message(message);
        }
        for constraint in self.constraints {
            rule.push(constraint);
        }
        rule
    }
}

/// Collection of per-field registrations and form-level checks.
#[derive(Debug, Default)]
pub struct FormRules {
    rules: Vec<FieldRule>,
    refinements: Vec<Refinement>,
}

impl FormRules {
    /// Creates an empty registration set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the checks for one field path (`hobbies.*.name` for array items).
    pub fn register(mut self, path: &str, rules: FieldRules) -> AppResult<Self> {
        let path = FieldPath::parse(path)?;
        self.rules.push(rules.into_rule(path));
        Ok(self)
    }

    /// Registers a check that reads several fields and reports on `target`.
    pub fn validate_form(
        mut self,
        target: &str,
        depends_on: &[&str],
        message: impl Into<String>,
        predicate: impl Fn(&FieldValue) -> bool + Send + Sync + 'static,
    ) -> AppResult<Self> {
        let target = FieldPath::parse(target)?;
        let depends_on = depends_on
            .iter()
            .map(|path| FieldPath::parse(path))
            .collect::<AppResult<Vec<_>>>()?;
        let predicate: FormPredicate = Arc::new(predicate);
        self.refinements
            .push(Refinement::new(target, depends_on, message, predicate));
        Ok(self)
    }

    /// Builds the unified rule set.
    pub fn build(self) -> AppResult<RuleSet> {
        RuleSet::new(self.rules, self.refinements)
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldRules, FormRules};
    use crate::{FieldKind, FieldPath, FieldValue};

    #[test]
    fn bounds_imply_numeric_coercion() {
        let rules = FormRules::new()
            .register(
                "age",
                FieldRules::new()
                    .required("Age is required")
                    .min(18.0, "too young"),
            )
            .and_then(FormRules::build)
            .unwrap_or_else(|error| panic!("invalid rules: {error}"));

        let age = FieldPath::root().key("age");
        let rule = rules
            .rule_for(&age)
            .unwrap_or_else(|| panic!("age rule missing"));
        assert_eq!(rule.kind(), FieldKind::Number);
        assert!(rule.check(Some(&FieldValue::text("21"))).is_none());
    }

    #[test]
    fn invalid_pattern_is_reported() {
        assert!(FieldRules::new().pattern("([a-z", "broken").is_err());
    }
}
