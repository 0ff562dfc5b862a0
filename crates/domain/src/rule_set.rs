use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use formwright_core::{AppError, AppResult};

use crate::{FieldError, FieldErrorKind, FieldPath, FieldRule, FieldValue};

/// Predicate over the whole form value.
pub type FormPredicate = Arc<dyn Fn(&FieldValue) -> bool + Send + Sync>;

/// Whole-form check whose failure is attached to one target path.
#[derive(Clone)]
pub struct Refinement {
    target: FieldPath,
    depends_on: Vec<FieldPath>,
    message: String,
    predicate: FormPredicate,
}

impl Refinement {
    /// Creates a refinement.
    ///
    /// `depends_on` lists the paths whose changes can flip the outcome; the
    /// target is always included.
    #[must_use]
    pub fn new(
        target: FieldPath,
        depends_on: Vec<FieldPath>,
        message: impl Into<String>,
        predicate: FormPredicate,
    ) -> Self {
        let mut depends_on = depends_on;
        if !depends_on.contains(&target) {
            depends_on.push(target.clone());
        }

        Self {
            target,
            depends_on,
            message: message.into(),
            predicate,
        }
    }

    /// Returns the path the failure is attached to.
    #[must_use]
    pub fn target(&self) -> &FieldPath {
        &self.target
    }

    /// Returns the paths this refinement reads.
    #[must_use]
    pub fn depends_on(&self) -> &[FieldPath] {
        &self.depends_on
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns whether a change at `path` can affect this refinement.
    #[must_use]
    pub fn is_affected_by(&self, path: &FieldPath) -> bool {
        self.depends_on
            .iter()
            .any(|dependency| path.starts_with(dependency) || dependency.starts_with(path))
    }

    /// Evaluates the refinement against the whole form value.
    #[must_use]
    pub fn check(&self, form: &FieldValue) -> Option<FieldError> {
        (!(self.predicate)(form))
            .then(|| FieldError::new(FieldErrorKind::CrossField, self.message.as_str()))
    }
}

impl Debug for Refinement {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Refinement")
            .field("target", &self.target)
            .field("depends_on", &self.depends_on)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Unified rule representation: ordered constraints per path plus whole-form refinements.
///
/// Rules are indexed by path template so a change to one field only looks up
/// that field's rule.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<FieldRule>,
    index: HashMap<FieldPath, usize>,
    refinements: Vec<Refinement>,
}

impl RuleSet {
    /// Creates a validated rule set. Each path may only be declared once.
    pub fn new(rules: Vec<FieldRule>, refinements: Vec<Refinement>) -> AppResult<Self> {
        let mut index = HashMap::with_capacity(rules.len());
        for (position, rule) in rules.iter().enumerate() {
            if rule.path().is_root() {
                return Err(AppError::Validation(
                    "field rules cannot target the whole form".to_owned(),
                ));
            }

            if index.insert(rule.path().template(), position).is_some() {
                return Err(AppError::Validation(format!(
                    "duplicate rule for field '{}'",
                    rule.path()
                )));
            }
        }

        for refinement in &refinements {
            if refinement.target().has_wildcard() {
                return Err(AppError::Validation(format!(
                    "refinement target '{}' must be a concrete path",
                    refinement.target()
                )));
            }
        }

        Ok(Self {
            rules,
            index,
            refinements,
        })
    }

    /// Returns every field rule in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Returns every refinement in declaration order.
    #[must_use]
    pub fn refinements(&self) -> &[Refinement] {
        &self.refinements
    }

    /// Returns the rule governing a concrete path.
    #[must_use]
    pub fn rule_for(&self, path: &FieldPath) -> Option<&FieldRule> {
        self.index
            .get(&path.template())
            .and_then(|position| self.rules.get(*position))
    }

    /// Returns the refinements a change at `path` can affect.
    pub fn refinements_affected_by<'a>(
        &'a self,
        path: &'a FieldPath,
    ) -> impl Iterator<Item = &'a Refinement> + 'a {
        self.refinements
            .iter()
            .filter(move |refinement| refinement.is_affected_by(path))
    }

    /// Returns whether the path, one of its ancestors, or one of its
    /// descendants is declared by a rule or refinement.
    #[must_use]
    pub fn declares(&self, path: &FieldPath) -> bool {
        let template = path.template();
        self.rules.iter().any(|rule| {
            template.starts_with(rule.path()) || rule.path().starts_with(&template)
        }) || self
            .refinements
            .iter()
            .any(|refinement| refinement.is_affected_by(path))
    }

    /// Returns the minimum item count declared for a list path.
    #[must_use]
    pub fn min_items(&self, list_path: &FieldPath) -> Option<usize> {
        self.rule_for(list_path).and_then(FieldRule::min_items)
    }

    /// Expands a possibly wildcard rule path into the concrete paths present in `form`.
    #[must_use]
    pub fn expand(rule_path: &FieldPath, form: &FieldValue) -> Vec<FieldPath> {
        let mut expanded = vec![FieldPath::root()];
        for segment in rule_path.segments() {
            let mut next = Vec::with_capacity(expanded.len());
            for prefix in expanded {
                match segment {
                    crate::PathSegment::Wildcard => {
                        let count = form
                            .get(&prefix)
                            .and_then(FieldValue::as_list)
                            .map_or(0, <[FieldValue]>::len);
                        next.extend((0..count).map(|index| prefix.index(index)));
                    }
                    crate::PathSegment::Key(key) => next.push(prefix.key(key.as_str())),
                    crate::PathSegment::Index(index) => next.push(prefix.index(*index)),
                }
            }
            expanded = next;
        }
        expanded
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::{Refinement, RuleSet};
    use crate::{Constraint, ConstraintKind, FieldKind, FieldPath, FieldRule, FieldValue};

    fn path(value: &str) -> FieldPath {
        FieldPath::parse(value).unwrap_or_else(|error| panic!("invalid test path: {error}"))
    }

    fn hobby_rules() -> RuleSet {
        RuleSet::new(
            vec![
                FieldRule::new(path("hobbies"), FieldKind::List).with_constraint(Constraint::new(
                    ConstraintKind::MinItems(1),
                    "At least one hobby is required",
                )),
                FieldRule::new(path("hobbies.*.name"), FieldKind::Text).with_constraint(
                    Constraint::new(ConstraintKind::MinLength(1), "Hobby name is required"),
                ),
            ],
            vec![Refinement::new(
                path("referral"),
                vec![path("subscribe")],
                "Referral is required when subscribed",
                Arc::new(|_| true),
            )],
        )
        .unwrap_or_else(|error| panic!("invalid rule set: {error}"))
    }

    #[test]
    fn concrete_paths_resolve_through_templates() {
        let rules = hobby_rules();
        assert!(rules.rule_for(&path("hobbies.7.name")).is_some());
        assert!(rules.rule_for(&path("hobbies.7")).is_none());
        assert_eq!(rules.min_items(&path("hobbies")), Some(1));
    }

    #[test]
    fn duplicate_rules_are_rejected() {
        let result = RuleSet::new(
            vec![
                FieldRule::new(path("hobbies.0.name"), FieldKind::Text),
                FieldRule::new(path("hobbies.*.name"), FieldKind::Text),
            ],
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn wildcards_expand_over_present_items() {
        let form = FieldValue::from(json!({ "hobbies": [{ "name": "a" }, { "name": "b" }] }));
        let expanded = RuleSet::expand(&path("hobbies.*.name"), &form);
        assert_eq!(expanded, vec![path("hobbies.0.name"), path("hobbies.1.name")]);
    }

    #[test]
    fn refinements_are_found_by_dependency() {
        let rules = hobby_rules();
        let subscribe = path("subscribe");
        let email = path("email");
        assert_eq!(rules.refinements_affected_by(&subscribe).count(), 1);
        assert_eq!(rules.refinements_affected_by(&email).count(), 0);
        assert!(rules.declares(&path("referral")));
        assert!(!rules.declares(&email));
    }
}
