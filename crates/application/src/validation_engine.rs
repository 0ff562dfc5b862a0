//! Validation engine: full and partial evaluation of a rule set.

use std::sync::Arc;

use formwright_core::AppResult;
use formwright_domain::{
    ErrorMap, FieldError, FieldErrorKind, FieldPath, FieldRule, FieldValue, Refinement, RuleSet,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AsyncFieldCheck;


/// When whole-form refinements run relative to per-field rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementPolicy {
    /// Refinements run only when no per-field rule fails.
    #[default]
    AfterFieldRules,
    /// Refinements run regardless of per-field failures.
    Always,
}

/// Outcome of validating the fields touched by one change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValidation {
    /// Per-field rule results for the changed path and its descendants.
    pub field_updates: Vec<(FieldPath, Option<FieldError>)>,
    /// Refinement results for refinements that read the changed path.
    pub refinement_updates: Vec<(FieldPath, Option<FieldError>)>,
}

/// Evaluates a rule set against form values.
#[derive(Clone)]
pub struct ValidationEngine {
    rules: Arc<RuleSet>,
    policy: RefinementPolicy,
    async_checks: Vec<(FieldPath, Arc<dyn AsyncFieldCheck>)>,
}

impl ValidationEngine {
    /// Creates an engine for `rules`.
    #[must_use]
    pub fn new(rules: RuleSet, policy: RefinementPolicy) -> Self {
        Self {
            rules: Arc::new(rules),
            policy,
            async_checks: Vec::new(),
        }
    }

    /// Registers an asynchronous check for a (possibly wildcard) path.
    pub fn with_async_check(
        mut self,
        path: &str,
        check: Arc<dyn AsyncFieldCheck>,
    ) -> AppResult<Self> {
        let path = FieldPath::parse(path)?;
        self.async_checks.push((path, check));
        Ok(self)
    }

    /// Returns the rule set.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns the refinement policy.
    #[must_use]
    pub fn policy(&self) -> RefinementPolicy {
        self.policy
    }

    /// Runs every synchronous rule and refinement.
    #[must_use]
    pub fn validate(&self, form: &FieldValue) -> ErrorMap {
        let mut errors = ErrorMap::new();
        for rule in self.rules.rules() {
            Self::check_rule(rule, form, &mut errors);
        }

        if self.refinements_enabled(&errors) {
            for refinement in self.rules.refinements() {
                if let Some(error) = refinement.check(form) {
                    errors.insert_if_absent(refinement.target().clone(), error);
                }
            }
        }

        debug!(error_count = errors.len(), "full validation pass");
        errors
    }

    /// Runs every synchronous rule, then asynchronous checks for the fields
    /// whose synchronous rules passed.
    pub async fn validate_with_async_checks(&self, form: &FieldValue) -> ErrorMap {
        let mut errors = self.validate(form);
        for (pattern, check) in &self.async_checks {
            for path in RuleSet::expand(pattern, form) {
                if errors.contains(&path) {
                    continue;
                }

                let value = form.get(&path).unwrap_or(&FieldValue::Null);
                if let Some(message) = check.check(&path, value, form).await {
                    errors.insert(path, FieldError::new(FieldErrorKind::Async, message));
                }
            }
        }
        errors
    }

    /// Validates the rules governing `path` (and its descendants when it is a
    /// group or list) plus the refinements that read it.
    ///
    /// `current` is the error map before this change; it gates refinements
    /// under [`RefinementPolicy::AfterFieldRules`].
    #[must_use]
    pub fn validate_field(
        &self,
        form: &FieldValue,
        path: &FieldPath,
        current: &ErrorMap,
    ) -> FieldValidation {
        let mut outcome = FieldValidation::default();

        for rule in self.rules_under(form, path) {
            for concrete in RuleSet::expand(rule.path(), form) {
                if !concrete.starts_with(path) && !path.starts_with(&concrete) {
                    continue;
                }
                let error = rule.check(form.get(&concrete));
                outcome.field_updates.push((concrete, error));
            }
        }

        let mut candidate = current.clone();
        for (updated_path, error) in &outcome.field_updates {
            candidate.set(updated_path.clone(), error.clone());
        }

        let refinements_enabled = self.refinements_enabled(&candidate);
        for refinement in self.rules.refinements_affected_by(path) {
            let error = if refinements_enabled {
                refinement.check(form)
            } else {
                None
            };
            let blocked_by_field_error = candidate
                .get(refinement.target())
                .is_some_and(|existing| existing.kind().is_field_level());
            if !blocked_by_field_error {
                outcome
                    .refinement_updates
                    .push((refinement.target().clone(), error));
            }
        }

        debug!(
            path = %path,
            field_updates = outcome.field_updates.len(),
            refinement_updates = outcome.refinement_updates.len(),
            "partial validation pass"
        );
        outcome
    }

    /// Returns the refinements that read `path`.
    pub fn refinements_affected_by<'a>(
        &'a self,
        path: &'a FieldPath,
    ) -> impl Iterator<Item = &'a Refinement> + 'a {
        self.rules.refinements_affected_by(path)
    }

    fn refinements_enabled(&self, errors: &ErrorMap) -> bool {
        match self.policy {
            RefinementPolicy::Always => true,
            RefinementPolicy::AfterFieldRules => !errors.has_field_errors(),
        }
    }

    fn rules_under<'a>(&'a self, form: &FieldValue, path: &FieldPath) -> Vec<&'a FieldRule> {
        let is_container = matches!(
            form.get(path),
            Some(FieldValue::Group(_) | FieldValue::List(_))
        );
        if !is_container {
            return self.rules.rule_for(path).into_iter().collect();
        }

        let template = path.template();
        self.rules
            .rules()
            .iter()
            .filter(|rule| rule.path().starts_with(&template))
            .collect()
    }

    fn check_rule(rule: &FieldRule, form: &FieldValue, errors: &mut ErrorMap) {
        for path in RuleSet::expand(rule.path(), form) {
            if let Some(error) = rule.check(form.get(&path)) {
                errors.insert(path, error);
            }
        }
    }
}
