use formwright_core::{AppError, AppResult, NonEmptyString};

use crate::{FieldDependency, FieldPath, FieldValue, RuleSet};

/// Everything needed to instantiate a form: rules, defaults, field arrays and dependencies.
#[derive(Debug, Clone)]
pub struct FormDefinition {
    name: NonEmptyString,
    display_name: NonEmptyString,
    rules: RuleSet,
    defaults: FieldValue,
    field_arrays: Vec<FieldPath>,
    dependencies: Vec<FieldDependency>,
}

impl FormDefinition {
    /// Creates a validated form definition. Defaults must be a group.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        rules: RuleSet,
        defaults: FieldValue,
    ) -> AppResult<Self> {
        if !matches!(defaults, FieldValue::Group(_)) {
            return Err(AppError::Validation(
                "form defaults must be a group of named fields".to_owned(),
            ));
        }

        Ok(Self {
            name: NonEmptyString::new(name)?,
            display_name: NonEmptyString::new(display_name)?,
            rules,
            defaults,
            field_arrays: Vec::new(),
            dependencies: Vec::new(),
        })
    }

    /// Declares the list at `path` as a dynamically resizable field array.
    pub fn with_field_array(mut self, path: &str) -> AppResult<Self> {
        let path = FieldPath::parse(path)?;
        if path.has_wildcard() {
            return Err(AppError::Validation(format!(
                "field array '{path}' must be a concrete path"
            )));
        }

        if self.defaults.get(&path).and_then(FieldValue::as_list).is_none() {
            return Err(AppError::Validation(format!(
                "field array '{path}' needs a list default"
            )));
        }

        if self.field_arrays.contains(&path) {
            return Err(AppError::Validation(format!(
                "duplicate field array '{path}'"
            )));
        }

        self.field_arrays.push(path);
        Ok(self)
    }

    /// Adds a dependent field.
    pub fn with_dependency(mut self, dependency: FieldDependency) -> AppResult<Self> {
        for path in [dependency.controlling(), dependency.dependent()] {
            if self.defaults.get(path).is_none() {
                return Err(AppError::Validation(format!(
                    "dependency field '{path}' has no default value"
                )));
            }
        }

        if self
            .dependencies
            .iter()
            .any(|existing| existing.dependent() == dependency.dependent())
        {
            return Err(AppError::Validation(format!(
                "field '{}' already has a controlling dependency",
                dependency.dependent()
            )));
        }

        self.dependencies.push(dependency);
        Ok(self)
    }

    /// Returns form logical name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns form display name.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the rule set.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns default values.
    #[must_use]
    pub fn defaults(&self) -> &FieldValue {
        &self.defaults
    }

    /// Returns field array paths.
    #[must_use]
    pub fn field_arrays(&self) -> &[FieldPath] {
        &self.field_arrays
    }

    /// Returns dependent fields.
    #[must_use]
    pub fn dependencies(&self) -> &[FieldDependency] {
        &self.dependencies
    }
}
