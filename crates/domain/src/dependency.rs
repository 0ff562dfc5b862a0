use formwright_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{FieldPath, FieldValue};

/// Supported condition operators for field dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyOperator {
    /// Controlling value is truthy.
    Truthy,
    /// Controlling value is falsy.
    Falsy,
    /// Controlling value equals the configured value.
    Eq,
    /// Controlling value differs from the configured value.
    Neq,
}

impl DependencyOperator {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Truthy => "truthy",
            Self::Falsy => "falsy",
            Self::Eq => "eq",
            Self::Neq => "neq",
        }
    }
}

/// A field that is only visible and required while a controlling field matches a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDependency {
    controlling: FieldPath,
    dependent: FieldPath,
    operator: DependencyOperator,
    value: Option<Value>,
}

impl FieldDependency {
    /// Creates a validated dependency.
    pub fn new(
        controlling: FieldPath,
        dependent: FieldPath,
        operator: DependencyOperator,
        value: Option<Value>,
    ) -> AppResult<Self> {
        if controlling.is_root() || dependent.is_root() {
            return Err(AppError::Validation(
                "field dependencies require concrete controlling and dependent paths".to_owned(),
            ));
        }

        if controlling == dependent {
            return Err(AppError::Validation(format!(
                "field '{controlling}' cannot depend on itself"
            )));
        }

        if matches!(operator, DependencyOperator::Eq | DependencyOperator::Neq) && value.is_none()
        {
            return Err(AppError::Validation(
                "eq and neq dependencies require value".to_owned(),
            ));
        }

        Ok(Self {
            controlling,
            dependent,
            operator,
            value,
        })
    }

    /// Dependent field is active while the controlling field is truthy.
    pub fn when_truthy(controlling: &str, dependent: &str) -> AppResult<Self> {
        Self::new(
            FieldPath::parse(controlling)?,
            FieldPath::parse(dependent)?,
            DependencyOperator::Truthy,
            None,
        )
    }

    /// Returns the controlling field path.
    #[must_use]
    pub fn controlling(&self) -> &FieldPath {
        &self.controlling
    }

    /// Returns the dependent field path.
    #[must_use]
    pub fn dependent(&self) -> &FieldPath {
        &self.dependent
    }

    /// Returns the condition operator.
    #[must_use]
    pub fn operator(&self) -> DependencyOperator {
        self.operator
    }

    /// Returns whether the dependent field is active for the given form value.
    #[must_use]
    pub fn is_satisfied(&self, form: &FieldValue) -> bool {
        let current = form.get(&self.controlling).unwrap_or(&FieldValue::Null);
        let expected = self.value.clone().map(FieldValue::from);
        match self.operator {
            DependencyOperator::Truthy => current.is_truthy(),
            DependencyOperator::Falsy => !current.is_truthy(),
            DependencyOperator::Eq => expected.as_ref() == Some(current),
            DependencyOperator::Neq => expected.as_ref() != Some(current),
        }
    }
}
