use formwright_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{RefinementPolicy, RegistryMode};

/// When validation runs before the first submit attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Only submit validates.
    #[default]
    OnSubmit,
    /// Every change validates the changed field.
    OnChange,
    /// Every blur validates the blurred field.
    OnBlur,
    /// The first blur validates, then every change of that field.
    OnTouched,
    /// Both change and blur validate.
    All,
}

impl ValidationMode {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnSubmit => "on_submit",
            Self::OnChange => "on_change",
            Self::OnBlur => "on_blur",
            Self::OnTouched => "on_touched",
            Self::All => "all",
        }
    }

    /// Parses storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "on_submit" => Ok(Self::OnSubmit),
            "on_change" => Ok(Self::OnChange),
            "on_blur" => Ok(Self::OnBlur),
            "on_touched" => Ok(Self::OnTouched),
            "all" => Ok(Self::All),
            _ => Err(AppError::Validation(format!(
                "unknown validation mode '{value}'"
            ))),
        }
    }
}

/// When validation runs after the first submit attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReValidateMode {
    /// Every change validates the changed field.
    #[default]
    OnChange,
    /// Every blur validates the blurred field.
    OnBlur,
    /// Only submit validates.
    OnSubmit,
}

impl ReValidateMode {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnChange => "on_change",
            Self::OnBlur => "on_blur",
            Self::OnSubmit => "on_submit",
        }
    }

    /// Parses storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "on_change" => Ok(Self::OnChange),
            "on_blur" => Ok(Self::OnBlur),
            "on_submit" => Ok(Self::OnSubmit),
            _ => Err(AppError::Validation(format!(
                "unknown re-validate mode '{value}'"
            ))),
        }
    }
}

/// Per-form configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormOptions {
    /// Trigger mode before the first submit.
    pub mode: ValidationMode,
    /// Trigger mode after the first submit.
    pub re_validate_mode: ReValidateMode,
    /// Treatment of writes to unknown paths.
    pub registry_mode: RegistryMode,
    /// Ordering of refinements relative to per-field rules.
    pub refinement_policy: RefinementPolicy,
}

impl FormOptions {
    /// Options with the given trigger mode and defaults elsewhere.
    #[must_use]
    pub fn with_mode(mode: ValidationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Returns whether a change of a field validates it.
    ///
    /// `submitted` is true once a submit was attempted; `blurred` is true
    /// once the field lost focus at least once.
    #[must_use]
    pub fn validates_on_change(&self, submitted: bool, blurred: bool) -> bool {
        if submitted {
            return self.re_validate_mode == ReValidateMode::OnChange;
        }

        match self.mode {
            ValidationMode::OnChange | ValidationMode::All => true,
            ValidationMode::OnTouched => blurred,
            ValidationMode::OnSubmit | ValidationMode::OnBlur => false,
        }
    }

    /// Returns whether a blur of a field validates it.
    #[must_use]
    pub fn validates_on_blur(&self, submitted: bool) -> bool {
        if submitted {
            return self.re_validate_mode == ReValidateMode::OnBlur;
        }

        matches!(
            self.mode,
            ValidationMode::OnBlur | ValidationMode::OnTouched | ValidationMode::All
        )
    }
}
