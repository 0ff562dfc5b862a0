use formwright_domain::{ErrorMap, FieldDependency, FieldPath, FieldValue};
use tracing::debug;

/// Effect of a controlling-field change on its dependent field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyChange {
    /// Active state did not change.
    Unchanged,
    /// Dependent field became visible and required.
    Activated,
    /// Dependent field became hidden; its errors were cleared.
    Deactivated,
}

/// Derives the active state of one dependent field from the live value of
/// its controlling field.
///
/// Deactivation clears the dependent's errors at once. Activation only
/// schedules a revalidation for the next validation pass.
#[derive(Debug, Clone)]
pub struct DependentFieldController {
    dependency: FieldDependency,
    active: bool,
    pending_revalidation: bool,
}

impl DependentFieldController {
    /// Creates a controller whose state reflects `form`.
    #[must_use]
    pub fn new(dependency: FieldDependency, form: &FieldValue) -> Self {
        let active = dependency.is_satisfied(form);
        Self {
            dependency,
            active,
            pending_revalidation: false,
        }
    }

    /// Returns the dependency definition.
    #[must_use]
    pub fn dependency(&self) -> &FieldDependency {
        &self.dependency
    }

    /// Returns the dependent field path.
    #[must_use]
    pub fn dependent(&self) -> &FieldPath {
        self.dependency.dependent()
    }

    /// Returns whether the dependent field is currently visible and required.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns whether a revalidation is scheduled for the next pass.
    #[must_use]
    pub fn is_pending_revalidation(&self) -> bool {
        self.pending_revalidation
    }

    /// Returns whether a change at `path` can affect the controlling field.
    #[must_use]
    pub fn is_controlled_by(&self, path: &FieldPath) -> bool {
        let controlling = self.dependency.controlling();
        controlling.starts_with(path) || path.starts_with(controlling)
    }

    /// Returns whether `path` is the dependent field or lies below it.
    #[must_use]
    pub fn covers(&self, path: &FieldPath) -> bool {
        path.starts_with(self.dependency.dependent())
    }

    /// Re-evaluates the dependency against `form`.
    pub fn observe(&mut self, form: &FieldValue, errors: &mut ErrorMap) -> DependencyChange {
        let active = self.dependency.is_satisfied(form);
        if active == self.active {
            return DependencyChange::Unchanged;
        }

        self.active = active;
        let dependent = self.dependency.dependent();
        if active {
            self.pending_revalidation = true;
            debug!(dependent = %dependent, "dependent field activated");
            DependencyChange::Activated
        } else {
            self.pending_revalidation = false;
            errors.remove_prefix(dependent);
            debug!(dependent = %dependent, "dependent field deactivated");
            DependencyChange::Deactivated
        }
    }

    /// Clears and returns the scheduled revalidation flag.
    pub fn take_pending_revalidation(&mut self) -> bool {
        std::mem::take(&mut self.pending_revalidation)
    }

    /// Drops errors of the dependent field while it is inactive.
    pub fn filter_errors(&self, errors: &mut ErrorMap) {
        if !self.active {
            errors.remove_prefix(self.dependency.dependent());
        }
    }
}
