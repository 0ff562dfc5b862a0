use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use formwright_core::{AppError, AppResult};
use formwright_domain::{
    ErrorMap, FieldError, FieldErrorKind, FieldPath, FieldValue, FormDefinition,
};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use crate::submission::{SubmissionPhase, SubmissionState, SubmitOutcome};
use crate::{
    AsyncFieldCheck, DependentFieldController, EntryId, FieldArray, FieldArrayEntry,
    FieldRegistry, FormOptions, SubmitHandler, ValidationEngine,
};

mod arrays;
mod change;
mod submit;

#[cfg(test)]
mod tests;

pub use submit::SUBMIT_FALLBACK_MESSAGE;

const EVENT_CAPACITY: usize = 64;

/// Notification published to form subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    /// A value at `path` (or below it) changed.
    ValueChanged {
        /// Changed path.
        path: FieldPath,
    },
    /// The error map changed.
    ErrorsChanged {
        /// Error map after the change.
        errors: ErrorMap,
    },
    /// The submission state machine moved.
    PhaseChanged {
        /// New phase.
        phase: SubmissionPhase,
        /// In-flight flag in the new phase.
        is_submitting: bool,
    },
    /// The form returned to its defaults.
    Reset,
}

/// Point-in-time copy of the form state.
#[derive(Debug, Clone, PartialEq)]
pub struct FormStateView {
    /// Current values.
    pub values: FieldValue,
    /// Current errors.
    pub errors: ErrorMap,
    /// Submission phase.
    pub phase: SubmissionPhase,
    /// In-flight flag; the submit action is disabled while true.
    pub is_submitting: bool,
    /// Whether at least one submit was attempted.
    pub is_submitted: bool,
    /// Whether any value differs from the defaults.
    pub is_dirty: bool,
    /// Number of submit attempts.
    pub submit_count: u32,
    /// Touched paths.
    pub touched: BTreeSet<FieldPath>,
    /// Dirty paths.
    pub dirty: BTreeSet<FieldPath>,
}

struct FormState {
    registry: FieldRegistry,
    errors: ErrorMap,
    submission: SubmissionState,
    arrays: BTreeMap<FieldPath, FieldArray>,
    dependents: Vec<DependentFieldController>,
}

impl FormState {
    fn new(definition: &FormDefinition, registry: FieldRegistry) -> Self {
        let mut state = Self {
            registry,
            errors: ErrorMap::new(),
            submission: SubmissionState::new(),
            arrays: BTreeMap::new(),
            dependents: Vec::new(),
        };
        state.bind_structure(definition);
        state
    }

    fn bind_structure(&mut self, definition: &FormDefinition) {
        let values = self.registry.values();
        self.arrays = definition
            .field_arrays()
            .iter()
            .map(|path| {
                let len = values
                    .get(path)
                    .and_then(FieldValue::as_list)
                    .map_or(0, <[FieldValue]>::len);
                let minimum = definition.rules().min_items(path);
                (path.clone(), FieldArray::new(path.clone(), len, minimum))
            })
            .collect();
        self.dependents = definition
            .dependencies()
            .iter()
            .map(|dependency| DependentFieldController::new(dependency.clone(), values))
            .collect();
    }

    /// Re-aligns field arrays at, above or below `path` after a direct write.
    fn sync_arrays(&mut self, path: &FieldPath) {
        let Self {
            registry,
            errors,
            arrays,
            ..
        } = self;
        for array in arrays
            .values_mut()
            .filter(|array| array.path().starts_with(path) || path.starts_with(array.path()))
        {
            array.sync_len(registry, errors);
        }
    }

    fn is_hidden(&self, path: &FieldPath) -> bool {
        self.dependents
            .iter()
            .any(|dependent| !dependent.is_active() && dependent.covers(path))
    }

    fn array_mut(&mut self, path: &FieldPath) -> AppResult<&mut FieldArray> {
        self.arrays
            .get_mut(path)
            .ok_or_else(|| AppError::NotFound(format!("field array '{path}' is not declared")))
    }

    fn view(&self) -> FormStateView {
        FormStateView {
            values: self.registry.values().clone(),
            errors: self.errors.clone(),
            phase: self.submission.phase(),
            is_submitting: self.submission.is_submitting(),
            is_submitted: self.submission.is_submitted(),
            is_dirty: self.registry.is_form_dirty(),
            submit_count: self.submission.submit_count(),
            touched: self.registry.touched().clone(),
            dirty: self.registry.dirty().clone(),
        }
    }
}

/// One live form instance: registry, errors, field arrays, dependent
/// fields and the submission state machine.
///
/// Each instance owns its state exclusively. Subscribers observe changes
/// through [`FormController::subscribe`].
pub struct FormController {
    definition: FormDefinition,
    options: FormOptions,
    engine: ValidationEngine,
    state: Mutex<FormState>,
    events: broadcast::Sender<FormEvent>,
}

impl FormController {
    /// Creates a form instance populated with the definition's defaults.
    #[must_use]
    pub fn new(definition: FormDefinition, options: FormOptions) -> Self {
        let engine = ValidationEngine::new(definition.rules().clone(), options.refinement_policy);
        let registry = FieldRegistry::new(definition.defaults().clone(), options.registry_mode);
        let state = FormState::new(&definition, registry);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            definition,
            options,
            engine,
            state: Mutex::new(state),
            events,
        }
    }

    /// Adds an asynchronous check run on full validation.
    pub fn with_async_check(
        mut self,
        path: &str,
        check: Arc<dyn AsyncFieldCheck>,
    ) -> AppResult<Self> {
        self.engine = self.engine.with_async_check(path, check)?;
        Ok(self)
    }

    /// Returns the form definition.
    #[must_use]
    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    /// Returns the form options.
    #[must_use]
    pub fn options(&self) -> FormOptions {
        self.options
    }

    /// Subscribes to form events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FormEvent> {
        self.events.subscribe()
    }

    /// Returns a copy of the current form state.
    pub async fn state(&self) -> FormStateView {
        self.state.lock().await.view()
    }

    /// Returns the current error map.
    pub async fn errors(&self) -> ErrorMap {
        self.state.lock().await.errors.clone()
    }

    /// Returns the current value at `path`.
    pub async fn value(&self, path: &str) -> AppResult<Option<FieldValue>> {
        let path = FieldPath::parse(path)?;
        Ok(self.state.lock().await.registry.get_value(&path).cloned())
    }

    /// Returns whether the field at `path` is visible. Fields governed by an
    /// inactive dependency are hidden.
    pub async fn is_visible(&self, path: &str) -> AppResult<bool> {
        let path = FieldPath::parse(path)?;
        Ok(!self.state.lock().await.is_hidden(&path))
    }

    fn emit(&self, event: FormEvent) {
        let _ = self.events.send(event);
    }

    fn emit_phase(&self, phase: SubmissionPhase) {
        self.emit(FormEvent::PhaseChanged {
            phase,
            is_submitting: phase.is_submitting(),
        });
    }

    fn emit_errors_if_changed(&self, before: &ErrorMap, state: &FormState) {
        if *before != state.errors {
            self.emit(FormEvent::ErrorsChanged {
                errors: state.errors.clone(),
            });
        }
    }

    /// Validates the rules governing `path` and merges the results.
    ///
    /// Refinement failures reported on other fields are only shown when the
    /// target was touched or already shows an error, unless `forced`.
    fn revalidate(&self, state: &mut FormState, path: &FieldPath, forced: bool) {
        let outcome = self
            .engine
            .validate_field(state.registry.values(), path, &state.errors);

        for (field_path, error) in outcome.field_updates {
            if !state.is_hidden(&field_path) {
                state.errors.set(field_path, error);
            }
        }

        for (target, error) in outcome.refinement_updates {
            if state.is_hidden(&target) {
                continue;
            }
            let shown = forced
                || error.is_none()
                || target.starts_with(path)
                || state.registry.is_touched(&target)
                || state.errors.contains(&target);
            if shown {
                state.errors.set(target, error);
            }
        }
    }

    /// Runs revalidations scheduled by dependent-field activation. Untouched
    /// fields without an error are left alone.
    fn revalidate_pending(&self, state: &mut FormState) {
        let pending: Vec<FieldPath> = state
            .dependents
            .iter_mut()
            .filter_map(|dependent| {
                dependent
                    .take_pending_revalidation()
                    .then(|| dependent.dependent().clone())
            })
            .collect();

        for path in pending {
            if state.registry.is_touched(&path) || state.errors.contains(&path) {
                debug!(form = %self.definition.name(), path = %path, "revalidating activated field");
                self.revalidate(state, &path, false);
            }
        }
    }

    fn observe_dependencies(&self, state: &mut FormState, path: &FieldPath) {
        let FormState {
            registry,
            errors,
            dependents,
            ..
        } = state;
        for dependent in dependents
            .iter_mut()
            .filter(|dependent| dependent.is_controlled_by(path))
        {
            let change = dependent.observe(registry.values(), errors);
            debug!(
                form = %self.definition.name(),
                controlling = %path,
                dependent = %dependent.dependent(),
                change = ?change,
                "dependency evaluated"
            );
        }
    }
}
