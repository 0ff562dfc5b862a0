//! Form engine services: registry, validation, field arrays, dependent
//! fields and submission.

#![forbid(unsafe_code)]

mod dependent_field;
mod field_array;
mod field_registry;
mod form_controller;
mod form_options;
mod submission;
mod submission_ports;
mod validation_engine;

pub mod form_catalog;

pub use dependent_field::{DependencyChange, DependentFieldController};
pub use field_array::{EntryId, FieldArray, FieldArrayEntry};
pub use field_registry::{FieldRegistry, RegistryMode};
pub use form_controller::{FormController, FormEvent, FormStateView, SUBMIT_FALLBACK_MESSAGE};
pub use form_options::{FormOptions, ReValidateMode, ValidationMode};
pub use submission::{SubmissionPhase, SubmissionState, SubmitOutcome};
pub use submission_ports::{AsyncFieldCheck, SubmitError, SubmitHandler};
pub use validation_engine::{FieldValidation, RefinementPolicy, ValidationEngine};
