//! Form domain: paths, values, rules and error maps.

#![forbid(unsafe_code)]

mod constraint;
mod dependency;
mod error_map;
mod field_rules;
mod form;
mod path;
mod rule_set;
mod schema;
mod value;

pub use constraint::{Constraint, ConstraintKind, FieldKind, FieldRule, ValuePredicate};
pub use dependency::{DependencyOperator, FieldDependency};
pub use error_map::{ErrorMap, FieldError, FieldErrorKind, ROOT_ERROR_KEY};
pub use field_rules::{FieldRules, FormRules};
pub use form::FormDefinition;
pub use path::{FieldPath, PathSegment};
pub use rule_set::{FormPredicate, Refinement, RuleSet};
pub use schema::Schema;
pub use value::FieldValue;
