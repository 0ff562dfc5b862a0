//! Declarative rule style: one schema describing the whole form's shape.

use std::sync::Arc;

use formwright_core::{AppError, AppResult};

use crate::{
    Constraint, ConstraintKind, FieldKind, FieldPath, FieldRule, FieldValue, FormPredicate,
    Refinement, RuleSet,
};

#[derive(Debug, Clone)]
enum SchemaNode {
    Scalar,
    Array(Box<Schema>),
    Object(Vec<(String, Schema)>),
}

#[derive(Clone)]
struct PendingRefinement {
    target: FieldPath,
    depends_on: Vec<FieldPath>,
    message: String,
    predicate: FormPredicate,
}

impl std::fmt::Debug for PendingRefinement {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PendingRefinement")
            .field("target", &self.target)
            .field("depends_on", &self.depends_on)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Schema node describing a value's shape and constraints.
#[derive(Debug, Clone)]
pub struct Schema {
    kind: FieldKind,
    node: SchemaNode,
    type_message: Option<String>,
    constraints: Vec<Constraint>,
    refinements: Vec<PendingRefinement>,
}

impl Schema {
    fn leaf(kind: FieldKind) -> Self {
        Self {
            kind,
            node: SchemaNode::Scalar,
            type_message: None,
            constraints: Vec::new(),
            refinements: Vec::new(),
        }
    }

    /// Text value.
    #[must_use]
    pub fn string() -> Self {
        Self::leaf(FieldKind::Text)
    }

    /// Numeric value.
    #[must_use]
    pub fn number() -> Self {
        Self::leaf(FieldKind::Number)
    }

    /// Boolean value.
    #[must_use]
    pub fn boolean() -> Self {
        Self::leaf(FieldKind::Boolean)
    }

    /// Date value.
    #[must_use]
    pub fn date() -> Self {
        Self::leaf(FieldKind::Date)
    }

    /// Text restricted to `options`. `message` is reported for any invalid input.
    #[must_use]
    pub fn enumeration<I, S>(options: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let message = message.into();
        let options = options.into_iter().map(Into::into).collect();
        let mut schema = Self::leaf(FieldKind::Text);
        schema.type_message = Some(message.clone());
        schema
            .constraints
            .push(Constraint::new(ConstraintKind::OneOf(options), message));
        schema
    }

    /// List whose items follow `item`.
    #[must_use]
    pub fn array(item: Schema) -> Self {
        Self {
            node: SchemaNode::Array(Box::new(item)),
            ..Self::leaf(FieldKind::List)
        }
    }

    /// Group with named members.
    #[must_use]
    pub fn object<I, K>(members: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Self {
            node: SchemaNode::Object(
                members
                    .into_iter()
                    .map(|(key, member)| (key.into(), member))
                    .collect(),
            ),
            ..Self::leaf(FieldKind::Group)
        }
    }

    fn with(mut self, kind: ConstraintKind, message: impl Into<String>) -> Self {
        self.constraints.push(Constraint::new(kind, message));
        self
    }

    /// Lower bound: length for text, value for numbers, item count for lists.
    #[must_use]
    pub fn min(self, bound: usize, message: impl Into<String>) -> Self {
        let kind = match self.kind {
            FieldKind::Number => ConstraintKind::Min(bound as f64),
            FieldKind::List => ConstraintKind::MinItems(bound),
            _ => ConstraintKind::MinLength(bound),
        };
        self.with(kind, message)
    }

    /// Upper bound: length for text, value for numbers, item count for lists.
    #[must_use]
    pub fn max(self, bound: usize, message: impl Into<String>) -> Self {
        let kind = match self.kind {
            FieldKind::Number => ConstraintKind::Max(bound as f64),
            FieldKind::List => ConstraintKind::MaxItems(bound),
            _ => ConstraintKind::MaxLength(bound),
        };
        self.with(kind, message)
    }

    /// Value must be present.
    #[must_use]
    pub fn nonempty(self, message: impl Into<String>) -> Self {
        self.with(ConstraintKind::Required, message)
    }

    /// Text must match `source`.
    pub fn regex(mut self, source: &str, message: impl Into<String>) -> AppResult<Self> {
        self.constraints.push(Constraint::pattern(source, message)?);
        Ok(self)
    }

    /// Text must be an email address.
    #[must_use]
    pub fn email(self, message: impl Into<String>) -> Self {
        self.with(ConstraintKind::Email, message)
    }

    /// Message reported when the input has the wrong shape.
    #[must_use]
    pub fn type_message(mut self, message: impl Into<String>) -> Self {
        self.type_message = Some(message.into());
        self
    }

    /// Custom predicate over this value.
    #[must_use]
    pub fn refine(
        self,
        message: impl Into<String>,
        predicate: impl Fn(&FieldValue) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.with(ConstraintKind::Custom(Arc::new(predicate)), message)
    }

    /// Whole-object predicate whose failure is reported at `target`.
    ///
    /// Paths are relative to this object. The predicate receives the whole
    /// form value.
    pub fn refine_at(
        mut self,
        target: &str,
        depends_on: &[&str],
        message: impl Into<String>,
        predicate: impl Fn(&FieldValue) -> bool + Send + Sync + 'static,
    ) -> AppResult<Self> {
        if !matches!(self.node, SchemaNode::Object(_)) {
            return Err(AppError::Validation(
                "refine_at is only available on object schemas".to_owned(),
            ));
        }

        let depends_on = depends_on
            .iter()
            .map(|path| FieldPath::parse(path))
            .collect::<AppResult<Vec<_>>>()?;
        self.refinements.push(PendingRefinement {
            target: FieldPath::parse(target)?,
            depends_on,
            message: message.into(),
            predicate: Arc::new(predicate),
        });
        Ok(self)
    }

    /// Compiles the schema into the unified rule representation.
    pub fn compile(&self) -> AppResult<RuleSet> {
        if !matches!(self.node, SchemaNode::Object(_)) {
            return Err(AppError::Validation(
                "form schemas must be objects".to_owned(),
            ));
        }

        let mut rules = Vec::new();
        let mut refinements = Vec::new();
        self.collect(&FieldPath::root(), &mut rules, &mut refinements);
        RuleSet::new(rules, refinements)
    }

    fn collect(
        &self,
        path: &FieldPath,
        rules: &mut Vec<FieldRule>,
        refinements: &mut Vec<Refinement>,
    ) {
        if !path.is_root() {
            let mut rule = FieldRule::new(path.clone(), self.kind);
            if let Some(message) = &self.type_message {
                rule.set_type_message(message.clone());
            }
            for constraint in &self.constraints {
                rule.push(constraint.clone());
            }
            rules.push(rule);
        }

        match &self.node {
            SchemaNode::Scalar => {}
            SchemaNode::Array(item) => item.collect(&path.wildcard(), rules, refinements),
            SchemaNode::Object(members) => {
                for (key, member) in members {
                    member.collect(&path.key(key.as_str()), rules, refinements);
                }
            }
        }

        for pending in &self.refinements {
            let target = join(path, &pending.target);
            let depends_on = pending
                .depends_on
                .iter()
                .map(|dependency| join(path, dependency))
                .collect();
            refinements.push(Refinement::new(
                target,
                depends_on,
                pending.message.clone(),
                pending.predicate.clone(),
            ));
        }
    }
}

fn join(base: &FieldPath, relative: &FieldPath) -> FieldPath {
    relative
        .segments()
        .iter()
        .fold(base.clone(), |path, segment| match segment {
            crate::PathSegment::Key(key) => path.key(key.as_str()),
            crate::PathSegment::Index(index) => path.index(*index),
            crate::PathSegment::Wildcard => path.wildcard(),
        })
}
