use super::*;

impl FormController {
    /// Stores a new value for `path` and re-validates per the active mode.
    ///
    /// Returns `false` when a permissive registry ignored an unknown path.
    pub async fn change(&self, path: &str, value: impl Into<FieldValue>) -> AppResult<bool> {
        let path = FieldPath::parse(path)?;
        let mut state = self.state.lock().await;
        if !state.registry.set_value(&path, value.into())? {
            return Ok(false);
        }

        let before = state.errors.clone();
        state.sync_arrays(&path);
        let validate = self.options.validates_on_change(
            state.submission.is_submitted(),
            state.registry.is_blurred(&path),
        );
        if validate {
            self.revalidate_pending(&mut state);
        }
        self.observe_dependencies(&mut state, &path);
        if validate {
            self.revalidate(&mut state, &path, false);
        }

        self.emit(FormEvent::ValueChanged { path });
        self.emit_errors_if_changed(&before, &state);
        Ok(true)
    }

    /// Marks `path` touched and re-validates per the active mode.
    pub async fn blur(&self, path: &str) -> AppResult<bool> {
        let path = FieldPath::parse(path)?;
        let mut state = self.state.lock().await;
        if !state.registry.mark_blurred(&path)? {
            return Ok(false);
        }

        if !self
            .options
            .validates_on_blur(state.submission.is_submitted())
        {
            return Ok(true);
        }

        let before = state.errors.clone();
        self.revalidate_pending(&mut state);
        self.revalidate(&mut state, &path, false);
        self.emit_errors_if_changed(&before, &state);
        Ok(true)
    }

    /// Validates on demand, regardless of mode.
    ///
    /// With a path, only that field (and its descendants and refinements
    /// reading it) is validated; without one, the whole form is. Returns
    /// whether the validated scope is free of errors.
    pub async fn trigger(&self, path: Option<&str>) -> AppResult<bool> {
        let path = path.map(FieldPath::parse).transpose()?;
        let snapshot = match &path {
            Some(_) => None,
            None => Some(self.state.lock().await.registry.values().clone()),
        };
        let full = match &snapshot {
            Some(values) => Some(self.engine.validate_with_async_checks(values).await),
            None => None,
        };

        let mut state = self.state.lock().await;
        let before = state.errors.clone();
        let valid = match (path, full) {
            (Some(path), _) => {
                self.revalidate_pending(&mut state);
                self.revalidate(&mut state, &path, true);
                !state
                    .errors
                    .iter()
                    .any(|(error_path, _)| error_path.starts_with(&path))
            }
            (None, full) => {
                let mut errors = full.unwrap_or_default();
                for dependent in &mut state.dependents {
                    dependent.filter_errors(&mut errors);
                    dependent.take_pending_revalidation();
                }
                let valid = errors.is_empty();
                if let Some(root) = state.errors.root().cloned() {
                    errors.set_root(root);
                }
                state.errors = errors;
                valid
            }
        };

        debug!(form = %self.definition.name(), valid, "validation triggered");
        self.emit_errors_if_changed(&before, &state);
        Ok(valid)
    }

    /// Restores defaults (replacing them when `defaults` is given) and clears
    /// touched, dirty, error and submission state.
    pub async fn reset(&self, defaults: Option<FieldValue>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.submission.reset()?;
        state.registry.reset(defaults)?;
        state.errors = ErrorMap::new();
        state.bind_structure(&self.definition);

        info!(form = %self.definition.name(), "form reset");
        self.emit(FormEvent::Reset);
        Ok(())
    }
}
