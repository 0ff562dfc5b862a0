use super::*;

impl FormController {
    /// Returns the entries of the field array at `path` in list order.
    pub async fn entries(&self, path: &str) -> AppResult<Vec<FieldArrayEntry>> {
        let path = FieldPath::parse(path)?;
        let mut state = self.state.lock().await;
        Ok(state.array_mut(&path)?.list())
    }

    /// Appends `entry` to the field array at `path`.
    pub async fn append(&self, path: &str, entry: impl Into<FieldValue>) -> AppResult<EntryId> {
        let path = FieldPath::parse(path)?;
        self.mutate_array(&path, |array, registry, errors| {
            array.append(registry, errors, entry.into())
        })
        .await
    }

    /// Removes entry `id` from the field array at `path` and returns its value.
    pub async fn remove(&self, path: &str, id: EntryId) -> AppResult<FieldValue> {
        let path = FieldPath::parse(path)?;
        self.mutate_array(&path, |array, registry, errors| {
            array.remove(registry, errors, id)
        })
        .await
    }

    /// Moves entry `id` of the field array at `path` to position `to`.
    pub async fn move_entry(&self, path: &str, id: EntryId, to: usize) -> AppResult<()> {
        let path = FieldPath::parse(path)?;
        self.mutate_array(&path, |array, registry, errors| {
            array.move_entry(registry, errors, id, to)
        })
        .await
    }

    /// Exchanges two entries of the field array at `path`.
    pub async fn swap(&self, path: &str, first: EntryId, second: EntryId) -> AppResult<()> {
        let path = FieldPath::parse(path)?;
        self.mutate_array(&path, |array, registry, errors| {
            array.swap(registry, errors, first, second)
        })
        .await
    }

    async fn mutate_array<T>(
        &self,
        path: &FieldPath,
        operation: impl FnOnce(&mut FieldArray, &mut FieldRegistry, &mut ErrorMap) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut state = self.state.lock().await;
        let before = state.errors.clone();

        let FormState {
            registry,
            errors,
            arrays,
            ..
        } = &mut *state;
        let array = arrays
            .get_mut(path)
            .ok_or_else(|| AppError::NotFound(format!("field array '{path}' is not declared")))?;
        let output = operation(array, registry, errors).inspect_err(|error| {
            warn!(form = %self.definition.name(), path = %path, error = %error, "field array update rejected");
        })?;

        if self.options.validates_on_change(
            state.submission.is_submitted(),
            state.registry.is_blurred(path),
        ) {
            self.revalidate_list(&mut state, path);
        }

        self.emit(FormEvent::ValueChanged { path: path.clone() });
        self.emit_errors_if_changed(&before, &state);
        Ok(output)
    }

    /// Re-checks the list-level rule only; entry fields keep their state.
    fn revalidate_list(&self, state: &mut FormState, path: &FieldPath) {
        let outcome = self
            .engine
            .validate_field(state.registry.values(), path, &state.errors);
        if let Some((list_path, error)) = outcome
            .field_updates
            .into_iter()
            .find(|(update_path, _)| update_path == path)
        {
            state.errors.set(list_path, error);
        }
    }
}
