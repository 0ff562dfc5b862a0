use std::collections::{BTreeMap, BTreeSet};

use formwright_core::{AppError, AppResult};
use formwright_domain::{FieldPath, FieldValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the registry treats writes to paths it does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryMode {
    /// Unknown paths are ignored.
    #[default]
    Permissive,
    /// Unknown paths fail with `AppError::UnknownField`.
    Strict,
}

/// Current values plus touched/dirty bookkeeping for one form instance.
///
/// A path is known when a value exists at it; the defaults define the
/// initial shape.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    values: FieldValue,
    defaults: FieldValue,
    touched: BTreeSet<FieldPath>,
    dirty: BTreeSet<FieldPath>,
    blurred: BTreeSet<FieldPath>,
    mode: RegistryMode,
}

impl FieldRegistry {
    /// Creates a registry holding `defaults`.
    #[must_use]
    pub fn new(defaults: FieldValue, mode: RegistryMode) -> Self {
        Self {
            values: defaults.clone(),
            defaults,
            touched: BTreeSet::new(),
            dirty: BTreeSet::new(),
            blurred: BTreeSet::new(),
            mode,
        }
    }

    /// Returns the registry mode.
    #[must_use]
    pub fn mode(&self) -> RegistryMode {
        self.mode
    }

    fn ensure_known(&self, path: &FieldPath) -> AppResult<bool> {
        if !path.is_root() && self.values.get(path).is_some() {
            return Ok(true);
        }

        match self.mode {
            RegistryMode::Permissive => {
                debug!(path = %path, "ignoring write to unknown field");
                Ok(false)
            }
            RegistryMode::Strict => Err(AppError::UnknownField(path.to_string())),
        }
    }

    /// Stores a value and marks the field touched and, when it differs from
    /// its default, dirty.
    ///
    /// Returns `false` when a permissive registry ignored an unknown path.
    pub fn set_value(&mut self, path: &FieldPath, value: FieldValue) -> AppResult<bool> {
        if !self.ensure_known(path)? {
            return Ok(false);
        }

        let differs_from_default = self.defaults.get(path) != Some(&value);
        self.values.set(path, value)?;
        self.touched.insert(path.clone());
        if differs_from_default {
            self.dirty.insert(path.clone());
        } else {
            self.dirty.remove(path);
        }

        Ok(true)
    }

    /// Records a blur: marks the field touched and blurred without changing
    /// its value.
    pub fn mark_blurred(&mut self, path: &FieldPath) -> AppResult<bool> {
        if !self.ensure_known(path)? {
            return Ok(false);
        }

        self.touched.insert(path.clone());
        self.blurred.insert(path.clone());
        Ok(true)
    }

    /// Returns the current value at `path`.
    #[must_use]
    pub fn get_value(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.values.get(path)
    }

    /// Returns the whole form value.
    #[must_use]
    pub fn values(&self) -> &FieldValue {
        &self.values
    }

    /// Returns the defaults the registry resets to.
    #[must_use]
    pub fn defaults(&self) -> &FieldValue {
        &self.defaults
    }

    /// Returns current leaf values keyed by path.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<FieldPath, FieldValue> {
        self.values.leaves()
    }

    /// Returns whether the field or one of its descendants was touched.
    #[must_use]
    pub fn is_touched(&self, path: &FieldPath) -> bool {
        self.touched.iter().any(|touched| touched.starts_with(path))
    }

    /// Returns whether the field itself lost focus at least once.
    #[must_use]
    pub fn is_blurred(&self, path: &FieldPath) -> bool {
        self.blurred.contains(path)
    }

    /// Returns whether the field or one of its descendants is dirty.
    #[must_use]
    pub fn is_dirty(&self, path: &FieldPath) -> bool {
        self.dirty.iter().any(|dirty| dirty.starts_with(path))
    }

    /// Returns whether any value differs from the defaults.
    #[must_use]
    pub fn is_form_dirty(&self) -> bool {
        self.values != self.defaults
    }

    /// Returns touched paths.
    #[must_use]
    pub fn touched(&self) -> &BTreeSet<FieldPath> {
        &self.touched
    }

    /// Returns dirty paths.
    #[must_use]
    pub fn dirty(&self) -> &BTreeSet<FieldPath> {
        &self.dirty
    }

    /// Restores defaults and clears touched/dirty state. When `defaults` is
    /// given it replaces the stored defaults first.
    pub fn reset(&mut self, defaults: Option<FieldValue>) -> AppResult<()> {
        if let Some(defaults) = defaults {
            if !matches!(defaults, FieldValue::Group(_)) {
                return Err(AppError::Validation(
                    "form defaults must be a group of named fields".to_owned(),
                ));
            }
            self.defaults = defaults;
        }

        self.values = self.defaults.clone();
        self.touched.clear();
        self.dirty.clear();
        self.blurred.clear();
        Ok(())
    }

    fn list_mut(&mut self, list_path: &FieldPath) -> AppResult<&mut Vec<FieldValue>> {
        match self.values.get_mut(list_path) {
            Some(FieldValue::List(items)) => Ok(items),
            Some(_) => Err(AppError::Validation(format!(
                "field '{list_path}' is not a list"
            ))),
            None => Err(AppError::UnknownField(list_path.to_string())),
        }
    }

    /// Returns the number of items in the list at `list_path`.
    #[must_use]
    pub fn list_len(&self, list_path: &FieldPath) -> Option<usize> {
        self.values
            .get(list_path)
            .and_then(FieldValue::as_list)
            .map(<[FieldValue]>::len)
    }

    /// Appends an item and returns its index.
    pub fn push_list_item(&mut self, list_path: &FieldPath, item: FieldValue) -> AppResult<usize> {
        let items = self.list_mut(list_path)?;
        items.push(item);
        let index = items.len() - 1;
        self.dirty.insert(list_path.clone());
        Ok(index)
    }

    /// Removes the item at `index`; later items shift down by one.
    pub fn remove_list_item(&mut self, list_path: &FieldPath, index: usize) -> AppResult<FieldValue> {
        let items = self.list_mut(list_path)?;
        if index >= items.len() {
            return Err(AppError::NotFound(format!(
                "no item {index} in field array '{list_path}'"
            )));
        }

        let removed = items.remove(index);
        let remap = |position: usize| match position {
            position if position == index => None,
            position if position > index => Some(position - 1),
            position => Some(position),
        };
        self.reindex_flags(list_path, remap);
        self.dirty.insert(list_path.clone());
        Ok(removed)
    }

    /// Moves the item at `from` to position `to`, shifting the items in between.
    pub fn move_list_item(&mut self, list_path: &FieldPath, from: usize, to: usize) -> AppResult<()> {
        let items = self.list_mut(list_path)?;
        if from >= items.len() || to >= items.len() {
            return Err(AppError::NotFound(format!(
                "field array '{list_path}' has no position {}",
                from.max(to)
            )));
        }

        let item = items.remove(from);
        items.insert(to, item);
        self.reindex_flags(list_path, move_remap(from, to));
        self.dirty.insert(list_path.clone());
        Ok(())
    }

    /// Drops touched, dirty and blurred flags of list items at `len` and beyond.
    pub fn forget_list_items_from(&mut self, list_path: &FieldPath, len: usize) {
        self.reindex_flags(list_path, |index| (index < len).then_some(index));
    }

    fn reindex_flags(
        &mut self,
        list_path: &FieldPath,
        remap: impl Fn(usize) -> Option<usize> + Copy,
    ) {
        reindex_paths(&mut self.touched, list_path, remap);
        reindex_paths(&mut self.dirty, list_path, remap);
        reindex_paths(&mut self.blurred, list_path, remap);
    }
}

/// Position mapping produced by moving one list item from `from` to `to`.
pub(crate) fn move_remap(from: usize, to: usize) -> impl Fn(usize) -> Option<usize> + Copy {
    move |position| {
        Some(if position == from {
            to
        } else if from < to && position > from && position <= to {
            position - 1
        } else if to < from && position >= to && position < from {
            position + 1
        } else {
            position
        })
    }
}

fn reindex_paths(
    paths: &mut BTreeSet<FieldPath>,
    list_path: &FieldPath,
    remap: impl Fn(usize) -> Option<usize>,
) {
    let current = std::mem::take(paths);
    for path in current {
        match path.index_under(list_path) {
            Some(index) => {
                if let Some(next) = remap(index) {
                    paths.insert(path.with_index_under(list_path, next));
                }
            }
            None => {
                paths.insert(path);
            }
        }
    }
}
