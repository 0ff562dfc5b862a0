use std::fmt::{Display, Formatter};

use formwright_core::{AppError, AppResult};
use formwright_domain::{ErrorMap, FieldPath, FieldValue};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::FieldRegistry;
use crate::field_registry::move_remap;

/// Stable identity of one field array entry. It never changes when other
/// entries are added, removed or moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Creates a random entry identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for EntryId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(formatter)
    }
}

/// One entry of a field array with its current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldArrayEntry {
    /// Stable identity.
    pub id: EntryId,
    /// Current list position.
    pub index: usize,
}

/// Ordered, resizable list of repeated sub-groups bound to one list path.
///
/// Values live in the [`FieldRegistry`]; this type keeps the identity of
/// each position and keeps values, touched/dirty flags and errors aligned
/// when positions shift.
#[derive(Debug, Clone)]
pub struct FieldArray {
    path: FieldPath,
    ids: Vec<EntryId>,
    minimum: Option<usize>,
}

impl FieldArray {
    /// Binds a field array to the list at `path` holding `len` items.
    #[must_use]
    pub fn new(path: FieldPath, len: usize, minimum: Option<usize>) -> Self {
        Self {
            path,
            ids: (0..len).map(|_| EntryId::new()).collect(),
            minimum,
        }
    }

    /// Returns the list path.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Returns the minimum entry count enforced on removal.
    #[must_use]
    pub fn minimum(&self) -> Option<usize> {
        self.minimum
    }

    /// Returns entries in list order.
    #[must_use]
    pub fn list(&self) -> Vec<FieldArrayEntry> {
        self.ids
            .iter()
            .enumerate()
            .map(|(index, id)| FieldArrayEntry { id: *id, index })
            .collect()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns whether the array has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the current position of `id`.
    #[must_use]
    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.ids.iter().position(|candidate| *candidate == id)
    }

    fn require_position(&self, id: EntryId) -> AppResult<usize> {
        self.position(id).ok_or_else(|| {
            AppError::NotFound(format!("entry '{id}' not found in field array '{}'", self.path))
        })
    }

    /// Re-aligns entry identities with the registry after the list was
    /// written directly. Surviving positions keep their identity; state of
    /// positions past the new length is dropped. Returns whether the length
    /// changed.
    pub fn sync_len(&mut self, registry: &mut FieldRegistry, errors: &mut ErrorMap) -> bool {
        let len = registry.list_len(&self.path).unwrap_or(0);
        let previous = self.ids.len();
        if len == previous {
            return false;
        }

        for index in len.min(previous)..len.max(previous) {
            errors.remove_prefix(&self.path.index(index));
        }
        if len < previous {
            registry.forget_list_items_from(&self.path, len);
            self.ids.truncate(len);
        } else {
            self.ids.extend((previous..len).map(|_| EntryId::new()));
        }

        debug!(path = %self.path, previous, len, "field array resynchronised");
        true
    }

    /// Appends `entry` and returns its identity.
    pub fn append(
        &mut self,
        registry: &mut FieldRegistry,
        errors: &mut ErrorMap,
        entry: FieldValue,
    ) -> AppResult<EntryId> {
        let index = registry.push_list_item(&self.path, entry)?;
        errors.remove_prefix(&self.path.index(index));

        let id = EntryId::new();
        self.ids.push(id);
        debug!(path = %self.path, index, entry = %id, "field array entry appended");
        Ok(id)
    }

    /// Removes the entry `id` and returns its value.
    ///
    /// Fails with [`AppError::MinimumCountViolation`] when removal would leave
    /// fewer entries than the declared minimum.
    pub fn remove(
        &mut self,
        registry: &mut FieldRegistry,
        errors: &mut ErrorMap,
        id: EntryId,
    ) -> AppResult<FieldValue> {
        let index = self.require_position(id)?;
        if let Some(minimum) = self.minimum {
            if self.ids.len() <= minimum {
                return Err(AppError::MinimumCountViolation {
                    path: self.path.to_string(),
                    minimum,
                });
            }
        }

        let removed = registry.remove_list_item(&self.path, index)?;
        errors.remove_list_item(&self.path, index);
        self.ids.remove(index);
        debug!(path = %self.path, index, entry = %id, "field array entry removed");
        Ok(removed)
    }

    /// Moves the entry `id` to position `to`.
    pub fn move_entry(
        &mut self,
        registry: &mut FieldRegistry,
        errors: &mut ErrorMap,
        id: EntryId,
        to: usize,
    ) -> AppResult<()> {
        let from = self.require_position(id)?;
        if to >= self.ids.len() {
            return Err(AppError::NotFound(format!(
                "field array '{}' has no position {to}",
                self.path
            )));
        }
        if from == to {
            return Ok(());
        }

        registry.move_list_item(&self.path, from, to)?;
        errors.reindex_list(&self.path, move_remap(from, to));
        let moved = self.ids.remove(from);
        self.ids.insert(to, moved);
        debug!(path = %self.path, from, to, entry = %id, "field array entry moved");
        Ok(())
    }

    /// Exchanges the positions of two entries.
    pub fn swap(
        &mut self,
        registry: &mut FieldRegistry,
        errors: &mut ErrorMap,
        first: EntryId,
        second: EntryId,
    ) -> AppResult<()> {
        let first_index = self.require_position(first)?;
        let second_index = self.require_position(second)?;
        let (low, high) = if first_index <= second_index {
            (first_index, second_index)
        } else {
            (second_index, first_index)
        };
        if low == high {
            return Ok(());
        }

        let low_id = self.ids[low];
        let high_id = self.ids[high];
        self.move_entry(registry, errors, low_id, high)?;
        self.move_entry(registry, errors, high_id, low)
    }
}
