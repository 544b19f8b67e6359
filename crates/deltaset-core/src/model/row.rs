//! Change-tracking rows.
//!
//! A `Row` owns a column-name to value map, a lifecycle [`RowState`], and a
//! lazily captured baseline snapshot of the values as of the last load or
//! accept. The baseline is created on the first divergent write and is only
//! ever replaced or discarded wholesale.
//!
//! # Lifecycle
//!
//! ```text
//!            add_row            accept / load_row
//! Detached ---------> Added ---------------------+
//!     |                                          v
//!     +-------------- load_row ------------> Unchanged <----+
//!                                             |   ^         |
//!                                     write   |   | reject  | accept / reject
//!                                             v   |         |
//!                                           Modified -------+
//!                                             |
//!                          delete (Unchanged/Modified)
//!                                             v
//!                                           Deleted --- reject ---> Unchanged
//! ```
//!
//! Rows hold no reference to their table. Operations that need the table
//! (removing an Added row, committing a Deleted one) live on
//! [`Table`](super::Table).

use std::fmt;

use deltaset_common::error::{DataSetError, DataSetResult};
use deltaset_common::types::{RowId, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered column-name to value map.
pub type ValueMap = IndexMap<String, Value>;

/// Lifecycle state of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowState {
    /// Not owned by any table.
    Detached,
    /// Added by the client; not yet known to the backing store.
    Added,
    /// Loaded and then changed.
    Modified,
    /// Matches the backing store as far as the client knows.
    Unchanged,
    /// Marked for deletion; still present in its table.
    Deleted,
}

impl RowState {
    /// Returns true for Added, Modified, and Deleted.
    pub fn is_pending(self) -> bool {
        matches!(self, RowState::Added | RowState::Modified | RowState::Deleted)
    }
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Whether a row carries every declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowShape {
    /// Created from a schema; holds a value (possibly null) for every column
    /// and rejects writes to unknown columns.
    Full,
    /// Floating row; a missing key means "not supplied", which is distinct
    /// from a key present with a null value.
    Partial,
}

/// A single change-tracking row.
#[derive(Debug, Clone)]
pub struct Row {
    id: RowId,
    values: ValueMap,
    baseline: Option<ValueMap>,
    state: RowState,
    pre_delete_state: Option<RowState>,
    selected: bool,
    primary_key: Vec<String>,
    loaded: bool,
    shape: RowShape,
}

impl Row {
    fn with_values(values: ValueMap, shape: RowShape) -> Self {
        Self {
            id: RowId::next(),
            values,
            baseline: None,
            state: RowState::Detached,
            pre_delete_state: None,
            selected: false,
            primary_key: Vec::new(),
            loaded: false,
            shape,
        }
    }

    /// Creates an empty detached partial row.
    pub fn empty() -> Self {
        Self::with_values(ValueMap::new(), RowShape::Partial)
    }

    /// Creates an empty detached partial row with room for `capacity` columns.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_values(ValueMap::with_capacity(capacity), RowShape::Partial)
    }

    /// Creates a detached full row. Used by tables when building rows from
    /// their schema.
    pub(crate) fn full(values: ValueMap) -> Self {
        Self::with_values(values, RowShape::Full)
    }

    /// Creates a detached partial row holding exactly `values`.
    pub(crate) fn partial(values: ValueMap) -> Self {
        Self::with_values(values, RowShape::Partial)
    }

    /// Rebuilds a row from its wire form. The row gets a fresh id.
    pub(crate) fn from_parts(
        state: RowState,
        values: ValueMap,
        baseline: Option<ValueMap>,
        shape: RowShape,
    ) -> Self {
        let mut row = Self::with_values(values, shape);
        row.state = state;
        row.baseline = baseline;
        row.loaded = !matches!(state, RowState::Added | RowState::Detached);
        if state == RowState::Deleted {
            row.pre_delete_state = Some(if row.baseline.is_some() {
                RowState::Modified
            } else {
                RowState::Unchanged
            });
        }
        row
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the row's identity.
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> RowState {
        self.state
    }

    /// Returns the row shape.
    pub fn shape(&self) -> RowShape {
        self.shape
    }

    /// Returns true for floating rows.
    pub fn is_partial(&self) -> bool {
        self.shape == RowShape::Partial
    }

    /// Returns true if the row was admitted as pre-existing data.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Primary-key column names assigned by the owning table.
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Returns the selection flag.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Sets the selection flag. Selection is not a change.
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Returns true if the row has a pending change.
    pub fn has_changes(&self) -> bool {
        self.state.is_pending()
    }

    /// Returns the current values.
    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    /// Returns the baseline snapshot, if one has been captured.
    pub fn baseline(&self) -> Option<&ValueMap> {
        self.baseline.as_ref()
    }

    /// Returns the value for a column.
    ///
    /// `None` means the column is absent from the row, which is distinct from
    /// `Some(&Value::Null)`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.resolve(column).and_then(|key| self.values.get(key))
    }

    /// Returns the value for a column, failing if it is absent.
    pub fn try_get(&self, column: &str) -> DataSetResult<&Value> {
        self.get(column)
            .ok_or_else(|| DataSetError::column_absent(column))
    }

    /// Returns true if the column is present (possibly null).
    pub fn contains(&self, column: &str) -> bool {
        self.resolve(column).is_some()
    }

    /// Returns the baseline value of a column, or the current value when no
    /// baseline has been captured.
    pub fn original(&self, column: &str) -> Option<&Value> {
        match &self.baseline {
            Some(baseline) => find_key(baseline, column).and_then(|key| baseline.get(key)),
            None => self.get(column),
        }
    }

    /// Columns whose current value differs from the baseline.
    ///
    /// A column present on only one side counts as changed. Rows without a
    /// baseline report nothing.
    pub fn changed_columns(&self) -> Vec<&str> {
        let Some(baseline) = &self.baseline else {
            return Vec::new();
        };
        let mut changed: Vec<&str> = self
            .values
            .iter()
            .filter(|(name, value)| baseline.get(name.as_str()) != Some(*value))
            .map(|(name, _)| name.as_str())
            .collect();
        changed.extend(
            baseline
                .keys()
                .filter(|name| !self.values.contains_key(name.as_str()))
                .map(String::as_str),
        );
        changed
    }

    /// Returns the values of `columns` in order; absent columns read as null.
    pub fn key_values(&self, columns: &[String]) -> Vec<Value> {
        columns
            .iter()
            .map(|c| self.get(c).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Returns true if `column` is one of the assigned primary-key columns.
    pub fn is_key_column(&self, column: &str) -> bool {
        self.primary_key.iter().any(|k| k.eq_ignore_ascii_case(column))
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Writes a value.
    ///
    /// The first write that differs from the current value of an Unchanged
    /// row captures the baseline and moves the row to Modified. A write that
    /// brings a Modified row back to its baseline returns it to Unchanged.
    /// Writes to a Deleted row are silently ignored.
    ///
    /// # Errors
    ///
    /// - not-found if a full row has no such column
    /// - invalid-operation when changing a primary-key column of a loaded,
    ///   non-Added row
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> DataSetResult<()> {
        if self.state == RowState::Deleted {
            return Ok(());
        }
        let value = value.into();
        let key = match self.resolve(column) {
            Some(key) => key.to_string(),
            None if self.shape == RowShape::Partial => column.to_string(),
            None => return Err(DataSetError::column_absent(column)),
        };
        if self.values.get(&key) == Some(&value) {
            return Ok(());
        }
        if self.loaded && self.state != RowState::Added && self.is_key_column(&key) {
            return Err(DataSetError::invalid_operation(format!(
                "primary key column '{}' of a loaded row cannot be changed",
                key
            )));
        }

        match self.state {
            RowState::Unchanged => {
                if self.baseline.is_none() {
                    self.baseline = Some(self.values.clone());
                }
                self.values.insert(key, value);
                self.state = RowState::Modified;
                self.settle();
            }
            RowState::Modified => {
                self.values.insert(key, value);
                self.settle();
            }
            RowState::Detached | RowState::Added => {
                self.values.insert(key, value);
            }
            RowState::Deleted => {}
        }
        Ok(())
    }

    /// Marks the row Deleted.
    ///
    /// # Errors
    ///
    /// Invalid-operation for Added rows (remove them through the owning
    /// table) and for Detached rows. Deleting a Deleted row is a no-op.
    pub fn delete(&mut self) -> DataSetResult<()> {
        match self.state {
            RowState::Added => Err(DataSetError::invalid_operation(
                "an Added row must be deleted through its table",
            )),
            RowState::Detached => Err(DataSetError::invalid_operation(
                "a Detached row cannot be deleted",
            )),
            RowState::Deleted => Ok(()),
            RowState::Unchanged | RowState::Modified => {
                if self.baseline.is_none() {
                    self.baseline = Some(self.values.clone());
                }
                self.pre_delete_state = Some(self.state);
                self.state = RowState::Deleted;
                Ok(())
            }
        }
    }

    /// Reverses a delete, returning the row to its pre-delete state with its
    /// current values intact.
    pub fn undelete(&mut self) -> DataSetResult<()> {
        if self.state != RowState::Deleted {
            return Err(DataSetError::invalid_operation(format!(
                "cannot undelete a {} row",
                self.state
            )));
        }
        self.state = self.pre_delete_state.take().unwrap_or(RowState::Unchanged);
        if self.state == RowState::Unchanged {
            self.baseline = None;
        } else {
            self.settle();
        }
        Ok(())
    }

    /// Commits pending changes: Added and Modified rows become Unchanged and
    /// the baseline is discarded.
    ///
    /// # Errors
    ///
    /// Invalid-operation for Deleted rows (removal is table-level) and for
    /// Detached rows.
    pub fn accept_changes(&mut self) -> DataSetResult<()> {
        match self.state {
            RowState::Deleted => Err(DataSetError::invalid_operation(
                "a Deleted row must be accepted through its table",
            )),
            RowState::Detached => Err(DataSetError::invalid_operation(
                "a Detached row has no changes to accept",
            )),
            RowState::Added | RowState::Modified | RowState::Unchanged => {
                self.mark_clean();
                Ok(())
            }
        }
    }

    /// Rolls back pending changes: Modified and Deleted rows become Unchanged
    /// with their values restored from the baseline.
    ///
    /// # Errors
    ///
    /// Invalid-operation for Added rows (removal is table-level).
    pub fn reject_changes(&mut self) -> DataSetResult<()> {
        match self.state {
            RowState::Added => Err(DataSetError::invalid_operation(
                "an Added row must be rejected through its table",
            )),
            RowState::Detached | RowState::Unchanged => Ok(()),
            RowState::Modified | RowState::Deleted => {
                self.rollback();
                Ok(())
            }
        }
    }

    // =========================================================================
    // Crate-internal hooks for tables, changesets, and merging
    // =========================================================================

    /// Sets the state without any transition checks.
    pub(crate) fn set_state(&mut self, state: RowState) {
        self.state = state;
    }

    /// Replaces the baseline wholesale.
    pub(crate) fn set_baseline(&mut self, baseline: Option<ValueMap>) {
        self.baseline = baseline;
    }

    /// Assigns the owning table's key and admission kind.
    pub(crate) fn assign_primary_key(&mut self, primary_key: Vec<String>, loaded: bool) {
        self.primary_key = primary_key;
        self.loaded = loaded;
    }

    /// Marks the row as committed pre-existing data.
    pub(crate) fn mark_clean(&mut self) {
        self.baseline = None;
        self.pre_delete_state = None;
        self.state = RowState::Unchanged;
        self.loaded = true;
    }

    /// Restores the baseline (if any) and marks the row Unchanged.
    pub(crate) fn rollback(&mut self) {
        if let Some(baseline) = self.baseline.take() {
            self.values = baseline;
        }
        self.state = RowState::Unchanged;
        self.pre_delete_state = None;
    }

    /// Writes a value bypassing state tracking and key protection.
    pub(crate) fn put_raw(&mut self, column: &str, value: Value) {
        let key = self
            .resolve(column)
            .map_or_else(|| column.to_string(), ToString::to_string);
        self.values.insert(key, value);
    }

    fn resolve(&self, column: &str) -> Option<&str> {
        find_key(&self.values, column)
    }

    fn settle(&mut self) {
        if self.state == RowState::Modified && self.baseline.as_ref() == Some(&self.values) {
            self.baseline = None;
            self.state = RowState::Unchanged;
        }
    }
}

/// Finds the stored key for `column`; an exact match wins over a
/// case-insensitive one.
pub(crate) fn find_key<'a>(map: &'a ValueMap, column: &str) -> Option<&'a str> {
    if let Some((key, _)) = map.get_key_value(column) {
        return Some(key.as_str());
    }
    map.keys()
        .find(|k| k.eq_ignore_ascii_case(column))
        .map(String::as_str)
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ") [{}]", self.state)
    }
}
