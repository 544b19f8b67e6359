//! Per-table merge algorithms.
//!
//! Every function here assumes its preconditions were checked by the
//! caller and cannot fail.

use std::collections::{HashMap, HashSet};

use deltaset_common::types::Value;
use tracing::trace;

use super::key::RowKey;
use super::result::MergeResult;
use crate::model::{Row, RowState, Table};

/// How the columns of a current table line up with a refreshed one.
///
/// The current schema is authoritative: refreshed-only columns are never
/// copied, and current-only columns fall back to their default on every row
/// a refreshed row touches.
struct ColumnMap {
    /// Current name, refreshed name.
    shared: Vec<(String, String)>,
    /// Current-only column and its default.
    current_only: Vec<(String, Value)>,
}

impl ColumnMap {
    fn new(current: &Table, refreshed: &Table) -> Self {
        let mut shared = Vec::new();
        let mut current_only = Vec::new();
        for column in current.columns() {
            match refreshed.column(&column.name) {
                Some(other) => shared.push((column.name.clone(), other.name.clone())),
                None => current_only.push((column.name.clone(), column.default_or_null())),
            }
        }
        Self {
            shared,
            current_only,
        }
    }

    /// Copies refreshed values onto `row` and returns true if any value
    /// changed. A shared column the source does not hold keeps its value.
    fn apply(&self, row: &mut Row, source: &Row) -> bool {
        let mut changed = false;
        for (current, refreshed) in &self.shared {
            if let Some(value) = source.get(refreshed) {
                if row.get(current) != Some(value) {
                    row.put_raw(current, value.clone());
                    changed = true;
                }
            }
        }
        for (column, default) in &self.current_only {
            if row.is_partial() && !row.contains(column) {
                continue;
            }
            if row.get(column) != Some(default) {
                row.put_raw(column, default.clone());
                changed = true;
            }
        }
        changed
    }
}

/// Discards every current row and loads every refreshed row in its place.
pub(crate) fn replace(current: &mut Table, refreshed: &Table, result: &mut MergeResult) {
    let name = current.name().to_string();
    current.clear();
    for source in refreshed.iter() {
        let row = current.conform(source);
        result.record_added(&name, current.push_loaded(row));
    }
}

/// Reconciles current rows with refreshed rows by primary key.
///
/// Matched rows are updated in place, unmatched current rows are removed,
/// and unmatched refreshed rows are appended in refreshed order. With
/// `preserve` set, rows holding local changes are left untouched and still
/// claim their refreshed counterpart. A table without a primary key has
/// nothing to match on, so every clean row is replaced. Refreshed rows in
/// the Deleted state are never loaded.
pub(crate) fn refresh(
    current: &mut Table,
    refreshed: &Table,
    preserve: bool,
    result: &mut MergeResult,
) {
    let name = current.name().to_string();
    let columns = ColumnMap::new(current, refreshed);
    let key_columns = current.primary_key().to_vec();

    let mut lookup: HashMap<RowKey, usize> = HashMap::new();
    let mut pending = vec![true; refreshed.len()];
    for (i, row) in refreshed.iter().enumerate() {
        if row.state() == RowState::Deleted {
            pending[i] = false;
            continue;
        }
        let Some(key) = RowKey::of(row, &key_columns) else {
            continue;
        };
        if lookup.contains_key(&key) {
            trace!("Ignoring duplicate refreshed key {} in '{}'", key, name);
            pending[i] = false;
        } else {
            lookup.insert(key, i);
        }
    }

    let rows = std::mem::take(current.rows_vec_mut());
    let mut kept = Vec::with_capacity(rows.len());
    for mut row in rows {
        let matched = RowKey::of(&row, &key_columns)
            .and_then(|key| lookup.get(&key).copied())
            .filter(|&i| pending[i]);

        if preserve && row.has_changes() {
            if let Some(i) = matched {
                pending[i] = false;
            }
            trace!("Keeping row {} with local changes in '{}'", row.id(), name);
            kept.push(row);
            continue;
        }

        match matched {
            Some(i) => {
                pending[i] = false;
                if columns.apply(&mut row, &refreshed.rows()[i]) {
                    result.record_updated(&name, &row);
                }
                kept.push(row);
            }
            None => {
                trace!("Removing row {} from '{}'", row.id(), name);
                result.record_deleted(&name, &row);
            }
        }
    }
    *current.rows_vec_mut() = kept;

    for (source, _) in refreshed.iter().zip(&pending).filter(|(_, pending)| **pending) {
        let row = current.conform(source);
        result.record_added(&name, current.push_loaded(row));
    }
}

/// Applies a save acknowledgement.
///
/// Each refreshed row is matched to a current row by primary key, then by
/// the correlation column (for rows whose key the backing store assigned).
/// Matched rows take the refreshed values and become Unchanged, with the
/// key write-once rule bypassed. A match where either side is Deleted
/// commits the delete: the current row is removed. Unmatched refreshed rows
/// are appended unless Deleted; unmatched current rows are left alone.
/// Without any usable key this falls back to [`refresh`] with local changes
/// preserved.
pub(crate) fn post_save(
    current: &mut Table,
    refreshed: &Table,
    correlation: Option<&str>,
    result: &mut MergeResult,
) {
    let key_columns = current.primary_key().to_vec();
    let correlation: Vec<String> = correlation
        .filter(|c| refreshed.has_column(c))
        .and_then(|c| current.column(c))
        .map(|c| vec![c.name.clone()])
        .unwrap_or_default();
    if key_columns.is_empty() && correlation.is_empty() {
        refresh(current, refreshed, true, result);
        return;
    }

    let name = current.name().to_string();
    let columns = ColumnMap::new(current, refreshed);
    let by_key = index(current, &key_columns);
    let by_correlation = index(current, &correlation);
    let mut claimed = vec![false; current.len()];
    let mut seen_keys: HashSet<RowKey> = HashSet::new();
    let mut seen_correlations: HashSet<RowKey> = HashSet::new();
    let mut removed: Vec<usize> = Vec::new();

    for source in refreshed.iter() {
        let key = RowKey::of(source, &key_columns);
        let correlation_key = RowKey::of(source, &correlation);
        let first = match (&key, &correlation_key) {
            (Some(key), _) => seen_keys.insert(key.clone()),
            (None, Some(correlation_key)) => seen_correlations.insert(correlation_key.clone()),
            (None, None) => true,
        };
        if !first {
            trace!("Ignoring duplicate acknowledgement row in '{}'", name);
            continue;
        }

        let target = key
            .as_ref()
            .and_then(|k| first_unclaimed(&by_key, k, &claimed))
            .or_else(|| {
                correlation_key
                    .as_ref()
                    .and_then(|k| first_unclaimed(&by_correlation, k, &claimed))
            });

        match target {
            Some(i)
                if source.state() == RowState::Deleted
                    || current.rows()[i].state() == RowState::Deleted =>
            {
                claimed[i] = true;
                removed.push(i);
            }
            Some(i) => {
                claimed[i] = true;
                let row = &mut current.rows_vec_mut()[i];
                let was_clean = row.state() == RowState::Unchanged;
                let changed = columns.apply(row, source);
                row.mark_clean();
                if changed || !was_clean {
                    result.record_updated(&name, row);
                }
            }
            None if source.state() == RowState::Deleted => {
                trace!("Ignoring acknowledged delete with no local row in '{}'", name);
            }
            None => {
                let row = current.conform(source);
                result.record_added(&name, current.push_loaded(row));
            }
        }
    }

    removed.sort_unstable();
    for &i in &removed {
        result.record_deleted(&name, &current.rows()[i]);
    }
    let rows = current.rows_vec_mut();
    for &i in removed.iter().rev() {
        rows.remove(i);
    }
}

/// Copies a table that only exists in the refreshed set.
pub(crate) fn adopt(refreshed: &Table, result: &mut MergeResult) -> Table {
    let mut table = refreshed.clone_schema();
    let name = table.name().to_string();
    for source in refreshed.iter() {
        let row = table.conform(source);
        result.record_added(&name, table.push_loaded(row));
    }
    table
}

fn index(table: &Table, columns: &[String]) -> HashMap<RowKey, Vec<usize>> {
    let mut index: HashMap<RowKey, Vec<usize>> = HashMap::new();
    for (i, row) in table.iter().enumerate() {
        if let Some(key) = RowKey::of(row, columns) {
            index.entry(key).or_default().push(i);
        }
    }
    index
}

fn first_unclaimed(
    index: &HashMap<RowKey, Vec<usize>>,
    key: &RowKey,
    claimed: &[bool],
) -> Option<usize> {
    index.get(key)?.iter().copied().find(|&i| !claimed[i])
}
