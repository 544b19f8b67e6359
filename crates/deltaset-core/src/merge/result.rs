//! Merge result accumulator.

use indexmap::IndexMap;

use crate::model::Row;

/// Rows added, updated, and deleted by one or more merges, grouped by table.
///
/// Entries are snapshots of the affected rows taken when the merge touched
/// them; their [`RowId`](deltaset_common::types::RowId)s identify the live
/// rows in the merged set. Merges append to the accumulator and never
/// clear it.
#[derive(Debug, Clone, Default)]
pub struct MergeResult {
    added: IndexMap<String, Vec<Row>>,
    updated: IndexMap<String, Vec<Row>>,
    deleted: IndexMap<String, Vec<Row>>,
}

impl MergeResult {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows added, by table.
    pub fn added(&self) -> &IndexMap<String, Vec<Row>> {
        &self.added
    }

    /// Rows updated, by table.
    pub fn updated(&self) -> &IndexMap<String, Vec<Row>> {
        &self.updated
    }

    /// Rows deleted, by table.
    pub fn deleted(&self) -> &IndexMap<String, Vec<Row>> {
        &self.deleted
    }

    /// Rows added to one table.
    pub fn added_in(&self, table: &str) -> &[Row] {
        self.added.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    /// Rows updated in one table.
    pub fn updated_in(&self, table: &str) -> &[Row] {
        self.updated.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    /// Rows deleted from one table.
    pub fn deleted_in(&self, table: &str) -> &[Row] {
        self.deleted.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of added rows.
    pub fn added_count(&self) -> usize {
        self.added.values().map(Vec::len).sum()
    }

    /// Total number of updated rows.
    pub fn updated_count(&self) -> usize {
        self.updated.values().map(Vec::len).sum()
    }

    /// Total number of deleted rows.
    pub fn deleted_count(&self) -> usize {
        self.deleted.values().map(Vec::len).sum()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.added.clear();
        self.updated.clear();
        self.deleted.clear();
    }

    pub(crate) fn record_added(&mut self, table: &str, row: &Row) {
        push(&mut self.added, table, row);
    }

    pub(crate) fn record_updated(&mut self, table: &str, row: &Row) {
        push(&mut self.updated, table, row);
    }

    pub(crate) fn record_deleted(&mut self, table: &str, row: &Row) {
        push(&mut self.deleted, table, row);
    }
}

fn push(map: &mut IndexMap<String, Vec<Row>>, table: &str, row: &Row) {
    match map.get_mut(table) {
        Some(rows) => rows.push(row.clone()),
        None => {
            map.insert(table.to_string(), vec![row.clone()]);
        }
    }
}
