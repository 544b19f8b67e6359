//! Tables of change-tracking rows.
//!
//! A `Table` exclusively owns an ordered row sequence, its column
//! descriptors, and the primary-key column list it assigns to every admitted
//! row. Insertion order is canonical; nothing in this crate re-sorts rows.

use deltaset_common::error::{DataSetError, DataSetResult};
use deltaset_common::types::{RowId, Value};

use super::column::{position_of, ColumnDescriptor};
use super::row::{Row, RowState, ValueMap};

/// An ordered collection of rows sharing one schema.
#[derive(Debug, Clone)]
pub struct Table {
    /// Table name.
    name: String,
    /// Column descriptors in declaration order.
    columns: Vec<ColumnDescriptor>,
    /// Primary key column names.
    primary_key: Vec<String>,
    /// Rows in insertion order.
    rows: Vec<Row>,
}

impl Table {
    /// Creates an empty table with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Creates an empty table from column descriptors.
    ///
    /// Columns flagged as primary key form the primary key, in declaration
    /// order.
    pub fn with_columns(
        name: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
    ) -> DataSetResult<Self> {
        let mut table = Self::new(name);
        for column in columns {
            table.add_column(column)?;
        }
        Ok(table)
    }

    /// Returns an empty table with a copy of this table's schema.
    pub fn clone_schema(&self) -> Self {
        Self {
            name: self.name.clone(),
            columns: self.columns.clone(),
            primary_key: self.primary_key.clone(),
            rows: Vec::new(),
        }
    }

    // =========================================================================
    // Schema
    // =========================================================================

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column descriptors.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Returns the column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Finds a column by name (case-insensitive).
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        position_of(&self.columns, name).map(|i| &self.columns[i])
    }

    /// Finds a column by name, failing if it does not exist.
    pub fn try_column(&self, name: &str) -> DataSetResult<&ColumnDescriptor> {
        self.column(name)
            .ok_or_else(|| DataSetError::column_not_found(name, &self.name))
    }

    /// Returns true if the table declares the column.
    pub fn has_column(&self, name: &str) -> bool {
        position_of(&self.columns, name).is_some()
    }

    /// Appends a column. Names must be unique ignoring case.
    ///
    /// Existing full rows receive the column's default value. A column
    /// flagged as primary key extends the primary key.
    pub fn add_column(&mut self, column: ColumnDescriptor) -> DataSetResult<()> {
        if self.columns.iter().any(|c| c.matches(&column.name)) {
            return Err(DataSetError::invalid_operation(format!(
                "column '{}' already exists in table '{}'",
                column.name, self.name
            )));
        }
        for row in self.rows.iter_mut().filter(|r| !r.is_partial()) {
            row.put_raw(&column.name, column.default_or_null());
        }
        if column.primary_key {
            self.primary_key.push(column.name.clone());
            self.reassign_primary_key();
        }
        self.columns.push(column);
        Ok(())
    }

    /// Returns the primary key column names.
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Returns true if the table declares a primary key.
    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Declares the primary key. An empty list removes it.
    pub fn set_primary_key(&mut self, columns: &[&str]) -> DataSetResult<()> {
        let mut key = Vec::with_capacity(columns.len());
        for name in columns {
            key.push(self.try_column(name)?.name.clone());
        }
        for column in &mut self.columns {
            column.primary_key = key.contains(&column.name);
            if column.primary_key {
                column.nullable = false;
            }
        }
        self.primary_key = key;
        self.reassign_primary_key();
        Ok(())
    }

    fn reassign_primary_key(&mut self) {
        for row in &mut self.rows {
            let loaded = row.is_loaded();
            row.assign_primary_key(self.primary_key.clone(), loaded);
        }
    }

    // =========================================================================
    // Row access
    // =========================================================================

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the rows in order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns an iterator over the rows.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Returns the row at a position.
    pub fn row(&self, index: usize) -> DataSetResult<&Row> {
        let len = self.rows.len();
        self.rows
            .get(index)
            .ok_or(DataSetError::RowIndexOutOfRange { index, len })
    }

    /// Returns the row at a position for mutation.
    pub fn row_mut(&mut self, index: usize) -> DataSetResult<&mut Row> {
        let len = self.rows.len();
        self.rows
            .get_mut(index)
            .ok_or(DataSetError::RowIndexOutOfRange { index, len })
    }

    /// Finds a row by identity.
    pub fn row_by_id(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id() == id)
    }

    /// Finds a row by identity for mutation.
    pub fn row_by_id_mut(&mut self, id: RowId) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.id() == id)
    }

    /// Returns the position of a row.
    pub fn position_of(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|r| r.id() == id)
    }

    /// Finds the first row whose primary key equals `key`.
    ///
    /// Integer key parts compare across widths.
    pub fn find_by_key(&self, key: &[Value]) -> Option<&Row> {
        if key.len() != self.primary_key.len() || key.is_empty() {
            return None;
        }
        let wanted: Vec<Value> = key.iter().map(Value::key_normalized).collect();
        self.rows.iter().find(|row| {
            row.key_values(&self.primary_key)
                .iter()
                .map(Value::key_normalized)
                .eq(wanted.iter().cloned())
        })
    }

    /// Counts rows in a given state.
    pub fn count_in_state(&self, state: RowState) -> usize {
        self.rows.iter().filter(|r| r.state() == state).count()
    }

    /// Returns true if any row has a pending change.
    pub fn has_changes(&self) -> bool {
        self.rows.iter().any(Row::has_changes)
    }

    // =========================================================================
    // Admission and removal
    // =========================================================================

    /// Creates a detached full row from the schema, holding each column's
    /// default value.
    pub fn new_row(&self) -> Row {
        let values: ValueMap = self
            .columns
            .iter()
            .map(|c| (c.name.clone(), c.default_or_null()))
            .collect();
        Row::full(values)
    }

    /// Admits a client-originated row. A Detached row becomes Added; rows
    /// already in another state keep it. The primary key stays mutable.
    pub fn add_row(&mut self, row: Row) -> DataSetResult<RowId> {
        self.admit(row, false)
    }

    /// Admits a row as pre-existing data. Detached and Added rows become
    /// Unchanged; the primary key becomes write-once.
    pub fn load_row(&mut self, row: Row) -> DataSetResult<RowId> {
        self.admit(row, true)
    }

    fn admit(&mut self, mut row: Row, loaded: bool) -> DataSetResult<RowId> {
        if row.state() == RowState::Deleted {
            return Err(DataSetError::invalid_operation(format!(
                "a Deleted row cannot be admitted to table '{}'",
                self.name
            )));
        }
        if self.position_of(row.id()).is_some() {
            return Err(DataSetError::invalid_operation(format!(
                "row {} already belongs to table '{}'",
                row.id(),
                self.name
            )));
        }

        if loaded {
            if matches!(row.state(), RowState::Detached | RowState::Added) {
                row.mark_clean();
            }
        } else if row.state() == RowState::Detached {
            row.set_state(RowState::Added);
        }
        row.assign_primary_key(self.primary_key.clone(), loaded);

        let id = row.id();
        self.rows.push(row);
        Ok(id)
    }

    /// Removes a row by identity and returns it detached.
    pub fn remove(&mut self, id: RowId) -> DataSetResult<Row> {
        let index = self
            .position_of(id)
            .ok_or_else(|| DataSetError::RowNotFound {
                row_id: id,
                table: self.name.clone(),
            })?;
        self.remove_at(index)
    }

    /// Removes the row at a position and returns it detached.
    pub fn remove_at(&mut self, index: usize) -> DataSetResult<Row> {
        if index >= self.rows.len() {
            return Err(DataSetError::RowIndexOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        let mut row = self.rows.remove(index);
        row.set_state(RowState::Detached);
        Ok(row)
    }

    /// Deletes the row at a position.
    ///
    /// Added rows have never reached the backing store, so they are removed
    /// outright; other rows are marked Deleted.
    pub fn delete_row(&mut self, index: usize) -> DataSetResult<()> {
        if self.row(index)?.state() == RowState::Added {
            self.remove_at(index)?;
            return Ok(());
        }
        self.row_mut(index)?.delete()
    }

    /// Writes a value into the row at a position.
    ///
    /// Unlike [`Row::set`], the column must be declared by the table.
    pub fn set_value(
        &mut self,
        index: usize,
        column: &str,
        value: impl Into<Value>,
    ) -> DataSetResult<()> {
        let name = self.try_column(column)?.name.clone();
        self.row_mut(index)?.set(&name, value)
    }

    /// Removes every row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Commits every pending change: Deleted rows are removed, all other rows
    /// become Unchanged.
    pub fn accept_changes(&mut self) {
        self.rows.retain(|r| r.state() != RowState::Deleted);
        for row in &mut self.rows {
            row.mark_clean();
        }
    }

    /// Rolls back every pending change: Added rows are removed, Modified and
    /// Deleted rows are restored from their baselines.
    pub fn reject_changes(&mut self) {
        self.rows.retain(|r| r.state() != RowState::Added);
        for row in &mut self.rows {
            row.rollback();
        }
    }

    // =========================================================================
    // Crate-internal hooks
    // =========================================================================

    /// Rebuilds a table from its wire form.
    ///
    /// Columns are re-validated, the primary key must name declared
    /// columns, and every row receives the primary key. Rows keep the
    /// loaded flag they were rebuilt with.
    pub(crate) fn from_parts(
        name: String,
        columns: Vec<ColumnDescriptor>,
        primary_key: Vec<String>,
        rows: Vec<Row>,
    ) -> DataSetResult<Self> {
        let mut table = Self::new(name);
        for mut column in columns {
            column.primary_key = false;
            table.add_column(column)?;
        }
        let key: Vec<&str> = primary_key.iter().map(String::as_str).collect();
        table.set_primary_key(&key)?;
        table.rows = rows;
        table.reassign_primary_key();
        Ok(table)
    }

    /// Mutable access to the row vector for the merge engine.
    pub(crate) fn rows_vec_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    /// Builds a detached full row conforming to this schema from `source`.
    ///
    /// Columns the source does not supply take their default; columns only
    /// the source has are dropped.
    pub(crate) fn conform(&self, source: &Row) -> Row {
        let values: ValueMap = self
            .columns
            .iter()
            .map(|c| {
                let value = source
                    .get(&c.name)
                    .cloned()
                    .unwrap_or_else(|| c.default_or_null());
                (c.name.clone(), value)
            })
            .collect();
        Row::full(values)
    }

    /// Appends a conformed row as Unchanged without admission checks.
    pub(crate) fn push_loaded(&mut self, mut row: Row) -> &Row {
        row.mark_clean();
        row.assign_primary_key(self.primary_key.clone(), true);
        self.rows.push(row);
        &self.rows[self.rows.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltaset_common::types::DataType;

    fn departments() -> Table {
        Table::with_columns(
            "Departments",
            vec![
                ColumnDescriptor::new("Id", DataType::Int32).primary_key(),
                ColumnDescriptor::new("Name", DataType::String),
                ColumnDescriptor::new("Active", DataType::Boolean).with_default(true),
            ],
        )
        .unwrap()
    }

    fn load(table: &mut Table, id: i32, name: &str) -> RowId {
        let mut row = table.new_row();
        row.set("Id", id).unwrap();
        row.set("Name", name).unwrap();
        table.load_row(row).unwrap()
    }

    #[test]
    fn test_schema() {
        let table = departments();
        assert_eq!(table.primary_key(), &["Id".to_string()]);
        assert_eq!(table.column_names(), vec!["Id", "Name", "Active"]);
        assert!(table.column("name").is_some());
        assert!(table.try_column("Missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let mut table = departments();
        let err = table
            .add_column(ColumnDescriptor::new("Name", DataType::String))
            .unwrap_err();
        assert!(err.is_invalid_operation());
    }

    #[test]
    fn test_new_row_uses_defaults() {
        let table = departments();
        let row = table.new_row();
        assert_eq!(row.state(), RowState::Detached);
        assert!(!row.is_partial());
        assert_eq!(row.get("Active"), Some(&Value::boolean(true)));
        assert_eq!(row.get("Name"), Some(&Value::Null));
    }

    #[test]
    fn test_add_row_marks_added_and_keeps_key_mutable() {
        let mut table = departments();
        let mut row = table.new_row();
        row.set("Name", "Engineering").unwrap();
        let id = table.add_row(row).unwrap();

        let row = table.row_by_id_mut(id).unwrap();
        assert_eq!(row.state(), RowState::Added);
        assert_eq!(row.primary_key(), &["Id".to_string()]);
        row.set("Id", 10).unwrap();
        assert_eq!(row.get("Id"), Some(&Value::int32(10)));
    }

    #[test]
    fn test_load_row_makes_key_write_once() {
        let mut table = departments();
        let id = load(&mut table, 1, "Sales");
        let row = table.row_by_id_mut(id).unwrap();
        assert_eq!(row.state(), RowState::Unchanged);
        assert!(row.set("Id", 2).unwrap_err().is_invalid_operation());
    }

    #[test]
    fn test_deleted_row_rejected() {
        let mut table = departments();
        load(&mut table, 1, "Sales");
        let mut row = table.remove_at(0).unwrap();
        row.set_state(RowState::Unchanged);
        row.delete().unwrap();
        assert!(table.add_row(row.clone()).unwrap_err().is_invalid_operation());
        assert!(table.load_row(row).unwrap_err().is_invalid_operation());
    }

    #[test]
    fn test_same_row_admitted_twice_rejected() {
        let mut table = departments();
        let id = load(&mut table, 1, "Sales");
        let copy = table.row_by_id(id).unwrap().clone();
        assert!(table.load_row(copy).unwrap_err().is_invalid_operation());
    }

    #[test]
    fn test_remove_by_id_and_position() {
        let mut table = departments();
        let a = load(&mut table, 1, "Sales");
        load(&mut table, 2, "Support");

        let removed = table.remove(a).unwrap();
        assert_eq!(removed.state(), RowState::Detached);
        assert_eq!(table.len(), 1);
        assert!(table.remove(a).unwrap_err().is_not_found());
        assert!(table.remove_at(5).unwrap_err().is_out_of_range());
        assert!(table.row(1).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_delete_row() {
        let mut table = departments();
        load(&mut table, 1, "Sales");
        let row = table.new_row();
        table.add_row(row).unwrap();

        table.delete_row(1).unwrap();
        assert_eq!(table.len(), 1);

        table.delete_row(0).unwrap();
        assert_eq!(table.row(0).unwrap().state(), RowState::Deleted);
    }

    #[test]
    fn test_accept_and_reject_changes() {
        let mut table = departments();
        load(&mut table, 1, "Sales");
        load(&mut table, 2, "Support");
        table.add_row(table.new_row()).unwrap();
        table.set_value(0, "Name", "Marketing").unwrap();
        table.delete_row(1).unwrap();
        assert!(table.has_changes());

        let mut rejected = table.clone();
        rejected.reject_changes();
        assert_eq!(rejected.len(), 2);
        assert!(!rejected.has_changes());
        assert_eq!(rejected.row(0).unwrap().get("Name"), Some(&Value::string("Sales")));

        table.accept_changes();
        assert_eq!(table.len(), 2);
        assert!(!table.has_changes());
        assert_eq!(table.row(0).unwrap().get("Name"), Some(&Value::string("Marketing")));
    }

    #[test]
    fn test_set_value_unknown_column() {
        let mut table = departments();
        load(&mut table, 1, "Sales");
        let err = table.set_value(0, "Budget", 5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "column 'Budget' not found in table 'Departments'"
        );
    }

    #[test]
    fn test_find_by_key_across_integer_widths() {
        let mut table = departments();
        load(&mut table, 7, "Legal");
        let row = table.find_by_key(&[Value::int64(7)]).unwrap();
        assert_eq!(row.get("Name"), Some(&Value::string("Legal")));
        assert!(table.find_by_key(&[Value::int32(8)]).is_none());
        assert!(table.find_by_key(&[]).is_none());
    }

    #[test]
    fn test_set_primary_key() {
        let mut table = departments();
        load(&mut table, 1, "Sales");
        table.set_primary_key(&["Id", "name"]).unwrap();
        assert_eq!(table.primary_key(), &["Id".to_string(), "Name".to_string()]);
        assert_eq!(table.row(0).unwrap().primary_key().len(), 2);
        assert!(table.set_primary_key(&["Nope"]).unwrap_err().is_not_found());
    }

    #[test]
    fn test_add_column_backfills_rows() {
        let mut table = departments();
        load(&mut table, 1, "Sales");
        table
            .add_column(ColumnDescriptor::new("Budget", DataType::Int64).with_default(0i64))
            .unwrap();
        assert_eq!(table.row(0).unwrap().get("Budget"), Some(&Value::int64(0)));
    }

    #[test]
    fn test_clone_schema() {
        let mut table = departments();
        load(&mut table, 1, "Sales");
        let empty = table.clone_schema();
        assert!(empty.is_empty());
        assert_eq!(empty.columns(), table.columns());
    }
}
