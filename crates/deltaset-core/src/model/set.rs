//! Data sets: named tables plus relations.
//!
//! A `DataSet` is the unit of snapshot exchange. Tables are independent of
//! each other; relations describe how they link but are never enforced
//! structurally.

use deltaset_common::error::{DataSetError, DataSetResult};

use super::relation::Relation;
use super::table::Table;

/// A collection of uniquely named tables and relations.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    /// Tables in insertion order. Names are unique ignoring case.
    tables: Vec<Table>,
    /// Relations in insertion order. Names are unique ignoring case.
    relations: Vec<Relation>,
}

impl DataSet {
    /// Creates an empty data set.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Returns the number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if the set has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns the tables in insertion order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Returns mutable access to every table.
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.iter_mut()
    }

    /// Returns the table names in insertion order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(Table::name).collect()
    }

    fn table_position(&self, name: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| t.name() == name)
            .or_else(|| {
                self.tables
                    .iter()
                    .position(|t| t.name().eq_ignore_ascii_case(name))
            })
    }

    /// Returns true if a table with this name exists.
    pub fn contains_table(&self, name: &str) -> bool {
        self.table_position(name).is_some()
    }

    /// Adds a table.
    ///
    /// # Errors
    ///
    /// Invalid-operation if a table with the same name (ignoring case)
    /// already exists.
    pub fn add_table(&mut self, table: Table) -> DataSetResult<()> {
        if self.contains_table(table.name()) {
            return Err(DataSetError::invalid_operation(format!(
                "table '{}' already exists",
                table.name()
            )));
        }
        self.tables.push(table);
        Ok(())
    }

    /// Removes a table and returns it. Relations naming it are kept.
    pub fn remove_table(&mut self, name: &str) -> DataSetResult<Table> {
        let index = self
            .table_position(name)
            .ok_or_else(|| DataSetError::TableNotFound {
                table: name.to_string(),
            })?;
        Ok(self.tables.remove(index))
    }

    /// Looks up a table, failing if it does not exist.
    pub fn table(&self, name: &str) -> DataSetResult<&Table> {
        self.try_table(name).ok_or_else(|| DataSetError::TableNotFound {
            table: name.to_string(),
        })
    }

    /// Looks up a table for mutation, failing if it does not exist.
    pub fn table_mut(&mut self, name: &str) -> DataSetResult<&mut Table> {
        self.try_table_mut(name)
            .ok_or_else(|| DataSetError::TableNotFound {
                table: name.to_string(),
            })
    }

    /// Looks up a table.
    pub fn try_table(&self, name: &str) -> Option<&Table> {
        self.table_position(name).map(|i| &self.tables[i])
    }

    /// Looks up a table for mutation.
    pub fn try_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.table_position(name).map(move |i| &mut self.tables[i])
    }

    // =========================================================================
    // Relations
    // =========================================================================

    /// Returns the relations in insertion order.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Looks up a relation by name (case-insensitive).
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.matches(name))
    }

    /// Adds a relation.
    ///
    /// # Errors
    ///
    /// Invalid-operation if a relation with the same name (ignoring case)
    /// already exists.
    pub fn add_relation(&mut self, relation: Relation) -> DataSetResult<()> {
        if self.relation(relation.name()).is_some() {
            return Err(DataSetError::invalid_operation(format!(
                "relation '{}' already exists",
                relation.name()
            )));
        }
        self.relations.push(relation);
        Ok(())
    }

    /// Removes a relation and returns it.
    pub fn remove_relation(&mut self, name: &str) -> DataSetResult<Relation> {
        let index = self
            .relations
            .iter()
            .position(|r| r.matches(name))
            .ok_or_else(|| DataSetError::RelationNotFound {
                relation: name.to_string(),
            })?;
        Ok(self.relations.remove(index))
    }

    /// Removes every relation.
    pub fn clear_relations(&mut self) {
        self.relations.clear();
    }

    // =========================================================================
    // Change tracking
    // =========================================================================

    /// Returns true if any table has a pending change.
    pub fn has_changes(&self) -> bool {
        self.tables.iter().any(Table::has_changes)
    }

    /// Commits pending changes in every table.
    pub fn accept_changes(&mut self) {
        for table in &mut self.tables {
            table.accept_changes();
        }
    }

    /// Rolls back pending changes in every table.
    pub fn reject_changes(&mut self) {
        for table in &mut self.tables {
            table.reject_changes();
        }
    }
}
