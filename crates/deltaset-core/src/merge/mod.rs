//! Snapshot merging.
//!
//! Reconciles a *current* [`DataSet`] with a *refreshed* snapshot of the same
//! data, mutating current in place and appending what changed to a
//! [`MergeResult`].
//!
//! | Mode                             | Precondition                      | Matching                       |
//! |----------------------------------|-----------------------------------|--------------------------------|
//! | [`MergeMode::Replace`]           | shared columns keep their type    | none                           |
//! | [`MergeMode::RefreshIfNoChangesExist`] | no pending rows in current  | primary key                    |
//! | [`MergeMode::RefreshPreservingLocalChanges`] | no null key parts in refreshed | primary key         |
//! | [`MergeMode::PostSave`]          | none                              | primary key, then correlation  |
//!
//! Preconditions are checked for every table before any table is touched,
//! so a failing merge leaves current exactly as it was.
//!
//! # Example
//!
//! ```rust
//! use deltaset_common::config::MergeConfig;
//! use deltaset_common::types::DataType;
//! use deltaset_core::merge::{self, MergeResult};
//! use deltaset_core::model::{ColumnDescriptor, DataSet, Table};
//!
//! fn snapshot(names: &[&str]) -> DataSet {
//!     let mut table = Table::with_columns(
//!         "Departments",
//!         vec![
//!             ColumnDescriptor::new("Id", DataType::Int32).primary_key(),
//!             ColumnDescriptor::new("Name", DataType::String),
//!         ],
//!     )
//!     .unwrap();
//!     for (id, name) in names.iter().enumerate() {
//!         let mut row = table.new_row();
//!         row.set("Id", id as i32).unwrap();
//!         row.set("Name", *name).unwrap();
//!         table.load_row(row).unwrap();
//!     }
//!     let mut set = DataSet::new();
//!     set.add_table(table).unwrap();
//!     set
//! }
//!
//! let mut current = snapshot(&["Sales", "Support"]);
//! let refreshed = snapshot(&["Sales", "Customer Care", "Legal"]);
//!
//! let mut result = MergeResult::new();
//! merge::refresh_if_no_changes(&mut current, &refreshed, &MergeConfig::default(), &mut result)
//!     .unwrap();
//! assert_eq!(result.updated_count(), 1);
//! assert_eq!(result.added_count(), 1);
//! assert_eq!(current.table("Departments").unwrap().len(), 3);
//! ```

mod key;
mod result;
mod table;

use std::fmt;

use deltaset_common::config::MergeConfig;
use deltaset_common::error::{DataSetError, DataSetResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::model::{DataSet, Table};

pub use result::MergeResult;

/// How a refreshed snapshot is folded into the current set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergeMode {
    /// Discard every current row and load the refreshed rows instead.
    Replace,
    /// Reconcile by primary key; fails if current holds pending changes.
    RefreshIfNoChangesExist,
    /// Reconcile by primary key, leaving rows with pending changes alone.
    RefreshPreservingLocalChanges,
    /// Copy a save acknowledgement onto the rows it correlates with.
    PostSave,
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MergeMode::Replace => "replace",
            MergeMode::RefreshIfNoChangesExist => "refresh-if-no-changes",
            MergeMode::RefreshPreservingLocalChanges => "refresh-preserving-changes",
            MergeMode::PostSave => "post-save",
        };
        write!(f, "{}", name)
    }
}

/// Merges `refreshed` into `current` using [`MergeMode::Replace`].
pub fn replace(
    current: &mut DataSet,
    refreshed: &DataSet,
    config: &MergeConfig,
    result: &mut MergeResult,
) -> DataSetResult<()> {
    merge(MergeMode::Replace, current, refreshed, config, result)
}

/// Merges `refreshed` into `current` using
/// [`MergeMode::RefreshIfNoChangesExist`].
pub fn refresh_if_no_changes(
    current: &mut DataSet,
    refreshed: &DataSet,
    config: &MergeConfig,
    result: &mut MergeResult,
) -> DataSetResult<()> {
    merge(
        MergeMode::RefreshIfNoChangesExist,
        current,
        refreshed,
        config,
        result,
    )
}

/// Merges `refreshed` into `current` using
/// [`MergeMode::RefreshPreservingLocalChanges`].
pub fn refresh_preserving_changes(
    current: &mut DataSet,
    refreshed: &DataSet,
    config: &MergeConfig,
    result: &mut MergeResult,
) -> DataSetResult<()> {
    merge(
        MergeMode::RefreshPreservingLocalChanges,
        current,
        refreshed,
        config,
        result,
    )
}

/// Merges a save acknowledgement into `current` using
/// [`MergeMode::PostSave`].
pub fn post_save(
    current: &mut DataSet,
    refreshed: &DataSet,
    config: &MergeConfig,
    result: &mut MergeResult,
) -> DataSetResult<()> {
    merge(MergeMode::PostSave, current, refreshed, config, result)
}

/// Merges `refreshed` into `current`.
///
/// Tables are matched by name. Tables present only in refreshed are added
/// when [`MergeConfig::add_missing_tables`] is set; tables present only in
/// current are left alone.
///
/// # Errors
///
/// Invalid-operation (or schema mismatch for [`MergeMode::Replace`]) when a
/// precondition fails. Nothing is modified in that case.
pub fn merge(
    mode: MergeMode,
    current: &mut DataSet,
    refreshed: &DataSet,
    config: &MergeConfig,
    result: &mut MergeResult,
) -> DataSetResult<()> {
    for table in refreshed.tables() {
        if let Some(existing) = current.try_table(table.name()) {
            if let Err(err) = check(mode, existing, table) {
                warn!("Rejected {} merge: {}", mode, err);
                return Err(err);
            }
        }
    }

    for table in refreshed.tables() {
        match current.try_table_mut(table.name()) {
            Some(existing) => {
                let name = existing.name().to_string();
                let before = counts(result, &name);
                match mode {
                    MergeMode::Replace => table::replace(existing, table, result),
                    MergeMode::RefreshIfNoChangesExist => {
                        table::refresh(existing, table, false, result)
                    }
                    MergeMode::RefreshPreservingLocalChanges => {
                        table::refresh(existing, table, true, result)
                    }
                    MergeMode::PostSave => table::post_save(
                        existing,
                        table,
                        config.correlation_column.as_deref(),
                        result,
                    ),
                }
                let after = counts(result, &name);
                debug!(
                    "Merged table '{}' ({}): {} added, {} updated, {} deleted",
                    name,
                    mode,
                    after.0 - before.0,
                    after.1 - before.1,
                    after.2 - before.2
                );
            }
            None if config.add_missing_tables => {
                let adopted = table::adopt(table, result);
                debug!(
                    "Added table '{}' from refreshed set with {} rows",
                    adopted.name(),
                    adopted.len()
                );
                current.add_table(adopted)?;
            }
            None => {
                trace!("Skipping table '{}' missing from current set", table.name());
            }
        }
    }
    Ok(())
}

fn counts(result: &MergeResult, table: &str) -> (usize, usize, usize) {
    (
        result.added_in(table).len(),
        result.updated_in(table).len(),
        result.deleted_in(table).len(),
    )
}

/// Checks the per-table precondition of `mode`.
fn check(mode: MergeMode, current: &Table, refreshed: &Table) -> DataSetResult<()> {
    match mode {
        MergeMode::Replace => {
            for column in current.columns() {
                if let Some(other) = refreshed.column(&column.name) {
                    if other.data_type != column.data_type {
                        return Err(DataSetError::SchemaMismatch {
                            table: current.name().to_string(),
                            column: column.name.clone(),
                            current: column.data_type,
                            refreshed: other.data_type,
                        });
                    }
                }
            }
        }
        MergeMode::RefreshIfNoChangesExist => {
            if current.has_changes() {
                let pending = current.iter().filter(|r| r.has_changes()).count();
                return Err(DataSetError::invalid_operation(format!(
                    "table '{}' has {} row(s) with pending changes",
                    current.name(),
                    pending
                )));
            }
        }
        MergeMode::RefreshPreservingLocalChanges => {
            let key = current.primary_key();
            if key.is_empty() {
                return Ok(());
            }
            for (index, row) in refreshed.iter().enumerate() {
                if key.iter().any(|c| row.get(c).map_or(true, |v| v.is_null())) {
                    return Err(DataSetError::invalid_operation(format!(
                        "refreshed row {} of table '{}' has a null primary key part",
                        index,
                        current.name()
                    )));
                }
            }
        }
        MergeMode::PostSave => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnDescriptor, RowState};
    use deltaset_common::config::ChangesetConfig;
    use deltaset_common::types::{DataType, Value};

    fn departments(rows: &[(i32, &str)]) -> Table {
        let mut table = Table::with_columns(
            "Departments",
            vec![
                ColumnDescriptor::new("Id", DataType::Int32).primary_key(),
                ColumnDescriptor::new("Name", DataType::String),
            ],
        )
        .unwrap();
        for (id, name) in rows {
            let mut row = table.new_row();
            row.set("Id", *id).unwrap();
            row.set("Name", *name).unwrap();
            table.load_row(row).unwrap();
        }
        table
    }

    fn set_of(table: Table) -> DataSet {
        let mut set = DataSet::new();
        set.add_table(table).unwrap();
        set
    }

    fn names(set: &DataSet) -> Vec<String> {
        set.table("Departments")
            .unwrap()
            .iter()
            .map(|r| r.get("Name").map(ToString::to_string).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(MergeMode::PostSave.to_string(), "post-save");
        assert_eq!(MergeMode::Replace.to_string(), "replace");
    }

    #[test]
    fn test_refresh_adds_updates_and_removes() {
        let mut current = set_of(departments(&[(1, "Sales"), (2, "Support"), (3, "Legal")]));
        let refreshed = set_of(departments(&[(3, "Legal"), (1, "Sales EU"), (4, "Research")]));
        let untouched = current.table("Departments").unwrap().row(2).unwrap().id();

        let mut result = MergeResult::new();
        refresh_if_no_changes(&mut current, &refreshed, &MergeConfig::default(), &mut result)
            .unwrap();

        assert_eq!(names(&current), vec!["Sales EU", "Legal", "Research"]);
        assert_eq!(result.added_count(), 1);
        assert_eq!(result.updated_count(), 1);
        assert_eq!(result.deleted_count(), 1);
        assert_eq!(
            result.deleted_in("Departments")[0].get("Name"),
            Some(&Value::string("Support"))
        );
        let table = current.table("Departments").unwrap();
        assert_eq!(table.row(1).unwrap().id(), untouched);
        assert!(!table.has_changes());
    }

    #[test]
    fn test_dirty_gate_leaves_current_untouched() {
        let mut current = set_of(departments(&[(1, "Sales")]));
        current
            .table_mut("Departments")
            .unwrap()
            .set_value(0, "Name", "Marketing")
            .unwrap();
        let refreshed = set_of(departments(&[(1, "Sales"), (2, "Support")]));

        let mut result = MergeResult::new();
        let err = refresh_if_no_changes(&mut current, &refreshed, &MergeConfig::default(), &mut result)
            .unwrap_err();
        assert!(err.is_invalid_operation());
        assert!(result.is_empty());
        assert_eq!(names(&current), vec!["Marketing"]);
    }

    #[test]
    fn test_preserving_keeps_local_changes() {
        let mut current = set_of(departments(&[(1, "Sales"), (2, "Support"), (3, "Legal")]));
        {
            let table = current.table_mut("Departments").unwrap();
            table.set_value(0, "Name", "Marketing").unwrap();
            table.delete_row(2).unwrap();
            let mut row = table.new_row();
            row.set("Id", 9).unwrap();
            row.set("Name", "Draft").unwrap();
            table.add_row(row).unwrap();
        }
        let refreshed = set_of(departments(&[(1, "Sales EU"), (2, "Customer Care")]));

        let mut result = MergeResult::new();
        refresh_preserving_changes(&mut current, &refreshed, &MergeConfig::default(), &mut result)
            .unwrap();

        let table = current.table("Departments").unwrap();
        assert_eq!(names(&current), vec!["Marketing", "Customer Care", "Legal", "Draft"]);
        assert_eq!(table.row(0).unwrap().state(), RowState::Modified);
        assert_eq!(table.row(1).unwrap().state(), RowState::Unchanged);
        assert_eq!(table.row(2).unwrap().state(), RowState::Deleted);
        assert_eq!(table.row(3).unwrap().state(), RowState::Added);
        assert_eq!(result.updated_count(), 1);
        assert_eq!(result.added_count(), 0);
        assert_eq!(result.deleted_count(), 0);
    }

    #[test]
    fn test_preserving_rejects_null_key() {
        let mut current = set_of(departments(&[(1, "Sales")]));
        let mut refreshed_table = departments(&[]);
        let mut row = refreshed_table.new_row();
        row.set("Name", "Keyless").unwrap();
        refreshed_table.load_row(row).unwrap();
        let refreshed = set_of(refreshed_table);

        let mut result = MergeResult::new();
        let err = refresh_preserving_changes(
            &mut current,
            &refreshed,
            &MergeConfig::default(),
            &mut result,
        )
        .unwrap_err();
        assert!(err.is_invalid_operation());
        assert_eq!(names(&current), vec!["Sales"]);
    }

    #[test]
    fn test_refresh_treats_null_key_as_addition() {
        let mut current = set_of(departments(&[(1, "Sales")]));
        let mut refreshed_table = departments(&[]);
        let mut row = refreshed_table.new_row();
        row.set("Name", "Sales").unwrap();
        refreshed_table.load_row(row).unwrap();
        let refreshed = set_of(refreshed_table);

        let mut result = MergeResult::new();
        refresh_if_no_changes(&mut current, &refreshed, &MergeConfig::default(), &mut result)
            .unwrap();
        assert_eq!(result.deleted_count(), 1);
        assert_eq!(result.added_count(), 1);
        assert_eq!(
            current.table("Departments").unwrap().row(0).unwrap().get("Id"),
            Some(&Value::Null)
        );
    }

    #[test]
    fn test_replace_reports_everything_added() {
        let mut current = set_of(departments(&[(1, "Sales"), (2, "Support")]));
        let original = current.table("Departments").unwrap().row(0).unwrap().id();
        let refreshed = set_of(departments(&[(1, "Sales")]));

        let mut result = MergeResult::new();
        replace(&mut current, &refreshed, &MergeConfig::default(), &mut result).unwrap();

        let table = current.table("Departments").unwrap();
        assert_eq!(table.len(), 1);
        assert_ne!(table.row(0).unwrap().id(), original);
        assert_eq!(result.added_count(), 1);
        assert_eq!(result.deleted_count(), 0);
        assert_eq!(result.updated_count(), 0);
    }

    #[test]
    fn test_replace_rejects_type_mismatch() {
        let mut current = set_of(departments(&[(1, "Sales")]));
        let refreshed = set_of(
            Table::with_columns(
                "Departments",
                vec![
                    ColumnDescriptor::new("Id", DataType::Int64).primary_key(),
                    ColumnDescriptor::new("Name", DataType::String),
                ],
            )
            .unwrap(),
        );

        let mut result = MergeResult::new();
        let err = replace(&mut current, &refreshed, &MergeConfig::default(), &mut result)
            .unwrap_err();
        assert!(err.is_invalid_operation());
        assert!(err.to_string().contains("Id"));
        assert_eq!(current.table("Departments").unwrap().len(), 1);
    }

    #[test]
    fn test_missing_tables() {
        let mut current = DataSet::new();
        let refreshed = set_of(departments(&[(1, "Sales")]));

        let config = MergeConfig {
            add_missing_tables: false,
            ..Default::default()
        };
        let mut result = MergeResult::new();
        refresh_if_no_changes(&mut current, &refreshed, &config, &mut result).unwrap();
        assert!(current.is_empty());
        assert!(result.is_empty());

        refresh_if_no_changes(&mut current, &refreshed, &MergeConfig::default(), &mut result)
            .unwrap();
        assert_eq!(names(&current), vec!["Sales"]);
        assert_eq!(result.added_in("Departments").len(), 1);
    }

    #[test]
    fn test_post_save_copies_server_key() {
        let mut table = Table::with_columns(
            "Departments",
            vec![
                ColumnDescriptor::new("Id", DataType::Int32).primary_key(),
                ColumnDescriptor::new("Name", DataType::String),
                ColumnDescriptor::new("ClientRef", DataType::Int64),
            ],
        )
        .unwrap();
        let mut row = table.new_row();
        row.set("Name", "Research").unwrap();
        row.set("ClientRef", 77i64).unwrap();
        table.add_row(row).unwrap();
        let mut current = set_of(table);

        let mut ack = current.table("Departments").unwrap().clone_schema();
        let mut row = ack.new_row();
        row.set("Id", 500).unwrap();
        row.set("Name", "Research").unwrap();
        row.set("ClientRef", 77i64).unwrap();
        ack.load_row(row).unwrap();
        let refreshed = set_of(ack);

        let config = MergeConfig {
            correlation_column: Some("ClientRef".to_string()),
            ..Default::default()
        };
        let mut result = MergeResult::new();
        post_save(&mut current, &refreshed, &config, &mut result).unwrap();

        let table = current.table("Departments").unwrap();
        assert_eq!(table.len(), 1);
        let row = table.row(0).unwrap();
        assert_eq!(row.state(), RowState::Unchanged);
        assert_eq!(row.get("Id"), Some(&Value::int32(500)));
        assert_eq!(result.updated_count(), 1);

        result.clear();
        post_save(&mut current, &refreshed, &config, &mut result).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_post_save_marks_modified_row_clean() {
        let mut current = set_of(departments(&[(1, "Sales")]));
        current
            .table_mut("Departments")
            .unwrap()
            .set_value(0, "Name", "Marketing")
            .unwrap();
        let refreshed = set_of(departments(&[(1, "Marketing")]));

        let mut result = MergeResult::new();
        post_save(&mut current, &refreshed, &MergeConfig::default(), &mut result).unwrap();

        assert!(!current.has_changes());
        assert_eq!(names(&current), vec!["Marketing"]);
        assert_eq!(result.updated_count(), 1);
    }

    #[test]
    fn test_post_save_commits_acknowledged_delete() {
        let mut current = set_of(departments(&[(1, "Sales"), (2, "Support")]));
        current.table_mut("Departments").unwrap().delete_row(0).unwrap();
        let ack = crate::changeset::extract_changes(&current, &ChangesetConfig::default()).unwrap();
        assert_eq!(ack.table("Departments").unwrap().row(0).unwrap().state(), RowState::Deleted);

        let mut result = MergeResult::new();
        post_save(&mut current, &ack, &MergeConfig::default(), &mut result).unwrap();

        assert_eq!(names(&current), vec!["Support"]);
        assert!(!current.has_changes());
        assert_eq!(result.deleted_count(), 1);
        assert_eq!(result.deleted_in("Departments")[0].get("Id"), Some(&Value::int32(1)));
        assert_eq!(result.updated_count(), 0);
        assert_eq!(result.added_count(), 0);

        result.clear();
        post_save(&mut current, &ack, &MergeConfig::default(), &mut result).unwrap();
        assert!(result.is_empty());
        assert_eq!(names(&current), vec!["Support"]);
    }

    #[test]
    fn test_post_save_removes_locally_deleted_match() {
        let mut current = set_of(departments(&[(1, "Sales"), (2, "Support")]));
        current.table_mut("Departments").unwrap().delete_row(1).unwrap();
        let refreshed = set_of(departments(&[(1, "Sales"), (2, "Support")]));

        let mut result = MergeResult::new();
        post_save(&mut current, &refreshed, &MergeConfig::default(), &mut result).unwrap();

        assert_eq!(names(&current), vec!["Sales"]);
        assert!(!current.has_changes());
        assert_eq!(result.deleted_count(), 1);
    }

    #[test]
    fn test_refresh_never_loads_deleted_rows() {
        let mut refreshed = departments(&[(1, "Sales"), (2, "Support")]);
        refreshed.delete_row(1).unwrap();
        let refreshed = set_of(refreshed);

        let mut current = set_of(departments(&[]));
        let mut result = MergeResult::new();
        refresh_if_no_changes(&mut current, &refreshed, &MergeConfig::default(), &mut result)
            .unwrap();
        assert_eq!(names(&current), vec!["Sales"]);

        let mut current = set_of(departments(&[(1, "Sales")]));
        let mut result = MergeResult::new();
        post_save(&mut current, &refreshed, &MergeConfig::default(), &mut result).unwrap();
        assert_eq!(names(&current), vec!["Sales"]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_result_accumulates_across_merges() {
        let mut current = set_of(departments(&[(1, "Sales")]));
        let mut result = MergeResult::new();
        let first = set_of(departments(&[(1, "Sales"), (2, "Support")]));
        refresh_if_no_changes(&mut current, &first, &MergeConfig::default(), &mut result).unwrap();
        let second = set_of(departments(&[(1, "Sales"), (2, "Support"), (3, "Legal")]));
        refresh_if_no_changes(&mut current, &second, &MergeConfig::default(), &mut result).unwrap();
        assert_eq!(result.added_count(), 2);
    }
}
