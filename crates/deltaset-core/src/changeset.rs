//! Changeset extraction.
//!
//! A changeset is a new [`DataSet`] holding only the rows with pending
//! changes, each trimmed to the columns the backing store needs:
//!
//! | Source state | Columns carried                                     |
//! |--------------|-----------------------------------------------------|
//! | Added        | every declared column present in the row            |
//! | Modified     | primary key, correlation column, changed columns    |
//! | Deleted      | primary key, correlation column                     |
//!
//! Extracted rows are partial: a column the source row never held stays
//! absent rather than turning into a null.

use deltaset_common::config::ChangesetConfig;
use deltaset_common::error::DataSetResult;
use tracing::{debug, trace};

use crate::model::{DataSet, Row, RowState, Table, ValueMap};

/// Extracts the pending changes of `set` into a new data set.
///
/// The source is not modified.
pub fn extract_changes(set: &DataSet, config: &ChangesetConfig) -> DataSetResult<DataSet> {
    let mut changes = DataSet::new();

    for table in set.tables() {
        if !table.has_changes() && !config.include_unchanged_tables {
            continue;
        }
        let target = extract_table(table, config)?;
        debug!(
            "Extracted changeset for table '{}': {} added, {} modified, {} deleted",
            target.name(),
            target.count_in_state(RowState::Added),
            target.count_in_state(RowState::Modified),
            target.count_in_state(RowState::Deleted)
        );
        changes.add_table(target)?;
    }

    for relation in set.relations() {
        if changes.contains_table(relation.parent_table())
            && changes.contains_table(relation.child_table())
        {
            changes.add_relation(relation.clone())?;
        }
    }

    Ok(changes)
}

/// Like [`extract_changes`], mapping a missing set to a missing changeset.
pub fn extract_changes_opt(
    set: Option<&DataSet>,
    config: &ChangesetConfig,
) -> DataSetResult<Option<DataSet>> {
    set.map(|set| extract_changes(set, config)).transpose()
}

fn extract_table(table: &Table, config: &ChangesetConfig) -> DataSetResult<Table> {
    let mut target = table.clone_schema();
    let correlation = config
        .correlation_column
        .as_deref()
        .and_then(|name| table.column(name))
        .map(|c| c.name.clone());

    for row in table.iter() {
        match row.state() {
            RowState::Added => {
                let values = pick(row, table.column_names());
                let mut extracted = Row::partial(values);
                extracted.set_state(RowState::Added);
                target.add_row(extracted)?;
            }
            RowState::Modified => {
                let mut columns = identity_columns(table, correlation.as_deref());
                for changed in row.changed_columns() {
                    if !columns.iter().any(|c| c.eq_ignore_ascii_case(changed)) {
                        columns.push(changed);
                    }
                }
                let values = pick(row, columns.iter().copied());
                let baseline = row.baseline().map(|baseline| {
                    columns
                        .iter()
                        .filter_map(|c| {
                            crate::model::find_key(baseline, c)
                                .and_then(|key| baseline.get_key_value(key))
                                .map(|(k, v)| (k.clone(), v.clone()))
                        })
                        .collect::<ValueMap>()
                });
                let mut extracted = Row::partial(values);
                extracted.set_state(RowState::Modified);
                extracted.set_baseline(baseline);
                target.load_row(extracted)?;
            }
            RowState::Deleted => {
                let columns = identity_columns(table, correlation.as_deref());
                let values = pick(row, columns);
                target.load_row(Row::partial(values))?;
                let index = target.len() - 1;
                target.delete_row(index)?;
            }
            RowState::Unchanged | RowState::Detached => {
                trace!("Skipping clean row {} in '{}'", row.id(), table.name());
            }
        }
    }

    Ok(target)
}

/// Primary-key columns followed by the correlation column, if declared.
fn identity_columns<'a>(table: &'a Table, correlation: Option<&'a str>) -> Vec<&'a str> {
    let mut columns: Vec<&str> = table.primary_key().iter().map(String::as_str).collect();
    if let Some(correlation) = correlation {
        if !columns.iter().any(|c| c.eq_ignore_ascii_case(correlation)) {
            columns.push(correlation);
        }
    }
    columns
}

/// Copies the listed columns the row actually holds.
fn pick<'a>(row: &Row, columns: impl IntoIterator<Item = &'a str>) -> ValueMap {
    columns
        .into_iter()
        .filter_map(|c| row.get(c).map(|v| (c.to_string(), v.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnDescriptor, Relation};
    use deltaset_common::types::{DataType, Value};

    fn employees() -> Table {
        let mut table = Table::with_columns(
            "Employees",
            vec![
                ColumnDescriptor::new("Id", DataType::Int32).primary_key(),
                ColumnDescriptor::new("Name", DataType::String),
                ColumnDescriptor::new("Title", DataType::String),
                ColumnDescriptor::new("ClientRef", DataType::Uuid),
            ],
        )
        .unwrap();
        for (id, name) in [(1, "Ada"), (2, "Grace"), (3, "Edsger")] {
            let mut row = table.new_row();
            row.set("Id", id).unwrap();
            row.set("Name", name).unwrap();
            row.set("Title", "Engineer").unwrap();
            row.set("ClientRef", Value::Uuid(id as u128)).unwrap();
            table.load_row(row).unwrap();
        }
        table
    }

    fn set_with(table: Table) -> DataSet {
        let mut set = DataSet::new();
        set.add_table(table).unwrap();
        set
    }

    #[test]
    fn test_clean_set_yields_empty_changeset() {
        let set = set_with(employees());
        let changes = extract_changes(&set, &ChangesetConfig::default()).unwrap();
        assert!(changes.is_empty());

        let config = ChangesetConfig {
            include_unchanged_tables: true,
            ..Default::default()
        };
        let changes = extract_changes(&set, &config).unwrap();
        assert!(changes.table("Employees").unwrap().is_empty());
    }

    #[test]
    fn test_modified_row_carries_key_and_changed_columns() {
        let mut table = employees();
        table.set_value(1, "Title", "Admiral").unwrap();
        let set = set_with(table);

        let changes = extract_changes(&set, &ChangesetConfig::default()).unwrap();
        let table = changes.table("Employees").unwrap();
        assert_eq!(table.len(), 1);

        let row = table.row(0).unwrap();
        assert_eq!(row.state(), RowState::Modified);
        assert!(row.is_partial());
        assert_eq!(row.values().len(), 2);
        assert_eq!(row.get("Id"), Some(&Value::int32(2)));
        assert_eq!(row.get("Title"), Some(&Value::string("Admiral")));
        assert!(row.get("Name").is_none());
        assert_eq!(row.original("Title"), Some(&Value::string("Engineer")));
        assert_eq!(row.changed_columns(), vec!["Title"]);
    }

    #[test]
    fn test_correlation_column_included() {
        let mut table = employees();
        table.set_value(0, "Name", "Ada L.").unwrap();
        table.delete_row(2).unwrap();
        let set = set_with(table);

        let config = ChangesetConfig {
            correlation_column: Some("clientref".to_string()),
            ..Default::default()
        };
        let changes = extract_changes(&set, &config).unwrap();
        let table = changes.table("Employees").unwrap();

        let modified = table.row(0).unwrap();
        assert_eq!(modified.get("ClientRef"), Some(&Value::Uuid(1)));
        assert_eq!(modified.changed_columns(), vec!["Name"]);

        let deleted = table.row(1).unwrap();
        assert_eq!(deleted.state(), RowState::Deleted);
        assert_eq!(deleted.values().len(), 2);
        assert_eq!(deleted.get("ClientRef"), Some(&Value::Uuid(3)));
    }

    #[test]
    fn test_deleted_row_carries_key_only() {
        let mut table = employees();
        table.delete_row(0).unwrap();
        let set = set_with(table);

        let changes = extract_changes(&set, &ChangesetConfig::default()).unwrap();
        let row = changes.table("Employees").unwrap().row(0).unwrap();
        assert_eq!(row.state(), RowState::Deleted);
        assert_eq!(row.values().len(), 1);
        assert_eq!(row.get("Id"), Some(&Value::int32(1)));
    }

    #[test]
    fn test_added_row_keeps_absent_columns_absent() {
        let mut table = employees();
        let mut row = Row::empty();
        row.set("Name", "Engineering").unwrap();
        table.add_row(row).unwrap();
        let set = set_with(table);

        let changes = extract_changes(&set, &ChangesetConfig::default()).unwrap();
        let row = changes.table("Employees").unwrap().row(0).unwrap();
        assert_eq!(row.state(), RowState::Added);
        assert!(row.get("Id").is_none());
        assert_eq!(row.get("Name"), Some(&Value::string("Engineering")));
    }

    #[test]
    fn test_added_full_row_carries_every_column() {
        let mut table = employees();
        let mut row = table.new_row();
        row.set("Id", 4).unwrap();
        table.add_row(row).unwrap();
        let set = set_with(table);

        let changes = extract_changes(&set, &ChangesetConfig::default()).unwrap();
        let row = changes.table("Employees").unwrap().row(0).unwrap();
        assert_eq!(row.values().len(), 4);
        assert_eq!(row.get("Title"), Some(&Value::Null));
    }

    #[test]
    fn test_source_is_untouched() {
        let mut table = employees();
        table.set_value(0, "Name", "Ada L.").unwrap();
        let set = set_with(table);
        extract_changes(&set, &ChangesetConfig::default()).unwrap();
        assert!(set.has_changes());
        assert_eq!(set.table("Employees").unwrap().len(), 3);
    }

    #[test]
    fn test_relations_follow_present_tables() {
        let mut set = set_with(employees());
        let departments = Table::with_columns(
            "Departments",
            vec![ColumnDescriptor::new("Id", DataType::Int32).primary_key()],
        )
        .unwrap();
        set.add_table(departments).unwrap();
        set.add_relation(
            Relation::new("FK_Emp_Dept", "Departments", ["Id"], "Employees", ["Id"]).unwrap(),
        )
        .unwrap();
        set.table_mut("Employees").unwrap().delete_row(0).unwrap();

        let changes = extract_changes(&set, &ChangesetConfig::default()).unwrap();
        assert_eq!(changes.table_names(), vec!["Employees"]);
        assert!(changes.relations().is_empty());

        let config = ChangesetConfig {
            include_unchanged_tables: true,
            ..Default::default()
        };
        let changes = extract_changes(&set, &config).unwrap();
        assert_eq!(changes.relations().len(), 1);
    }

    #[test]
    fn test_none_in_none_out() {
        let changes = extract_changes_opt(None, &ChangesetConfig::default()).unwrap();
        assert!(changes.is_none());

        let set = set_with(employees());
        let changes = extract_changes_opt(Some(&set), &ChangesetConfig::default()).unwrap();
        assert!(changes.is_some());
    }
}
