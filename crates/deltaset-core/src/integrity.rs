//! Referential integrity validation.
//!
//! Checks every [`Relation`] of a [`DataSet`] against the rows it links and
//! collects every violation into one report. Validation never mutates the
//! set.

use std::collections::{HashMap, HashSet};

use deltaset_common::config::IntegrityConfig;
use deltaset_common::error::{DataSetError, DataSetResult, IntegrityViolation, ViolationKind};
use deltaset_common::types::{RowId, Value};
use tracing::{debug, warn};

use crate::model::{DataSet, Relation, Row, RowState, Table};

/// Parent rows sharing one key.
#[derive(Default)]
struct ParentEntry {
    live: bool,
    deleted: Vec<RowId>,
}

/// Validates every relation and returns the violations found.
pub fn validate(set: &DataSet, config: &IntegrityConfig) -> Vec<IntegrityViolation> {
    let mut violations = Vec::new();
    for relation in set.relations() {
        let before = violations.len();
        check_relation(set, relation, config, &mut violations);
        debug!(
            "Checked relation '{}': {} violation(s)",
            relation.name(),
            violations.len() - before
        );
    }
    violations
}

/// Validates every relation, failing with all violations if any are found.
pub fn ensure_valid(set: &DataSet, config: &IntegrityConfig) -> DataSetResult<()> {
    let violations = validate(set, config);
    if violations.is_empty() {
        return Ok(());
    }
    warn!("Integrity check failed with {} violation(s)", violations.len());
    Err(DataSetError::IntegrityViolations { violations })
}

fn check_relation(
    set: &DataSet,
    relation: &Relation,
    config: &IntegrityConfig,
    violations: &mut Vec<IntegrityViolation>,
) {
    let parent = set.try_table(relation.parent_table());
    let child = set.try_table(relation.child_table());
    let (Some(parent), Some(child)) = (parent, child) else {
        if config.ignore_missing_tables {
            return;
        }
        for (name, table) in [
            (relation.parent_table(), parent),
            (relation.child_table(), child),
        ] {
            if table.is_none() {
                warn!(
                    "Relation '{}' refers to missing table '{}'",
                    relation.name(),
                    name
                );
                violations.push(IntegrityViolation::new(
                    ViolationKind::MissingTable,
                    relation.name(),
                    name,
                    format!("table '{}' does not exist", name),
                ));
            }
        }
        return;
    };

    let missing_before = violations.len();
    missing_columns(relation, parent, relation.parent_columns(), violations);
    missing_columns(relation, child, relation.child_columns(), violations);
    if violations.len() > missing_before {
        return;
    }

    let parents = index_parents(parent, relation.parent_columns());
    let mut restricted: HashSet<RowId> = HashSet::new();

    for row in child.iter() {
        let deleted_child = row.state() == RowState::Deleted;
        if deleted_child && !config.include_deleted_children {
            continue;
        }
        let key = row.key_values(relation.child_columns());
        let nulls = key.iter().filter(|v| v.is_null()).count();
        if nulls == key.len() && config.nulls_are_unset {
            continue;
        }

        let entry = if nulls == 0 {
            parents.get(&normalized(&key))
        } else {
            None
        };
        match entry {
            // A deleted child may point at a deleted parent.
            Some(_) if deleted_child => {}
            // Every deleted parent sharing the key is restricted, even
            // when a live one also holds it.
            Some(entry) if config.restrict_parent_delete => {
                restricted.extend(entry.deleted.iter().copied());
            }
            Some(entry) if entry.live => {}
            _ => violations.push(orphan(relation, child, row, key)),
        }
    }

    for row in parent.iter().filter(|r| restricted.contains(&r.id())) {
        violations.push(
            IntegrityViolation::new(
                ViolationKind::RestrictedDelete,
                relation.name(),
                parent.name(),
                format!(
                    "deleted row {} in '{}' still has rows in '{}'",
                    row.id(),
                    parent.name(),
                    relation.child_table()
                ),
            )
            .with_row(row.id(), row.key_values(relation.parent_columns())),
        );
    }
}

fn missing_columns(
    relation: &Relation,
    table: &Table,
    columns: &[String],
    violations: &mut Vec<IntegrityViolation>,
) {
    for column in columns.iter().filter(|c| !table.has_column(c)) {
        violations.push(IntegrityViolation::new(
            ViolationKind::MissingColumn,
            relation.name(),
            table.name(),
            format!("column '{}' not found in table '{}'", column, table.name()),
        ));
    }
}

/// Maps each fully non-null parent key to the rows holding it.
fn index_parents(parent: &Table, columns: &[String]) -> HashMap<Vec<Value>, ParentEntry> {
    let mut parents: HashMap<Vec<Value>, ParentEntry> = HashMap::new();
    for row in parent.iter() {
        let key = row.key_values(columns);
        if key.iter().any(Value::is_null) {
            continue;
        }
        let entry = parents.entry(normalized(&key)).or_default();
        if row.state() == RowState::Deleted {
            entry.deleted.push(row.id());
        } else {
            entry.live = true;
        }
    }
    parents
}

fn normalized(key: &[Value]) -> Vec<Value> {
    key.iter().map(Value::key_normalized).collect()
}

fn orphan(relation: &Relation, child: &Table, row: &Row, key: Vec<Value>) -> IntegrityViolation {
    let shown: Vec<String> = relation
        .child_columns()
        .iter()
        .zip(&key)
        .map(|(c, v)| format!("{}={}", c, v))
        .collect();
    IntegrityViolation::new(
        ViolationKind::Orphan,
        relation.name(),
        child.name(),
        format!(
            "row {} in '{}' has no parent in '{}' ({})",
            row.id(),
            child.name(),
            relation.parent_table(),
            shown.join(", ")
        ),
    )
    .with_row(row.id(), key)
}
