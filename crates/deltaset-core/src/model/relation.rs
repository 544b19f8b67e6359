//! Declarative parent/child table links.

use std::fmt;

use deltaset_common::error::{DataSetError, DataSetResult};
use serde::{Deserialize, Serialize};

/// A named link from parent columns to child columns.
///
/// Relations are purely declarative; nothing enforces them except the
/// integrity validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    name: String,
    parent_table: String,
    parent_columns: Vec<String>,
    child_table: String,
    child_columns: Vec<String>,
}

impl Relation {
    /// Creates a relation.
    ///
    /// # Errors
    ///
    /// Invalid-argument if the column lists are empty or differ in length.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        parent_table: impl Into<String>,
        parent_columns: impl IntoIterator<Item = S>,
        child_table: impl Into<String>,
        child_columns: impl IntoIterator<Item = S>,
    ) -> DataSetResult<Self> {
        let relation = Self {
            name: name.into(),
            parent_table: parent_table.into(),
            parent_columns: parent_columns.into_iter().map(Into::into).collect(),
            child_table: child_table.into(),
            child_columns: child_columns.into_iter().map(Into::into).collect(),
        };
        relation.check()?;
        Ok(relation)
    }

    pub(crate) fn check(&self) -> DataSetResult<()> {
        if self.parent_columns.is_empty() {
            return Err(DataSetError::invalid_argument(format!(
                "relation '{}' has no columns",
                self.name
            )));
        }
        if self.parent_columns.len() != self.child_columns.len() {
            return Err(DataSetError::invalid_argument(format!(
                "relation '{}' pairs {} parent columns with {} child columns",
                self.name,
                self.parent_columns.len(),
                self.child_columns.len()
            )));
        }
        Ok(())
    }

    /// Returns the relation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent table name.
    pub fn parent_table(&self) -> &str {
        &self.parent_table
    }

    /// Returns the parent column names.
    pub fn parent_columns(&self) -> &[String] {
        &self.parent_columns
    }

    /// Returns the child table name.
    pub fn child_table(&self) -> &str {
        &self.child_table
    }

    /// Returns the child column names.
    pub fn child_columns(&self) -> &[String] {
        &self.child_columns
    }

    /// Returns true if `name` refers to this relation (case-insensitive).
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}({}) -> {}({})",
            self.name,
            self.parent_table,
            self.parent_columns.join(", "),
            self.child_table,
            self.child_columns.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_relation() {
        let rel = Relation::new("FK_Emp_Dept", "Departments", ["Id"], "Employees", ["DeptId"])
            .unwrap();
        assert_eq!(rel.parent_columns(), &["Id".to_string()]);
        assert!(rel.matches("fk_emp_dept"));
        assert_eq!(
            rel.to_string(),
            "FK_Emp_Dept: Departments(Id) -> Employees(DeptId)"
        );
    }

    #[test]
    fn test_mismatched_columns_rejected() {
        let err = Relation::new("R", "P", vec!["A", "B"], "C", vec!["X"]).unwrap_err();
        assert!(err.to_string().contains("2 parent columns with 1 child columns"));

        let err = Relation::new("R", "P", Vec::<String>::new(), "C", Vec::new()).unwrap_err();
        assert!(err.to_string().contains("no columns"));
    }
}
