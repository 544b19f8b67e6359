//! Referential integrity violation records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{RowId, Value};

/// The kind of referential integrity violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    /// A relation names a table the set does not contain.
    MissingTable,
    /// A relation names a column its table does not declare.
    MissingColumn,
    /// A child row has no matching parent row.
    Orphan,
    /// A deleted parent row still has live child rows.
    RestrictedDelete,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::MissingTable => write!(f, "missing table"),
            ViolationKind::MissingColumn => write!(f, "missing column"),
            ViolationKind::Orphan => write!(f, "orphan"),
            ViolationKind::RestrictedDelete => write!(f, "restricted delete"),
        }
    }
}

/// A single violation found while validating a data set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityViolation {
    /// What went wrong.
    pub kind: ViolationKind,
    /// Name of the relation being checked.
    pub relation: String,
    /// Table the offending row (or missing name) belongs to.
    pub table: String,
    /// The offending row, when the violation is row-level.
    pub row_id: Option<RowId>,
    /// Key values of the offending row on the relation's columns.
    pub key: Vec<Value>,
    /// Human-readable description.
    pub message: String,
}

impl IntegrityViolation {
    /// Creates a violation that is not tied to a row.
    pub fn new(
        kind: ViolationKind,
        relation: impl Into<String>,
        table: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            relation: relation.into(),
            table: table.into(),
            row_id: None,
            key: Vec::new(),
            message: message.into(),
        }
    }

    /// Attaches the offending row and its key values.
    #[must_use]
    pub fn with_row(mut self, row_id: RowId, key: Vec<Value>) -> Self {
        self.row_id = Some(row_id);
        self.key = key;
        self
    }
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.relation, self.kind, self.message)
    }
}
