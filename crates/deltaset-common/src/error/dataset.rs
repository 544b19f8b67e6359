//! Data set error types.
//!
//! Provides the error type shared by the row model, the changeset extractor,
//! the integrity validator, and the merge engine.

use std::fmt;
use thiserror::Error;

use super::violation::IntegrityViolation;
use crate::types::{DataType, RowId};

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Unknown or unspecified error.
    Unknown = 0x0000,
    /// Internal error (bug).
    Internal = 0x0001,
    /// Invalid argument provided.
    InvalidArgument = 0x0002,
    /// Invalid configuration.
    InvalidConfig = 0x0003,
    /// Wire form could not be encoded or decoded.
    Serialization = 0x0004,

    // Precondition errors (0x0100 - 0x01FF)
    /// Operation not allowed in the current lifecycle state.
    InvalidOperation = 0x0100,
    /// Same-name columns with differing declared types.
    SchemaMismatch = 0x0101,

    // Lookup errors (0x0200 - 0x02FF)
    /// Table not found.
    TableNotFound = 0x0200,
    /// Column not found.
    ColumnNotFound = 0x0201,
    /// Relation not found.
    RelationNotFound = 0x0202,
    /// Row not found.
    RowNotFound = 0x0203,

    // Range errors (0x0300 - 0x03FF)
    /// Row position out of bounds.
    RowIndexOutOfRange = 0x0300,

    // Integrity errors (0x0400 - 0x04FF)
    /// One or more referential integrity violations.
    IntegrityViolation = 0x0400,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Precondition",
            0x02 => "Lookup",
            0x03 => "Range",
            0x04 => "Integrity",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for deltaset.
///
/// Every failure is synchronous and surfaced immediately. Precondition
/// violations (forbidden lifecycle transitions, dirty tables under a
/// dirty-gated merge) are reported as [`DataSetError::InvalidOperation`];
/// unknown names are lookup failures; bad row positions are range failures.
///
/// # Example
///
/// ```rust
/// use deltaset_common::error::{DataSetError, DataSetResult};
///
/// fn lookup(name: &str) -> DataSetResult<()> {
///     Err(DataSetError::TableNotFound { table: name.to_string() })
/// }
///
/// assert!(lookup("Orders").unwrap_err().is_not_found());
/// ```
#[derive(Debug, Error)]
pub enum DataSetError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    /// Wire form encoding or decoding failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// The underlying serde_json error.
        #[from]
        source: serde_json::Error,
    },

    // ==========================================================================
    // Precondition Errors
    // ==========================================================================
    /// Operation is not allowed in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Error message.
        message: String,
    },

    /// Same-name columns declare different types.
    #[error("column '{column}' in table '{table}' is {current} but refreshed data declares {refreshed}")]
    SchemaMismatch {
        /// The table name.
        table: String,
        /// The column name.
        column: String,
        /// Type declared by the current table.
        current: DataType,
        /// Type declared by the refreshed table.
        refreshed: DataType,
    },

    // ==========================================================================
    // Lookup Errors
    // ==========================================================================
    /// Table not found.
    #[error("table '{table}' not found")]
    TableNotFound {
        /// The missing table.
        table: String,
    },

    /// Column not found.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound {
        /// The missing column.
        column: String,
        /// The table name.
        table: String,
    },

    /// Column absent from a row that is not bound to a table.
    #[error("column '{column}' not present in row")]
    ColumnAbsent {
        /// The missing column.
        column: String,
    },

    /// Relation not found.
    #[error("relation '{relation}' not found")]
    RelationNotFound {
        /// The missing relation.
        relation: String,
    },

    /// Row not found.
    #[error("row {row_id} not found in table '{table}'")]
    RowNotFound {
        /// The missing row.
        row_id: RowId,
        /// The table name.
        table: String,
    },

    // ==========================================================================
    // Range Errors
    // ==========================================================================
    /// Row position is out of bounds.
    #[error("row index {index} out of range for table of {len} rows")]
    RowIndexOutOfRange {
        /// The requested position.
        index: usize,
        /// Number of rows in the table.
        len: usize,
    },

    // ==========================================================================
    // Integrity Errors
    // ==========================================================================
    /// Referential integrity check failed.
    #[error("{} integrity violation(s): {}", .violations.len(), summarize(.violations))]
    IntegrityViolations {
        /// Every violation found, in discovery order.
        violations: Vec<IntegrityViolation>,
    },
}

fn summarize(violations: &[IntegrityViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl DataSetError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::Serialization { .. } => ErrorCode::Serialization,
            Self::InvalidOperation { .. } => ErrorCode::InvalidOperation,
            Self::SchemaMismatch { .. } => ErrorCode::SchemaMismatch,
            Self::TableNotFound { .. } => ErrorCode::TableNotFound,
            Self::ColumnNotFound { .. } | Self::ColumnAbsent { .. } => ErrorCode::ColumnNotFound,
            Self::RelationNotFound { .. } => ErrorCode::RelationNotFound,
            Self::RowNotFound { .. } => ErrorCode::RowNotFound,
            Self::RowIndexOutOfRange { .. } => ErrorCode::RowIndexOutOfRange,
            Self::IntegrityViolations { .. } => ErrorCode::IntegrityViolation,
        }
    }

    /// Returns true for precondition violations.
    ///
    /// Integrity failures raised through the "raise if any" entry point
    /// count as invalid operations as well.
    #[must_use]
    pub const fn is_invalid_operation(&self) -> bool {
        matches!(
            self,
            Self::InvalidOperation { .. }
                | Self::SchemaMismatch { .. }
                | Self::IntegrityViolations { .. }
        )
    }

    /// Returns true for unknown table, column, relation, or row lookups.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TableNotFound { .. }
                | Self::ColumnNotFound { .. }
                | Self::ColumnAbsent { .. }
                | Self::RelationNotFound { .. }
                | Self::RowNotFound { .. }
        )
    }

    /// Returns true for out-of-bounds row positions.
    #[must_use]
    pub const fn is_out_of_range(&self) -> bool {
        matches!(self, Self::RowIndexOutOfRange { .. })
    }

    /// Returns the collected violations, if this is an integrity failure.
    #[must_use]
    pub fn violations(&self) -> Option<&[IntegrityViolation]> {
        match self {
            Self::IntegrityViolations { violations } => Some(violations),
            _ => None,
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a column-not-found error.
    #[must_use]
    pub fn column_not_found(column: impl Into<String>, table: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
            table: table.into(),
        }
    }

    /// Creates an error for a column a row does not hold.
    #[must_use]
    pub fn column_absent(column: impl Into<String>) -> Self {
        Self::ColumnAbsent {
            column: column.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;

    #[test]
    fn test_error_code() {
        let err = DataSetError::TableNotFound {
            table: "Orders".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::TableNotFound);
        assert_eq!(err.code().category(), "Lookup");
        assert_eq!(
            ErrorCode::RowIndexOutOfRange.category(),
            "Range"
        );
    }

    #[test]
    fn test_error_display() {
        let err = DataSetError::ColumnNotFound {
            column: "Name".to_string(),
            table: "Departments".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "column 'Name' not found in table 'Departments'"
        );

        let err = DataSetError::column_absent("Name");
        assert_eq!(err.to_string(), "column 'Name' not present in row");
        assert_eq!(err.code(), ErrorCode::ColumnNotFound);

        let err = DataSetError::RowIndexOutOfRange { index: 5, len: 2 };
        assert_eq!(err.to_string(), "row index 5 out of range for table of 2 rows");
    }

    #[test]
    fn test_predicates() {
        assert!(DataSetError::invalid_operation("nope").is_invalid_operation());
        assert!(DataSetError::column_not_found("a", "t").is_not_found());
        assert!(DataSetError::column_absent("a").is_not_found());
        assert!(DataSetError::RowIndexOutOfRange { index: 1, len: 0 }.is_out_of_range());
        assert!(!DataSetError::internal("bug").is_invalid_operation());
    }

    #[test]
    fn test_integrity_error_carries_violations() {
        let violation = IntegrityViolation::new(
            ViolationKind::MissingTable,
            "FK_Orders_Customers",
            "Customers",
            "parent table 'Customers' not found",
        );
        let err = DataSetError::IntegrityViolations {
            violations: vec![violation],
        };
        assert!(err.is_invalid_operation());
        assert_eq!(err.code().category(), "Integrity");
        assert_eq!(err.violations().map(<[_]>::len), Some(1));
        assert!(err.to_string().starts_with("1 integrity violation(s)"));
    }

    #[test]
    fn test_serde_error_from() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: DataSetError = json_err.into();
        assert_eq!(err.code(), ErrorCode::Serialization);
    }
}
