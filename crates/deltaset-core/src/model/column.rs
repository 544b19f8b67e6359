//! Column descriptors.
//!
//! A descriptor is static per-column metadata. Tables own their
//! descriptors; copying a schema clones them, so no descriptor is ever shared
//! between two tables.

use std::fmt;

use deltaset_common::types::{DataType, Value};
use serde::{Deserialize, Serialize};

/// Reference from a foreign-key column to the column it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub column: String,
}

/// Presentation hints. Never interpreted by the model itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayHints {
    /// Caption shown instead of the column name.
    pub caption: Option<String>,
    /// Format string for rendering values.
    pub format: Option<String>,
    /// Hide the column by default.
    pub hidden: bool,
    /// Render the column read-only.
    pub read_only: bool,
}

/// Metadata for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name. Identity is case-sensitive, lookup is not.
    pub name: String,
    /// Logical type.
    pub data_type: DataType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Part of the table's primary key.
    pub primary_key: bool,
    /// Referenced table and column, if this is a foreign key.
    pub foreign_key: Option<ForeignKeyRef>,
    /// Maximum length for string and binary values.
    pub max_length: Option<u32>,
    /// Total digits for decimal values.
    pub precision: Option<u8>,
    /// Digits after the decimal point.
    pub scale: Option<u8>,
    /// Value used for rows created from the schema.
    pub default_value: Option<Value>,
    /// Presentation hints.
    pub display: DisplayHints,
}

impl ColumnDescriptor {
    /// Creates a nullable, non-key column.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
            foreign_key: None,
            max_length: None,
            precision: None,
            scale: None,
            default_value: None,
            display: DisplayHints::default(),
        }
    }

    /// Marks the column as part of the primary key (implies NOT NULL).
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Marks the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as a foreign key referencing `table.column`.
    #[must_use]
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKeyRef {
            table: table.into(),
            column: column.into(),
        });
        self
    }

    /// Sets the maximum length.
    #[must_use]
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets decimal precision and scale.
    #[must_use]
    pub fn with_precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets the display caption.
    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.display.caption = Some(caption.into());
        self
    }

    /// Returns true if this is a foreign-key column.
    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key.is_some()
    }

    /// Returns true if `name` refers to this column (case-insensitive).
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Value a freshly created row holds for this column.
    pub fn default_or_null(&self) -> Value {
        self.default_value.clone().unwrap_or(Value::Null)
    }
}

impl fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}{}{}",
            self.name,
            self.data_type,
            if self.nullable { "" } else { " NOT NULL" },
            if self.primary_key { " PRIMARY KEY" } else { "" }
        )
    }
}

/// Finds the position of a column by name.
///
/// An exact match wins over a case-insensitive one.
pub(crate) fn position_of(columns: &[ColumnDescriptor], name: &str) -> Option<usize> {
    columns
        .iter()
        .position(|c| c.name == name)
        .or_else(|| columns.iter().position(|c| c.matches(name)))
}
