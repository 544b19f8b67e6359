//! Logical column types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical types a column may declare.
///
/// The set is closed: every [`Value`](super::Value) other than `Null` maps to
/// exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Unicode string.
    String,
    /// Boolean.
    Boolean,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// Fixed-point decimal.
    Decimal,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    DateTime,
    /// 128-bit unique identifier.
    Uuid,
    /// Binary blob.
    Binary,
    /// Opaque structured object (JSON document).
    Json,
    /// Spatial value.
    Spatial,
    /// Opaque object.
    Object,
}

impl DataType {
    /// Returns true if this type is an integer type.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(self, DataType::Float32 | DataType::Float64 | DataType::Decimal)
    }

    /// Returns true if this type is a temporal type.
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Time | DataType::DateTime)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::String => "STRING",
            DataType::Boolean => "BOOLEAN",
            DataType::Int8 => "INT8",
            DataType::Int16 => "INT16",
            DataType::Int32 => "INT32",
            DataType::Int64 => "INT64",
            DataType::Float32 => "FLOAT32",
            DataType::Float64 => "FLOAT64",
            DataType::Decimal => "DECIMAL",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::DateTime => "DATETIME",
            DataType::Uuid => "UUID",
            DataType::Binary => "BINARY",
            DataType::Json => "JSON",
            DataType::Spatial => "SPATIAL",
            DataType::Object => "OBJECT",
        };
        write!(f, "{}", name)
    }
}
