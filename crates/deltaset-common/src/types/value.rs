//! Cell values.
//!
//! This module defines the `Value` type stored in every row cell. It is a
//! tagged union over the closed [`DataType`] set plus `Null`.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::DataType;

/// A single cell value.
///
/// Equality is structural and null-safe: `Null == Null`, and values of
/// different variants are never equal. Floats compare by bit pattern so that
/// equality and hashing agree, which makes `Value` usable as a lookup key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// NULL value.
    Null,
    /// String value.
    String(String),
    /// Boolean value.
    Boolean(bool),
    /// 8-bit signed integer.
    Int8(i8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit floating point.
    Float32(f32),
    /// 64-bit floating point.
    Float64(f64),
    /// Decimal value (stored as scaled integer).
    Decimal {
        /// Unscaled value.
        value: i128,
        /// Digits after the decimal point.
        scale: u8,
    },
    /// Date (days since epoch).
    Date(i32),
    /// Time (microseconds since midnight).
    Time(i64),
    /// Date and time (microseconds since epoch).
    DateTime(i64),
    /// 128-bit unique identifier.
    Uuid(u128),
    /// Binary data.
    Binary(Vec<u8>),
    /// Structured object.
    Json(serde_json::Value),
    /// Spatial value in well-known text.
    Spatial(String),
    /// Opaque object bytes.
    Object(Vec<u8>),
}

impl Value {
    /// Creates a NULL value.
    pub fn null() -> Self {
        Value::Null
    }

    /// Creates a string value.
    pub fn string(v: impl Into<String>) -> Self {
        Value::String(v.into())
    }

    /// Creates a boolean value.
    pub fn boolean(v: bool) -> Self {
        Value::Boolean(v)
    }

    /// Creates a 32-bit integer value.
    pub fn int32(v: i32) -> Self {
        Value::Int32(v)
    }

    /// Creates a 64-bit integer value.
    pub fn int64(v: i64) -> Self {
        Value::Int64(v)
    }

    /// Creates a 64-bit float value.
    pub fn float64(v: f64) -> Self {
        Value::Float64(v)
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the logical type of this value, or `None` for NULL.
    pub fn data_type(&self) -> Option<DataType> {
        let dt = match self {
            Value::Null => return None,
            Value::String(_) => DataType::String,
            Value::Boolean(_) => DataType::Boolean,
            Value::Int8(_) => DataType::Int8,
            Value::Int16(_) => DataType::Int16,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::Float32(_) => DataType::Float32,
            Value::Float64(_) => DataType::Float64,
            Value::Decimal { .. } => DataType::Decimal,
            Value::Date(_) => DataType::Date,
            Value::Time(_) => DataType::Time,
            Value::DateTime(_) => DataType::DateTime,
            Value::Uuid(_) => DataType::Uuid,
            Value::Binary(_) => DataType::Binary,
            Value::Json(_) => DataType::Json,
            Value::Spatial(_) => DataType::Spatial,
            Value::Object(_) => DataType::Object,
        };
        Some(dt)
    }

    /// Returns the string contents, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value widened to i64, if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(i) => Some(i64::from(*i)),
            Value::Int16(i) => Some(i64::from(*i)),
            Value::Int32(i) => Some(i64::from(*i)),
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the form used when this value is part of a row key.
    ///
    /// Integers of every width widen to `Int64` so that keys correlate across
    /// integer type drift between two snapshots.
    pub fn key_normalized(&self) -> Value {
        match self.as_i64() {
            Some(i) => Value::Int64(i),
            None => self.clone(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int8(a), Value::Int8(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (
                Value::Decimal { value: a, scale: sa },
                Value::Decimal { value: b, scale: sb },
            ) => a == b && sa == sb,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Spatial(a), Value::Spatial(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::String(s) | Value::Spatial(s) => s.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Int8(i) => i.hash(state),
            Value::Int16(i) => i.hash(state),
            Value::Int32(i) => i.hash(state),
            Value::Int64(i) => i.hash(state),
            Value::Float32(f) => f.to_bits().hash(state),
            Value::Float64(f) => f.to_bits().hash(state),
            Value::Decimal { value, scale } => {
                value.hash(state);
                scale.hash(state);
            }
            Value::Date(d) => d.hash(state),
            Value::Time(t) | Value::DateTime(t) => t.hash(state),
            Value::Uuid(u) => u.hash(state),
            Value::Binary(b) | Value::Object(b) => b.hash(state),
            Value::Json(j) => j.to_string().hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::String(s) | Value::Spatial(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int8(i) => write!(f, "{}", i),
            Value::Int16(i) => write!(f, "{}", i),
            Value::Int32(i) => write!(f, "{}", i),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Decimal { value, scale } => {
                if *scale == 0 {
                    write!(f, "{}", value)
                } else if let Some(divisor) = 10i128.checked_pow(u32::from(*scale)) {
                    let int_part = *value / divisor;
                    let frac_part = (*value % divisor).abs();
                    let sign = if *value < 0 && int_part == 0 { "-" } else { "" };
                    write!(
                        f,
                        "{}{}.{:0>width$}",
                        sign,
                        int_part,
                        frac_part,
                        width = usize::from(*scale)
                    )
                } else {
                    // The divisor does not fit in an i128.
                    write!(f, "{}e-{}", value, scale)
                }
            }
            Value::Date(d) => write!(f, "date:{}", d),
            Value::Time(t) => write!(f, "time:{}", t),
            Value::DateTime(t) => write!(f, "ts:{}", t),
            Value::Uuid(u) => write!(f, "{:032x}", u),
            Value::Binary(b) | Value::Object(b) => {
                write!(f, "0x")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::Json(j) => write!(f, "{}", j),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
