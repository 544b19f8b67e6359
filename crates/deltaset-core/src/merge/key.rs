//! Correlation keys.

use std::fmt;

use deltaset_common::types::Value;

use crate::model::Row;

/// A normalized, fully non-null key built from one or more columns.
///
/// Integer parts are widened so `Int32(1)` and `Int64(1)` correlate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RowKey(Vec<Value>);

impl RowKey {
    /// Reads `columns` from `row`. Returns `None` when there are no columns
    /// or any part is absent or null.
    pub(crate) fn of(row: &Row, columns: &[String]) -> Option<Self> {
        if columns.is_empty() {
            return None;
        }
        let mut parts = Vec::with_capacity(columns.len());
        for column in columns {
            match row.get(column) {
                Some(value) if !value.is_null() => parts.push(value.key_normalized()),
                _ => return None,
            }
        }
        Some(Self(parts))
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[(&str, Value)]) -> Row {
        let mut row = Row::empty();
        for (name, value) in values {
            row.set(name, value.clone()).unwrap();
        }
        row
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_key_widens_integers() {
        let a = row(&[("Id", Value::int32(7))]);
        let b = row(&[("Id", Value::int64(7))]);
        assert_eq!(RowKey::of(&a, &cols(&["Id"])), RowKey::of(&b, &cols(&["Id"])));
    }

    #[test]
    fn test_null_or_absent_part_has_no_key() {
        let r = row(&[("A", Value::int32(1)), ("B", Value::Null)]);
        assert!(RowKey::of(&r, &cols(&["A", "B"])).is_none());
        assert!(RowKey::of(&r, &cols(&["A", "C"])).is_none());
        assert!(RowKey::of(&r, &[]).is_none());
    }

    #[test]
    fn test_display() {
        let r = row(&[("A", Value::int32(1)), ("B", Value::string("X"))]);
        let key = RowKey::of(&r, &cols(&["A", "B"])).unwrap();
        assert_eq!(key.to_string(), "(1, X)");
    }
}
