//! Serde support for rows, tables, and data sets.
//!
//! Wire shapes:
//!
//! - row: `{ state, values, baseline?, partial }`
//! - table: `{ name, columns, primary_key, rows }`
//! - set: `{ tables, relations }`
//!
//! Values keep their variant tag, so a key holding `Null` and a key that is
//! absent stay distinct across a round trip. Deserialized rows receive fresh
//! [`RowId`](deltaset_common::types::RowId)s.

use deltaset_common::error::DataSetResult;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::column::ColumnDescriptor;
use super::relation::Relation;
use super::row::{Row, RowShape, RowState, ValueMap};
use super::set::DataSet;
use super::table::Table;

#[derive(Serialize)]
struct RowRef<'a> {
    state: RowState,
    values: &'a ValueMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    baseline: Option<&'a ValueMap>,
    partial: bool,
}

#[derive(Deserialize)]
struct RowOwned {
    state: RowState,
    values: ValueMap,
    #[serde(default)]
    baseline: Option<ValueMap>,
    #[serde(default)]
    partial: bool,
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RowRef {
            state: self.state(),
            values: self.values(),
            baseline: self.baseline(),
            partial: self.is_partial(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = RowOwned::deserialize(deserializer)?;
        let shape = if wire.partial {
            RowShape::Partial
        } else {
            RowShape::Full
        };
        if wire.state == RowState::Modified && wire.baseline.is_none() {
            return Err(D::Error::custom("a Modified row must carry a baseline"));
        }
        Ok(Row::from_parts(wire.state, wire.values, wire.baseline, shape))
    }
}

#[derive(Serialize)]
struct TableRef<'a> {
    name: &'a str,
    columns: &'a [ColumnDescriptor],
    primary_key: &'a [String],
    rows: &'a [Row],
}

#[derive(Deserialize)]
struct TableOwned {
    name: String,
    #[serde(default)]
    columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    primary_key: Vec<String>,
    #[serde(default)]
    rows: Vec<Row>,
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TableRef {
            name: self.name(),
            columns: self.columns(),
            primary_key: self.primary_key(),
            rows: self.rows(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = TableOwned::deserialize(deserializer)?;
        Table::from_parts(wire.name, wire.columns, wire.primary_key, wire.rows)
            .map_err(D::Error::custom)
    }
}

#[derive(Serialize)]
struct SetRef<'a> {
    tables: &'a [Table],
    relations: &'a [Relation],
}

#[derive(Deserialize)]
struct SetOwned {
    #[serde(default)]
    tables: Vec<Table>,
    #[serde(default)]
    relations: Vec<Relation>,
}

impl Serialize for DataSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SetRef {
            tables: self.tables(),
            relations: self.relations(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DataSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = SetOwned::deserialize(deserializer)?;
        let mut set = DataSet::new();
        for table in wire.tables {
            set.add_table(table).map_err(D::Error::custom)?;
        }
        for relation in wire.relations {
            relation.check().map_err(D::Error::custom)?;
            set.add_relation(relation).map_err(D::Error::custom)?;
        }
        Ok(set)
    }
}

/// Serializes a data set to JSON.
pub fn to_json(set: &DataSet) -> DataSetResult<String> {
    Ok(serde_json::to_string(set)?)
}

/// Deserializes a data set from JSON.
pub fn from_json(json: &str) -> DataSetResult<DataSet> {
    Ok(serde_json::from_str(json)?)
}
