//! The change-tracking data model.
//!
//! Leaf to root: [`ColumnDescriptor`] -> [`Row`] -> [`Table`] ->
//! {[`Relation`], [`DataSet`]}.

mod column;
mod relation;
mod row;
mod set;
mod table;
mod wire;

pub use column::{ColumnDescriptor, DisplayHints, ForeignKeyRef};
pub use relation::Relation;
pub use row::{Row, RowShape, RowState, ValueMap};
pub use set::DataSet;
pub use table::Table;
pub use wire::{from_json, to_json};

pub(crate) use row::find_key;
