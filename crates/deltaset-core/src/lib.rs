//! # deltaset-core
//!
//! In-memory change-tracking tables and the algorithms that reconcile them
//! with a backing store.
//!
//! - **Model**: [`Row`](model::Row), [`Table`](model::Table),
//!   [`Relation`](model::Relation), and [`DataSet`](model::DataSet), with
//!   per-row lifecycle state and lazily captured baselines
//! - **Changesets**: [`changeset::extract_changes`] trims a set down to its
//!   pending rows
//! - **Integrity**: [`integrity::validate`] checks relations against rows
//! - **Merging**: [`merge`] folds a refreshed snapshot into the current set
//!
//! Everything is synchronous and single-threaded; types are plain owned data
//! driven through `&mut` access.
//!
//! ## Example
//!
//! ```rust
//! use deltaset_common::config::ChangesetConfig;
//! use deltaset_common::error::DataSetResult;
//! use deltaset_common::types::DataType;
//! use deltaset_core::changeset;
//! use deltaset_core::model::{ColumnDescriptor, DataSet, RowState, Table};
//!
//! fn example() -> DataSetResult<()> {
//!     let mut table = Table::with_columns(
//!         "Departments",
//!         vec![
//!             ColumnDescriptor::new("Id", DataType::Int32).primary_key(),
//!             ColumnDescriptor::new("Name", DataType::String),
//!         ],
//!     )?;
//!     let mut row = table.new_row();
//!     row.set("Id", 1)?;
//!     row.set("Name", "Sales")?;
//!     table.load_row(row)?;
//!     table.set_value(0, "Name", "Marketing")?;
//!
//!     let mut set = DataSet::new();
//!     set.add_table(table)?;
//!
//!     let changes = changeset::extract_changes(&set, &ChangesetConfig::default())?;
//!     let row = changes.table("Departments")?.row(0)?;
//!     assert_eq!(row.state(), RowState::Modified);
//!     assert_eq!(row.changed_columns(), vec!["Name"]);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod changeset;
pub mod integrity;
pub mod merge;
pub mod model;

pub use merge::{MergeMode, MergeResult};
pub use model::{ColumnDescriptor, DataSet, Relation, Row, RowShape, RowState, Table};
