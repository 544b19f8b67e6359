//! Type definitions for deltaset.
//!
//! This module contains the value model shared by rows, tables, and the
//! reconciliation algorithms.

mod data_type;
mod ids;
mod value;

pub use data_type::DataType;
pub use ids::RowId;
pub use value::Value;
