//! # deltaset-common
//!
//! Common types, errors, and configuration for deltaset.
//!
//! This crate provides the foundational types shared by the change-tracking
//! model and its reconciliation algorithms:
//!
//! - **Types**: the closed [`Value`] and [`DataType`] sets and [`RowId`]
//! - **Errors**: unified error handling with [`DataSetError`]
//! - **Config**: changeset, integrity, and merge settings
//!
//! ## Example
//!
//! ```rust
//! use deltaset_common::error::{DataSetError, DataSetResult};
//! use deltaset_common::types::{DataType, Value};
//!
//! fn example() -> DataSetResult<()> {
//!     let v = Value::string("Engineering");
//!     assert_eq!(v.data_type(), Some(DataType::String));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::{ChangesetConfig, IntegrityConfig, MergeConfig, SyncConfig};
pub use error::{DataSetError, DataSetResult, ErrorCode, IntegrityViolation, ViolationKind};
pub use types::{DataType, RowId, Value};
