//! Error handling for deltaset.
//!
//! This module provides a unified error type and result alias used
//! by every model operation and reconciliation algorithm.

mod dataset;
mod violation;

pub use dataset::{DataSetError, ErrorCode};
pub use violation::{IntegrityViolation, ViolationKind};

/// Result type alias for deltaset operations.
pub type DataSetResult<T> = std::result::Result<T, DataSetError>;
