//! Row identifiers.
//!
//! A row instance is referred to by its `RowId` rather than by a borrow, so
//! that merge reports and table lookups stay valid while the owning table is
//! mutated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Next identifier handed out by [`RowId::next`].
static NEXT_ROW_ID: AtomicU64 = AtomicU64::new(1);

/// Row identifier - uniquely identifies a row instance within the process.
///
/// # Example
///
/// ```rust
/// use deltaset_common::types::RowId;
///
/// let a = RowId::next();
/// let b = RowId::next();
/// assert_ne!(a, b);
/// assert!(a.is_valid());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RowId(u64);

impl RowId {
    /// Invalid row ID constant, used as a sentinel value.
    pub const INVALID: Self = Self(0);

    /// Allocates a fresh, process-unique row ID.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ROW_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a `RowId` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Checks if this is a valid row ID.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl fmt::Debug for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "RowId(INVALID)")
        } else {
            write!(f, "RowId({})", self.0)
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
