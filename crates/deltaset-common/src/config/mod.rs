//! Configuration for deltaset.
//!
//! This module provides configuration structures for the changeset
//! extractor, the integrity validator, and the merge engine.

mod sync;

pub use sync::{ChangesetConfig, IntegrityConfig, MergeConfig, SyncConfig};
