//! Synchronization configuration structures.
//!
//! These structures define every tunable aspect of changeset extraction,
//! integrity validation, and snapshot merging.

use serde::{Deserialize, Serialize};

use crate::error::{DataSetError, DataSetResult};

/// Top-level synchronization configuration.
///
/// # Example
///
/// ```rust
/// use deltaset_common::config::SyncConfig;
///
/// let config = SyncConfig::default();
/// assert!(config.integrity.nulls_are_unset);
/// assert!(config.merge.add_missing_tables);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Changeset extraction settings.
    pub changeset: ChangesetConfig,

    /// Referential integrity settings.
    pub integrity: IntegrityConfig,

    /// Merge settings.
    pub merge: MergeConfig,
}

impl SyncConfig {
    /// Creates a configuration that uses the same client-correlation column
    /// for changeset extraction and post-save merging.
    #[must_use]
    pub fn with_correlation_column(column: impl Into<String>) -> Self {
        let column = column.into();
        Self {
            changeset: ChangesetConfig {
                correlation_column: Some(column.clone()),
                ..Default::default()
            },
            merge: MergeConfig {
                correlation_column: Some(column),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> DataSetResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> DataSetResult<()> {
        check_column_name(
            "changeset.correlation_column",
            self.changeset.correlation_column.as_deref(),
        )?;
        check_column_name("merge.correlation_column", self.merge.correlation_column.as_deref())?;
        Ok(())
    }
}

fn check_column_name(field: &str, name: Option<&str>) -> DataSetResult<()> {
    match name {
        Some(n) if n.trim().is_empty() => Err(DataSetError::InvalidConfig {
            message: format!("{} must not be empty", field),
        }),
        _ => Ok(()),
    }
}

/// Changeset extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangesetConfig {
    /// Client-correlation column carried by Modified and Deleted rows so the
    /// backing store can echo it back in a save acknowledgement.
    /// Default: None
    pub correlation_column: Option<String>,

    /// Keep tables with no pending rows in the changeset (schema only).
    /// Default: false
    pub include_unchanged_tables: bool,
}

/// Referential integrity validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityConfig {
    /// Skip relations whose parent or child table is missing instead of
    /// reporting them.
    /// Default: false
    pub ignore_missing_tables: bool,

    /// Check Deleted child rows as well as live ones.
    /// Default: false
    pub include_deleted_children: bool,

    /// A child whose foreign-key values are all null is "not set" and
    /// exempt from the parent check.
    /// Default: true
    pub nulls_are_unset: bool,

    /// Report Deleted parent rows that still have live children.
    /// Default: false
    pub restrict_parent_delete: bool,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            ignore_missing_tables: false,
            include_deleted_children: false,
            nulls_are_unset: true,
            restrict_parent_delete: false,
        }
    }
}

impl IntegrityConfig {
    /// Creates a configuration that also enforces delete-restrict.
    #[must_use]
    pub fn restrict() -> Self {
        Self {
            restrict_parent_delete: true,
            ..Default::default()
        }
    }
}

/// Merge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Client-correlation column used by post-save merging when the backing
    /// store assigned the primary key.
    /// Default: None
    pub correlation_column: Option<String>,

    /// Add tables that exist only in the refreshed set.
    /// Default: true
    pub add_missing_tables: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            correlation_column: None,
            add_missing_tables: true,
        }
    }
}
