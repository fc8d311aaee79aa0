//! Column role classification supplied by the configuration subsystem
//!
//! Each column of the row source is classified before a run starts. Only
//! `Analyze` columns enter the enrichment payload, and locked/protected
//! columns (price, stock, ...) are never eligible for the key/text roles of
//! duplicate detection even when their names look like candidates.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// What the pipeline is allowed to do with a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Column is carried through untouched.
    Ignore,
    /// Column participates in the enrichment payload.
    Analyze,
    /// Column may be filled by enrichment when the source cell is empty.
    FillEmpty,
    /// Column falls back to an operator-supplied default.
    UseDefault,
}

/// Validation failures raised before any run state is created.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoleMapError {
    #[error("no column is marked 'analyze'; nothing would be enriched")]
    NoAnalyzeColumns,

    #[error("locked column '{0}' cannot serve as the unique-key column")]
    LockedKeyColumn(String),

    #[error("locked column '{0}' cannot serve as the comparable-text column")]
    LockedTextColumn(String),
}

/// Column classification for one row set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnRoleMap {
    roles: BTreeMap<String, ColumnRole>,
    locked: BTreeSet<String>,
    key_column: Option<String>,
    text_column: Option<String>,
}

impl ColumnRoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_role(mut self, column: impl Into<String>, role: ColumnRole) -> Self {
        self.roles.insert(column.into(), role);
        self
    }

    /// Mark a column as locked/protected (price, stock, ...).
    #[must_use]
    pub fn with_locked(mut self, column: impl Into<String>) -> Self {
        self.locked.insert(column.into());
        self
    }

    /// Column holding the unique key (SKU/code) for exact matching.
    #[must_use]
    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = Some(column.into());
        self
    }

    /// Column holding the comparable free text (name/description).
    #[must_use]
    pub fn with_text_column(mut self, column: impl Into<String>) -> Self {
        self.text_column = Some(column.into());
        self
    }

    pub fn role(&self, column: &str) -> ColumnRole {
        self.roles
            .get(column)
            .copied()
            .unwrap_or(ColumnRole::Ignore)
    }

    pub fn is_locked(&self, column: &str) -> bool {
        self.locked.contains(column)
    }

    /// Key column for exact matching; locked columns never qualify.
    pub fn key_column(&self) -> Option<&str> {
        self.key_column
            .as_deref()
            .filter(|column| !self.is_locked(column))
    }

    /// Comparable text column for near matching; locked columns never qualify.
    pub fn text_column(&self) -> Option<&str> {
        self.text_column
            .as_deref()
            .filter(|column| !self.is_locked(column))
    }

    /// Columns whose values are sent to the enrichment service, in name order.
    pub fn analyze_columns(&self) -> impl Iterator<Item = &str> {
        self.roles
            .iter()
            .filter(|(_, role)| **role == ColumnRole::Analyze)
            .map(|(name, _)| name.as_str())
    }

    /// Synchronous validation run before any orchestrator state exists.
    pub fn validate(&self) -> Result<(), RoleMapError> {
        if self.analyze_columns().next().is_none() {
            return Err(RoleMapError::NoAnalyzeColumns);
        }
        if let Some(key) = self.key_column.as_deref() {
            if self.is_locked(key) {
                return Err(RoleMapError::LockedKeyColumn(key.to_string()));
            }
        }
        if let Some(text) = self.text_column.as_deref() {
            if self.is_locked(text) {
                return Err(RoleMapError::LockedTextColumn(text.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles() -> ColumnRoleMap {
        ColumnRoleMap::new()
            .with_role("nome", ColumnRole::Analyze)
            .with_role("preco", ColumnRole::Ignore)
            .with_key_column("sku")
            .with_text_column("nome")
    }

    #[test]
    fn validation_passes_for_a_plain_setup() {
        assert!(roles().validate().is_ok());
    }

    #[test]
    fn analyze_is_required() {
        let map = ColumnRoleMap::new().with_key_column("sku");
        assert_eq!(map.validate(), Err(RoleMapError::NoAnalyzeColumns));
    }

    #[test]
    fn locked_columns_lose_key_and_text_roles() {
        let map = roles().with_locked("sku");
        assert_eq!(map.key_column(), None);
        assert_eq!(
            map.validate(),
            Err(RoleMapError::LockedKeyColumn("sku".to_string()))
        );

        let map = roles().with_locked("nome");
        assert_eq!(map.text_column(), None);
        assert_eq!(
            map.validate(),
            Err(RoleMapError::LockedTextColumn("nome".to_string()))
        );
    }

    #[test]
    fn unclassified_columns_default_to_ignore() {
        assert_eq!(roles().role("estoque"), ColumnRole::Ignore);
    }
}
