//! Per-column fill-rate statistics and base overview metrics
//!
//! Feeds the diagnostic dashboard: how well a column is filled, how many
//! distinct values it holds, and how many rows share the key column value.
//! Pure computation with the same degradation policy as detection: absent
//! or malformed cells are simply skipped.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::record::{FieldValue, ProductRecord};
use crate::domain::schema::ColumnRoleMap;

/// How many example values to surface per column.
const EXAMPLE_LIMIT: usize = 5;

/// Statistics for one column of the row set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    pub total: usize,
    pub filled: usize,
    pub empty: usize,
    /// Formatted percentage, e.g. `"97.5%"`.
    pub fill_rate: String,
    pub unique_values: usize,
    /// First few non-absent values, in row order.
    pub examples: Vec<String>,
}

/// Header metrics for the diagnostic overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseOverview {
    pub total_items: usize,
    pub column_count: usize,
    /// Distinct non-empty key values, when a key column is configured.
    pub distinct_keys: Option<usize>,
    /// `total_items - distinct_keys`: rows that may be key duplicates.
    pub possible_duplicates: Option<usize>,
}

/// Profile one column. Returns `None` when no row carries the column.
pub fn analyze_column(rows: &[ProductRecord], column: &str) -> Option<ColumnStats> {
    if !rows.iter().any(|row| row.get(column).is_some()) {
        return None;
    }

    let total = rows.len();
    let mut filled = 0usize;
    let mut unique: HashSet<String> = HashSet::new();
    let mut examples: Vec<String> = Vec::new();

    for row in rows {
        let Some(value) = row.get(column) else {
            continue;
        };
        let Some(text) = value.as_payload_text() else {
            continue;
        };
        if matches!(value, FieldValue::Text(t) if t.trim().is_empty()) {
            continue;
        }
        filled += 1;
        if examples.len() < EXAMPLE_LIMIT {
            examples.push(text.clone());
        }
        unique.insert(text);
    }

    let fill_rate = if total > 0 {
        format!("{:.1}%", (filled as f64 / total as f64) * 100.0)
    } else {
        "0.0%".to_string()
    };

    Some(ColumnStats {
        column: column.to_string(),
        total,
        filled,
        empty: total - filled,
        fill_rate,
        unique_values: unique.len(),
        examples,
    })
}

/// Overview metrics across the whole row set.
pub fn overview(rows: &[ProductRecord], roles: &ColumnRoleMap) -> BaseOverview {
    let mut columns: HashSet<&str> = HashSet::new();
    for row in rows {
        columns.extend(row.column_names());
    }

    let distinct_keys = roles.key_column().map(|key_column| {
        rows.iter()
            .map(|row| row.text_or_empty(key_column).trim())
            .filter(|key| !key.is_empty())
            .collect::<HashSet<_>>()
            .len()
    });

    BaseOverview {
        total_items: rows.len(),
        column_count: columns.len(),
        distinct_keys,
        possible_duplicates: distinct_keys.map(|keys| rows.len().saturating_sub(keys)),
    }
}
