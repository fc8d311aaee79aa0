//! Product record: an immutable, ordered column → scalar mapping
//!
//! Records are read once from the row source and never mutated afterwards;
//! the enrichment orchestrator produces paired `(original, enrichment)`
//! results instead of writing back into the row.

use serde::{Deserialize, Serialize};

/// A single cell value. Source rows carry strings, numbers or nothing at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Absent,
}

impl FieldValue {
    /// Text content of the cell, or `None` for numbers and absent cells.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Value rendered for an enrichment payload, verbatim for text cells.
    /// Absent cells carry nothing and are skipped by the payload builder.
    pub fn as_payload_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// One product row: column names in source order, plus an optional
/// provenance tag naming the upload/feed the row came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    columns: Vec<(String, FieldValue)>,
    source: Option<String>,
}

impl ProductRecord {
    pub fn new(columns: Vec<(String, FieldValue)>) -> Self {
        Self {
            columns,
            source: None,
        }
    }

    /// Attach the provenance tag (e.g. the uploaded file or feed name).
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Convenience constructor for text-only rows.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, value)| (name.to_string(), FieldValue::from(value)))
                .collect(),
        )
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Text content of a column, coerced to `""` when the column is missing
    /// or holds a non-text value. Detection relies on this coercion so that
    /// malformed rows are excluded from matching instead of failing it.
    pub fn text_or_empty(&self, column: &str) -> &str {
        self.get(column).and_then(FieldValue::as_text).unwrap_or("")
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_or_empty_coerces_missing_and_numeric_cells() {
        let record = ProductRecord::new(vec![
            ("sku".to_string(), FieldValue::from("A1")),
            ("preco".to_string(), FieldValue::from(12.5)),
            ("obs".to_string(), FieldValue::Absent),
        ]);

        assert_eq!(record.text_or_empty("sku"), "A1");
        assert_eq!(record.text_or_empty("preco"), "");
        assert_eq!(record.text_or_empty("obs"), "");
        assert_eq!(record.text_or_empty("nope"), "");
    }

    #[test]
    fn payload_text_skips_absent_cells() {
        assert_eq!(
            FieldValue::from("Parafuso").as_payload_text().as_deref(),
            Some("Parafuso")
        );
        assert_eq!(FieldValue::from(8.0).as_payload_text().as_deref(), Some("8"));
        assert!(FieldValue::Absent.as_payload_text().is_none());
    }

    #[test]
    fn source_tag_round_trip() {
        let record = ProductRecord::from_pairs([("sku", "A1")]).with_source("planilha-1.xlsx");
        assert_eq!(record.source(), Some("planilha-1.xlsx"));
        assert!(ProductRecord::from_pairs([("sku", "A1")]).source().is_none());
    }
}
