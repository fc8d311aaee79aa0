//! Enrichment request/response payloads and the per-row result
//!
//! `EnrichmentResult` is the immutable output of the orchestrator: exactly
//! one per processed row per run. The operator-set `validated` flag lives in
//! the review UI, outside this crate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Payload sent to the external enrichment service for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentRequest {
    /// Source row index, echoed back by the service.
    pub row_id: usize,
    /// The `analyze`-marked field subset, name-sorted.
    pub fields: BTreeMap<String, String>,
    /// Domain abbreviation context (e.g. "PARAF" → "parafuso").
    pub abbreviations: BTreeMap<String, String>,
}

/// Successful response from the enrichment service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentPayload {
    /// Inferred field name → value.
    pub fields: BTreeMap<String, String>,
    /// Service-reported confidence in `[0, 1]`, when the service provides one.
    pub confidence: Option<f64>,
}

/// Outcome of enriching one row. Both hard failures and "succeeded but
/// uncertain" collapse into `needs_review = true`; the reason text tells
/// them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub source_index: usize,
    pub fields: BTreeMap<String, String>,
    pub needs_review: bool,
    pub review_reason: Option<String>,
    pub latency_ms: Option<u64>,
}

impl EnrichmentResult {
    /// Clean result from a confident service response.
    pub fn accepted(source_index: usize, fields: BTreeMap<String, String>, latency_ms: u64) -> Self {
        Self {
            source_index,
            fields,
            needs_review: false,
            review_reason: None,
            latency_ms: Some(latency_ms),
        }
    }

    /// Reviewable result: per-row failure or explicit low-confidence signal.
    pub fn for_review(
        source_index: usize,
        fields: BTreeMap<String, String>,
        reason: impl Into<String>,
        latency_ms: Option<u64>,
    ) -> Self {
        Self {
            source_index,
            fields,
            needs_review: true,
            review_reason: Some(reason.into()),
            latency_ms,
        }
    }

    /// Re-address a cached result to another source row.
    #[must_use]
    pub fn reindexed(&self, source_index: usize) -> Self {
        Self {
            source_index,
            fields: self.fields.clone(),
            needs_review: self.needs_review,
            review_reason: self.review_reason.clone(),
            latency_ms: Some(0),
        }
    }
}
