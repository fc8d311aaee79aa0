//! External enrichment service boundary
//!
//! The core treats enrichment as an opaque asynchronous call with no
//! assumed retry behavior; retries and per-call timeouts are the service
//! client's concern and surface here as plain errors.

use async_trait::async_trait;

use crate::domain::enrichment::{EnrichmentPayload, EnrichmentRequest};

/// Failures of a single enrichment call. Every variant is recovered at the
/// row level by the orchestrator and never aborts a batch or a run.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("enrichment call timed out after {0}ms")]
    Timeout(u64),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("service rejected the request: {0}")]
    Rejected(String),
}

/// Asynchronous text-classification/enrichment service consumed per row.
#[async_trait]
pub trait EnrichmentService: Send + Sync {
    async fn enrich(&self, request: EnrichmentRequest) -> Result<EnrichmentPayload, EnrichmentError>;
}
