//! Batch enrichment: external service boundary, run-scoped cache and the
//! orchestrator that drives rows through the service.

pub mod cache;
pub mod orchestrator;
pub mod service;

pub use cache::{ContentDigest, EnrichmentCache};
pub use orchestrator::{
    ControlError, EnrichmentOrchestrator, RunHandle, RunOptions, RunOutcome, StartError,
};
pub use service::{EnrichmentError, EnrichmentService};
