//! Catalog Refinery - Product Catalog Cleanup and Enrichment Core
//!
//! Ingests product rows from a spreadsheet or ERP feed, detects exact and
//! near-duplicate entries, and drives unresolved fields through an external
//! text-classification service with bounded concurrency, caching,
//! pause/resume/cancel control and crash-recoverable checkpointing.
//!
//! The surrounding application (upload screens, review tables, export) is a
//! thin shell over the engines in this crate.

// Module declarations
pub mod analysis;
pub mod config;
pub mod dedup;
pub mod domain;
pub mod enrichment;
pub mod logging;
pub mod session;

// Re-export the operator-facing surface for easier access
pub use analysis::{BaseOverview, ColumnStats};
pub use config::{DetectionConfig, ValidatedRunConfig};
pub use dedup::DuplicateDetectionEngine;
pub use domain::{
    ColumnRole, ColumnRoleMap, DuplicateGroup, DuplicateKind, DuplicateReport, EnrichmentPayload,
    EnrichmentRequest, EnrichmentResult, FieldValue, LogEntry, LogLevel, ProductRecord,
    RunProgress, RunStatus,
};
pub use enrichment::{
    ControlError, EnrichmentCache, EnrichmentError, EnrichmentOrchestrator, EnrichmentService,
    RunHandle, RunOptions, RunOutcome, StartError,
};
pub use session::{
    CheckpointStore, JsonCheckpointStore, MemoryCheckpointStore, RunRegistry, RunSnapshot,
};
