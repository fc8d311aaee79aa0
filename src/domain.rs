//! Domain module - core data model for catalog cleanup and enrichment
//!
//! Plain data structures shared by the duplicate detection engine, the batch
//! enrichment orchestrator and the session layer. Everything here is pure
//! data with serde support; no I/O happens in this module tree.

pub mod dedup;
pub mod enrichment;
pub mod events;
pub mod record;
pub mod schema;

pub use dedup::{DuplicateGroup, DuplicateKind, DuplicateReport};
pub use enrichment::{EnrichmentPayload, EnrichmentRequest, EnrichmentResult};
pub use events::{LogEntry, LogLevel, RollingLog, RunProgress, RunStatus};
pub use record::{FieldValue, ProductRecord};
pub use schema::{ColumnRole, ColumnRoleMap, RoleMapError};
