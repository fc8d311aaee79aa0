//! Duplicate detection: similarity index plus the detection engine
//!
//! Pure computation over in-memory rows; no network or persistent I/O.

pub mod engine;
pub mod similarity;

pub use engine::DuplicateDetectionEngine;
pub use similarity::{fingerprint, similarity};
