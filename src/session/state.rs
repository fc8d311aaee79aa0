//! In-memory run state and its durable snapshot mirror
//!
//! `RunState` is exclusively owned by the orchestrator's control task for
//! the duration of a run. `RunSnapshot` is the eventually-consistent copy
//! handed to the checkpoint store at state transitions and read back only
//! to resume after an interruption.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::enrichment::EnrichmentResult;
use crate::domain::events::RunStatus;

/// Live state of one enrichment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub status: RunStatus,
    pub total_items: usize,
    /// Monotonically non-decreasing within a run.
    pub items_processed: usize,
}

impl RunState {
    pub fn new(total_items: usize) -> Self {
        Self {
            status: RunStatus::Pending,
            total_items,
            items_processed: 0,
        }
    }
}

/// Durable snapshot persisted at checkpoints: state plus the results
/// aggregated so far. A resumed run loses at most the delta since the last
/// successful checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub run_id: String,
    pub status: RunStatus,
    pub total_items: usize,
    pub items_processed: usize,
    pub results: Vec<EnrichmentResult>,
    pub updated_at: DateTime<Utc>,
}

impl RunSnapshot {
    pub fn new(
        run_id: impl Into<String>,
        state: &RunState,
        results: Vec<EnrichmentResult>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            status: state.status,
            total_items: state.total_items,
            items_processed: state.items_processed,
            results,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_runs_start_pending_with_zero_progress() {
        let state = RunState::new(42);
        assert_eq!(state.status, RunStatus::Pending);
        assert_eq!(state.total_items, 42);
        assert_eq!(state.items_processed, 0);
    }

    #[test]
    fn snapshot_mirrors_state_counters() {
        let mut state = RunState::new(3);
        state.status = RunStatus::Processing;
        state.items_processed = 2;

        let snapshot = RunSnapshot::new("run-1", &state, Vec::new());
        assert_eq!(snapshot.status, RunStatus::Processing);
        assert_eq!(snapshot.items_processed, 2);
        assert_eq!(snapshot.total_items, 3);
    }
}
