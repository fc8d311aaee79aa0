//! Registry of live runs
//!
//! Each run is an explicit `RunHandle` value owned by its caller; the
//! registry only tracks progress receivers so an operator surface can list
//! independent concurrent runs. No shared mutable run state lives here.

use std::collections::HashMap;

use tokio::sync::{RwLock, watch};
use tracing::debug;

use crate::domain::events::RunProgress;

/// Run id → progress receiver map for concurrently active runs.
#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: RwLock<HashMap<String, watch::Receiver<RunProgress>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, run_id: impl Into<String>, progress: watch::Receiver<RunProgress>) {
        let run_id = run_id.into();
        debug!("registering run {run_id}");
        self.runs.write().await.insert(run_id, progress);
    }

    pub async fn remove(&self, run_id: &str) {
        self.runs.write().await.remove(run_id);
    }

    /// Latest progress for one run.
    pub async fn progress(&self, run_id: &str) -> Option<RunProgress> {
        let runs = self.runs.read().await;
        runs.get(run_id).map(|rx| rx.borrow().clone())
    }

    /// Latest progress of every registered run that has not finished.
    pub async fn active_runs(&self) -> Vec<RunProgress> {
        let runs = self.runs.read().await;
        runs.values()
            .map(|rx| rx.borrow().clone())
            .filter(|progress| !progress.status.is_terminal())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.runs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.runs.read().await.is_empty()
    }
}
