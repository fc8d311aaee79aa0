//! Session checkpoint store: durable mirror of run progress
//!
//! Checkpointing is a resume convenience, not a correctness requirement:
//! the orchestrator logs and continues when a store call fails. Updates
//! happen at explicit state transitions (batch completion, pause, resume,
//! cancel, completion), never per row, to bound write amplification.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::state::RunSnapshot;

/// Store-level failures; always non-fatal to the run that hits them.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("checkpoint I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// External store of run snapshots keyed by session id.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Allocate a session for a run over `total_items` rows.
    async fn create(&self, total_items: usize) -> Result<String, CheckpointError>;

    /// Overwrite the stored snapshot for `session_id`.
    async fn update(&self, session_id: &str, snapshot: RunSnapshot) -> Result<(), CheckpointError>;

    /// Read a snapshot back; `None` when the session was never checkpointed.
    async fn load(&self, session_id: &str) -> Result<Option<RunSnapshot>, CheckpointError>;
}

/// In-memory store for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    sessions: RwLock<HashMap<String, Option<RunSnapshot>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn create(&self, total_items: usize) -> Result<String, CheckpointError> {
        let session_id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.clone(), None);
        info!("📝 Created checkpoint session {session_id} for {total_items} items");
        Ok(session_id)
    }

    async fn update(&self, session_id: &str, snapshot: RunSnapshot) -> Result<(), CheckpointError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(slot) => {
                *slot = Some(snapshot);
                Ok(())
            }
            None => Err(CheckpointError::NotFound(session_id.to_string())),
        }
    }

    async fn load(&self, session_id: &str) -> Result<Option<RunSnapshot>, CheckpointError> {
        let sessions = self.sessions.read().await;
        match sessions.get(session_id) {
            Some(slot) => Ok(slot.clone()),
            None => Err(CheckpointError::NotFound(session_id.to_string())),
        }
    }
}

/// One JSON file per session under a base directory. Good enough for a
/// desktop deployment; the file is rewritten wholesale at each checkpoint.
#[derive(Debug)]
pub struct JsonCheckpointStore {
    base_dir: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.base_dir.join(format!("{session_id}.json"))
    }
}

#[async_trait]
impl CheckpointStore for JsonCheckpointStore {
    async fn create(&self, total_items: usize) -> Result<String, CheckpointError> {
        let session_id = Uuid::new_v4().to_string();
        tokio::fs::create_dir_all(&self.base_dir).await?;
        tokio::fs::write(self.session_path(&session_id), b"null").await?;
        info!("📝 Created checkpoint file for session {session_id} ({total_items} items)");
        Ok(session_id)
    }

    async fn update(&self, session_id: &str, snapshot: RunSnapshot) -> Result<(), CheckpointError> {
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        tokio::fs::write(self.session_path(session_id), bytes).await?;
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<RunSnapshot>, CheckpointError> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Err(CheckpointError::NotFound(session_id.to_string()));
        }
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::events::RunStatus;
    use crate::session::state::RunState;

    use super::*;

    fn snapshot(run_id: &str, processed: usize) -> RunSnapshot {
        let mut state = RunState::new(10);
        state.status = RunStatus::Processing;
        state.items_processed = processed;
        RunSnapshot::new(run_id, &state, Vec::new())
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryCheckpointStore::new();
        let session_id = store.create(10).await.expect("create");

        assert!(store.load(&session_id).await.expect("load").is_none());

        store
            .update(&session_id, snapshot("run-1", 4))
            .await
            .expect("update");
        let loaded = store.load(&session_id).await.expect("load").expect("some");
        assert_eq!(loaded.items_processed, 4);
    }

    #[tokio::test]
    async fn memory_store_rejects_unknown_sessions() {
        let store = MemoryCheckpointStore::new();
        assert!(matches!(
            store.update("missing", snapshot("run-1", 0)).await,
            Err(CheckpointError::NotFound(_))
        ));
        assert!(matches!(
            store.load("missing").await,
            Err(CheckpointError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn json_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonCheckpointStore::new(dir.path());

        let session_id = store.create(10).await.expect("create");
        assert!(store.load(&session_id).await.expect("load").is_none());

        store
            .update(&session_id, snapshot("run-1", 7))
            .await
            .expect("update");
        let loaded = store.load(&session_id).await.expect("load").expect("some");
        assert_eq!(loaded.items_processed, 7);
        assert_eq!(loaded.status, RunStatus::Processing);
    }
}
