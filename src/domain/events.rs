//! Run lifecycle status, progress snapshots and the rolling operator log
//!
//! The orchestrator publishes these on side channels (watch/broadcast); they
//! are observation only and never feed back into control flow.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall status of an enrichment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run created, first batch not yet dispatched.
    Pending,
    /// Batches are being dispatched.
    Processing,
    /// Paused by the operator; dispatch stops at the next batch boundary.
    Paused,
    /// Every row has an aggregated result.
    Completed,
    /// Terminal failure, including operator cancellation.
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Severity tag on operator-facing log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One structured entry of the run log, addressable back to a source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub row_index: Option<usize>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, row_index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            level,
            row_index,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Progress counters published after every aggregated batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunProgress {
    pub run_id: String,
    pub status: RunStatus,
    pub processed: usize,
    pub total: usize,
    /// Progress percentage (0.0 to 100.0).
    pub percentage: f64,
    pub timestamp: DateTime<Utc>,
}

impl RunProgress {
    pub fn new(run_id: impl Into<String>, total: usize) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Pending,
            processed: 0,
            total,
            percentage: 0.0,
            timestamp: Utc::now(),
        }
    }

    /// Update counters and the derived percentage in one step.
    pub fn advance(&mut self, processed: usize, status: RunStatus) {
        self.processed = processed;
        self.status = status;
        self.percentage = if self.total > 0 {
            (processed as f64 / self.total as f64) * 100.0
        } else {
            0.0
        };
        self.timestamp = Utc::now();
    }
}

/// Capped log buffer: oldest entries are dropped once capacity is reached.
#[derive(Debug, Clone)]
pub struct RollingLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl RollingLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
