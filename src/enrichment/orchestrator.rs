//! Batch enrichment orchestrator
//!
//! Drives every row through the external enrichment service exactly once
//! per run (cache hits aside) with bounded outstanding concurrency:
//! sequential batches, full concurrent fan-out inside a batch, join before
//! the next batch. Pause/resume ride a watch-channel gate so `resume()`
//! wakes the control task immediately; cancellation is cooperative and
//! never preempts an in-flight call.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ValidatedRunConfig;
use crate::domain::enrichment::{EnrichmentRequest, EnrichmentResult};
use crate::domain::events::{LogEntry, LogLevel, RollingLog, RunProgress, RunStatus};
use crate::domain::record::ProductRecord;
use crate::domain::schema::{ColumnRoleMap, RoleMapError};
use crate::session::checkpoint::CheckpointStore;
use crate::session::state::{RunSnapshot, RunState};

use super::cache::{ContentDigest, EnrichmentCache};
use super::service::EnrichmentService;

/// Input rejections raised before any run state exists.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("row set is empty; nothing to enrich")]
    EmptyRowSet,

    #[error("invalid column roles: {0}")]
    InvalidRoles(#[from] RoleMapError),
}

/// Rejected control transitions (e.g. resuming a run that is not paused).
#[derive(Debug, thiserror::Error)]
#[error("invalid control transition: run is {actual:?}")]
pub struct ControlError {
    pub actual: RunStatus,
}

/// Operator gate state carried on the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlState {
    Running,
    Paused,
    Cancelled,
}

/// Per-run options beyond the tuning in `ValidatedRunConfig`.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Domain abbreviation context forwarded with every request.
    pub abbreviations: BTreeMap<String, String>,
    /// Snapshot from a previous interrupted run; already-reflected results
    /// are seeded and processing continues at the first unprocessed row.
    pub resume_from: Option<RunSnapshot>,
}

impl RunOptions {
    #[must_use]
    pub fn with_abbreviation(mut self, short: impl Into<String>, long: impl Into<String>) -> Self {
        self.abbreviations.insert(short.into(), long.into());
        self
    }

    #[must_use]
    pub fn resume_from(mut self, snapshot: RunSnapshot) -> Self {
        self.resume_from = Some(snapshot);
        self
    }
}

/// Final outcome returned by `RunHandle::join`.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: String,
    pub status: RunStatus,
    pub items_processed: usize,
    /// One result per aggregated row, in source-row order; cancelled runs
    /// carry only the rows aggregated before cancellation.
    pub results: Vec<EnrichmentResult>,
}

/// State shared between the caller-facing handle and the control task.
#[derive(Debug)]
struct RunShared {
    progress: watch::Sender<RunProgress>,
    logs: broadcast::Sender<LogEntry>,
    rolling: Mutex<RollingLog>,
}

impl RunShared {
    fn set_status(&self, status: RunStatus) {
        self.progress.send_modify(|progress| {
            let processed = progress.processed;
            progress.advance(processed, status);
        });
    }

    fn advance(&self, processed: usize, status: RunStatus) {
        self.progress
            .send_modify(|progress| progress.advance(processed, status));
    }

    /// Counter-only update that leaves the operator-visible status alone;
    /// pause/cancel may have flipped it while a batch was in flight.
    fn advance_processed(&self, processed: usize) {
        self.progress.send_modify(|progress| {
            let status = progress.status;
            progress.advance(processed, status);
        });
    }

    /// Observation side channel: lossy broadcast plus the capped rolling
    /// buffer. Never blocks the control task.
    fn log(&self, level: LogLevel, row_index: Option<usize>, message: impl Into<String>) {
        let entry = LogEntry::new(level, row_index, message);
        if let Ok(mut rolling) = self.rolling.lock() {
            rolling.push(entry.clone());
        }
        let _ = self.logs.send(entry);
    }
}

/// Caller-owned handle to one run. Handles are single-use: terminal runs
/// cannot be restarted, a new run must be started instead.
pub struct RunHandle {
    run_id: String,
    session_id: String,
    control: watch::Sender<ControlState>,
    cancel: CancellationToken,
    progress: watch::Receiver<RunProgress>,
    shared: Arc<RunShared>,
    join: JoinHandle<RunOutcome>,
}

impl RunHandle {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Checkpoint session backing this run; what an operator hands back to
    /// `CheckpointStore::load` after an interruption.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Watch receiver for progress snapshots; also what `RunRegistry` stores.
    pub fn progress(&self) -> watch::Receiver<RunProgress> {
        self.progress.clone()
    }

    pub fn current_progress(&self) -> RunProgress {
        self.progress.borrow().clone()
    }

    /// Subscribe to the structured log stream. Slow subscribers lose the
    /// oldest entries; the rolling snapshot below is the bounded fallback.
    pub fn subscribe_logs(&self) -> broadcast::Receiver<LogEntry> {
        self.shared.logs.subscribe()
    }

    pub fn log_snapshot(&self) -> Vec<LogEntry> {
        self.shared
            .rolling
            .lock()
            .map(|rolling| rolling.snapshot())
            .unwrap_or_default()
    }

    /// Pause dispatch at the next batch boundary. Valid only while the run
    /// is `Processing`; in-flight calls are allowed to finish.
    pub fn pause(&self) -> Result<(), ControlError> {
        let actual = self.progress.borrow().status;
        if actual != RunStatus::Processing {
            return Err(ControlError { actual });
        }
        self.shared.set_status(RunStatus::Paused);
        let _ = self.control.send(ControlState::Paused);
        Ok(())
    }

    /// Wake a paused run immediately.
    pub fn resume(&self) -> Result<(), ControlError> {
        let actual = self.progress.borrow().status;
        if actual != RunStatus::Paused {
            return Err(ControlError { actual });
        }
        self.shared.set_status(RunStatus::Processing);
        let _ = self.control.send(ControlState::Running);
        Ok(())
    }

    /// Cancel the run: no further batches are scheduled, in-flight calls
    /// complete and their results are discarded. A normal terminal outcome.
    pub fn cancel(&self) -> Result<(), ControlError> {
        let actual = self.progress.borrow().status;
        if actual.is_terminal() || actual == RunStatus::Pending {
            return Err(ControlError { actual });
        }
        self.shared.set_status(RunStatus::Failed);
        let _ = self.control.send(ControlState::Cancelled);
        self.cancel.cancel();
        Ok(())
    }

    /// Wait for the control task and collect the outcome.
    pub async fn join(self) -> RunOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                warn!("❌ Run {} control task failed: {join_error}", self.run_id);
                RunOutcome {
                    run_id: self.run_id,
                    status: RunStatus::Failed,
                    items_processed: self.progress.borrow().processed,
                    results: Vec::new(),
                }
            }
        }
    }
}

/// Orchestrates enrichment runs over an injected service and checkpoint
/// store. Each `start` call produces an independent `RunHandle`; no global
/// mutable run state is kept here.
pub struct EnrichmentOrchestrator {
    service: Arc<dyn EnrichmentService>,
    checkpoints: Arc<dyn CheckpointStore>,
    config: ValidatedRunConfig,
}

impl EnrichmentOrchestrator {
    pub fn new(service: Arc<dyn EnrichmentService>, checkpoints: Arc<dyn CheckpointStore>) -> Self {
        Self {
            service,
            checkpoints,
            config: ValidatedRunConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ValidatedRunConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate inputs, reset run state and spawn the control task.
    /// Rejections here leave no partial state behind.
    pub async fn start(
        &self,
        rows: Vec<ProductRecord>,
        roles: ColumnRoleMap,
        options: RunOptions,
    ) -> Result<RunHandle, StartError> {
        if rows.is_empty() {
            return Err(StartError::EmptyRowSet);
        }
        roles.validate()?;

        let run_id = Uuid::new_v4().to_string();
        let total = rows.len();

        // Checkpointing is a resume convenience: a failing store downgrades
        // to a locally generated session id and the run proceeds.
        let session_id = match self.checkpoints.create(total).await {
            Ok(session_id) => session_id,
            Err(error) => {
                warn!("⚠️ Checkpoint session creation failed: {error}");
                run_id.clone()
            }
        };

        // Seed results from a prior snapshot; processing resumes at the
        // first row without a reflected result.
        let mut results: Vec<Option<EnrichmentResult>> = vec![None; total];
        if let Some(snapshot) = &options.resume_from {
            for result in &snapshot.results {
                if result.source_index < total {
                    results[result.source_index] = Some(result.clone());
                }
            }
        }
        let seeded = results.iter().take_while(|slot| slot.is_some()).count();

        let mut initial = RunProgress::new(run_id.clone(), total);
        initial.advance(seeded, RunStatus::Pending);

        let (progress_tx, progress_rx) = watch::channel(initial);
        let (control_tx, control_rx) = watch::channel(ControlState::Running);
        let (log_tx, _) = broadcast::channel(self.config.log_capacity);
        let cancel = CancellationToken::new();

        let shared = Arc::new(RunShared {
            progress: progress_tx,
            logs: log_tx,
            rolling: Mutex::new(RollingLog::new(self.config.log_capacity)),
        });

        let context = RunContext {
            run_id: run_id.clone(),
            session_id: session_id.clone(),
            rows,
            roles,
            options,
            config: self.config.clone(),
            service: Arc::clone(&self.service),
            checkpoints: Arc::clone(&self.checkpoints),
            shared: Arc::clone(&shared),
            control_rx,
            cancel: cancel.clone(),
            results,
            seeded,
        };
        let join = tokio::spawn(run_loop(context));

        Ok(RunHandle {
            run_id,
            session_id,
            control: control_tx,
            cancel,
            progress: progress_rx,
            shared,
            join,
        })
    }
}

/// Everything the control task owns for the duration of a run.
struct RunContext {
    run_id: String,
    session_id: String,
    rows: Vec<ProductRecord>,
    roles: ColumnRoleMap,
    options: RunOptions,
    config: ValidatedRunConfig,
    service: Arc<dyn EnrichmentService>,
    checkpoints: Arc<dyn CheckpointStore>,
    shared: Arc<RunShared>,
    control_rx: watch::Receiver<ControlState>,
    cancel: CancellationToken,
    results: Vec<Option<EnrichmentResult>>,
    seeded: usize,
}

enum Gate {
    Proceed,
    Cancelled,
}

/// One completed row inside a batch, before aggregation.
struct RowCompletion {
    row_index: usize,
    digest: ContentDigest,
    result: EnrichmentResult,
    level: LogLevel,
    note: String,
}

/// The single control task: only place that mutates run state, the result
/// list and the cache, always between batch joins.
async fn run_loop(mut ctx: RunContext) -> RunOutcome {
    let total = ctx.rows.len();
    let mut state = RunState::new(total);
    state.status = RunStatus::Processing;
    state.items_processed = ctx.seeded;

    ctx.shared.advance(ctx.seeded, RunStatus::Processing);
    ctx.shared.log(
        LogLevel::Info,
        None,
        format!(
            "🚀 Run {} started: {} items, batch size {}",
            ctx.run_id, total, ctx.config.batch_size
        ),
    );
    if ctx.seeded > 0 {
        ctx.shared.log(
            LogLevel::Info,
            None,
            format!("▶️ Resuming from checkpoint: {} items already processed", ctx.seeded),
        );
    }

    // Run-scoped cache: a new run never sees an old run's entries.
    let mut cache = EnrichmentCache::new();
    let analyze_columns: Vec<String> = ctx.roles.analyze_columns().map(str::to_string).collect();
    let mut control_rx = ctx.control_rx.clone();

    write_checkpoint(&ctx, &state).await;

    let mut index = ctx.seeded;
    let mut cancelled = false;

    while index < total {
        match wait_for_go(&mut control_rx, &mut state, &ctx).await {
            Gate::Proceed => {}
            Gate::Cancelled => {
                cancelled = true;
                break;
            }
        }

        let end = (index + ctx.config.batch_size).min(total);
        let mut completions: Vec<RowCompletion> = Vec::with_capacity(end - index);
        let mut pending: Vec<(usize, ContentDigest, JoinHandle<EnrichmentResult>)> = Vec::new();

        for row_index in index..end {
            let fields = build_payload(&ctx.rows[row_index], &analyze_columns);
            let digest = ContentDigest::of_fields(&fields);

            if let Some(hit) = cache.get(&digest) {
                completions.push(RowCompletion {
                    row_index,
                    digest,
                    result: hit.reindexed(row_index),
                    level: LogLevel::Info,
                    note: "cache hit, reused enrichment result".to_string(),
                });
                continue;
            }

            let request = EnrichmentRequest {
                row_id: row_index,
                fields,
                abbreviations: ctx.options.abbreviations.clone(),
            };
            let service = Arc::clone(&ctx.service);
            let min_confidence = ctx.config.min_confidence;
            let handle =
                tokio::spawn(async move { enrich_row(service, request, min_confidence).await });
            pending.push((row_index, digest, handle));
        }

        // Join the whole batch before anything else happens: bounded
        // outstanding calls, and pause/cancel stay batch-boundary events.
        let joined = join_all(pending.into_iter().map(|(row_index, digest, handle)| async move {
            (row_index, digest, handle.await)
        }))
        .await;

        // Cancel observed mid-batch: in-flight calls have completed, their
        // results are discarded.
        if matches!(*control_rx.borrow(), ControlState::Cancelled) {
            cancelled = true;
            break;
        }

        for (row_index, digest, outcome) in joined {
            let completion = match outcome {
                Ok(result) => {
                    let (level, note) = match &result.review_reason {
                        Some(reason) if result.fields.is_empty() => {
                            (LogLevel::Error, format!("needs review: {reason}"))
                        }
                        Some(reason) => (LogLevel::Warning, format!("needs review: {reason}")),
                        None => (
                            LogLevel::Success,
                            format!("enriched in {}ms", result.latency_ms.unwrap_or(0)),
                        ),
                    };
                    RowCompletion {
                        row_index,
                        digest,
                        result,
                        level,
                        note,
                    }
                }
                Err(join_error) => RowCompletion {
                    row_index,
                    digest,
                    result: EnrichmentResult::for_review(
                        row_index,
                        BTreeMap::new(),
                        format!("enrichment task failed: {join_error}"),
                        None,
                    ),
                    level: LogLevel::Error,
                    note: format!("enrichment task failed: {join_error}"),
                },
            };
            completions.push(completion);
        }

        // Aggregate in source-row order regardless of completion order.
        completions.sort_by_key(|completion| completion.row_index);
        for completion in completions {
            ctx.shared
                .log(completion.level, Some(completion.row_index), completion.note);
            cache.put(completion.digest, completion.result.clone());
            ctx.results[completion.row_index] = Some(completion.result);
            state.items_processed += 1;
        }

        ctx.shared.advance_processed(state.items_processed);
        write_checkpoint(&ctx, &state).await;

        index = end;
        if index < total {
            // Fixed inter-batch delay out of respect for external rate
            // limits; cancellation cuts it short.
            tokio::select! {
                () = ctx.cancel.cancelled() => {}
                () = tokio::time::sleep(ctx.config.inter_batch_delay()) => {}
            }
        }
    }

    let status = if cancelled {
        RunStatus::Failed
    } else {
        RunStatus::Completed
    };
    state.status = status;
    ctx.shared.advance(state.items_processed, status);
    if cancelled {
        ctx.shared.log(
            LogLevel::Warning,
            None,
            format!(
                "🛑 Run {} cancelled after {}/{} items",
                ctx.run_id, state.items_processed, total
            ),
        );
    } else {
        ctx.shared.log(
            LogLevel::Success,
            None,
            format!("🏁 Run {} completed: {} items", ctx.run_id, total),
        );
    }
    write_checkpoint(&ctx, &state).await;
    info!(
        "Run {} finished with status {:?} ({}/{} items)",
        ctx.run_id, status, state.items_processed, total
    );

    RunOutcome {
        run_id: ctx.run_id.clone(),
        status,
        items_processed: state.items_processed,
        results: ctx.results.iter().flatten().cloned().collect(),
    }
}

/// Block until the gate allows dispatch. Pause parks on the watch channel,
/// so `resume()` wakes this immediately instead of on a poll tick.
async fn wait_for_go(
    control_rx: &mut watch::Receiver<ControlState>,
    state: &mut RunState,
    ctx: &RunContext,
) -> Gate {
    loop {
        let current = *control_rx.borrow_and_update();
        match current {
            ControlState::Running => {
                if state.status == RunStatus::Paused {
                    state.status = RunStatus::Processing;
                    ctx.shared.log(LogLevel::Info, None, "▶️ Run resumed");
                    write_checkpoint(ctx, state).await;
                }
                return Gate::Proceed;
            }
            ControlState::Cancelled => return Gate::Cancelled,
            ControlState::Paused => {
                if state.status != RunStatus::Paused {
                    state.status = RunStatus::Paused;
                    ctx.shared.set_status(RunStatus::Paused);
                    ctx.shared
                        .log(LogLevel::Info, None, "⏸️ Run paused at batch boundary");
                    write_checkpoint(ctx, state).await;
                }
                if control_rx.changed().await.is_err() {
                    // Handle dropped while paused; treat as cancellation.
                    return Gate::Cancelled;
                }
            }
        }
    }
}

/// Call the service for one row and fold failures and low-confidence
/// responses into the reviewable result shape. Never escapes an error.
async fn enrich_row(
    service: Arc<dyn EnrichmentService>,
    request: EnrichmentRequest,
    min_confidence: f64,
) -> EnrichmentResult {
    let row_index = request.row_id;
    let started = Instant::now();
    let outcome = service.enrich(request).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(payload) => match payload.confidence {
            Some(confidence) if confidence < min_confidence => EnrichmentResult::for_review(
                row_index,
                payload.fields,
                format!("low confidence ({confidence:.2})"),
                Some(latency_ms),
            ),
            _ => EnrichmentResult::accepted(row_index, payload.fields, latency_ms),
        },
        Err(error) => EnrichmentResult::for_review(
            row_index,
            BTreeMap::new(),
            error.to_string(),
            Some(latency_ms),
        ),
    }
}

/// The `analyze`-marked field subset of one row, name-sorted. Absent cells
/// carry nothing and are skipped.
fn build_payload(row: &ProductRecord, analyze_columns: &[String]) -> BTreeMap<String, String> {
    analyze_columns
        .iter()
        .filter_map(|column| {
            row.get(column)
                .and_then(|value| value.as_payload_text())
                .map(|text| (column.clone(), text))
        })
        .collect()
}

/// Non-fatal checkpoint write: failures are logged and the run continues.
async fn write_checkpoint(ctx: &RunContext, state: &RunState) {
    let snapshot = RunSnapshot::new(
        ctx.run_id.clone(),
        state,
        ctx.results.iter().flatten().cloned().collect(),
    );
    if let Err(error) = ctx.checkpoints.update(&ctx.session_id, snapshot).await {
        warn!(
            "⚠️ Checkpoint update failed for session {}: {error}",
            ctx.session_id
        );
        ctx.shared.log(
            LogLevel::Warning,
            None,
            format!("checkpoint update failed: {error}"),
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::record::FieldValue;
    use crate::domain::schema::ColumnRole;

    use super::*;

    #[test]
    fn payload_holds_analyze_columns_only() {
        let row = ProductRecord::new(vec![
            ("nome".to_string(), FieldValue::from("Parafuso M8")),
            ("preco".to_string(), FieldValue::from(2.5)),
            ("obs".to_string(), FieldValue::Absent),
        ]);
        let columns = vec!["nome".to_string(), "obs".to_string()];

        let payload = build_payload(&row, &columns);
        assert_eq!(payload.len(), 1);
        assert_eq!(payload.get("nome").map(String::as_str), Some("Parafuso M8"));
    }

    #[tokio::test]
    async fn start_rejects_empty_row_sets_and_bad_roles() {
        use crate::domain::enrichment::EnrichmentPayload;
        use crate::enrichment::service::EnrichmentError;
        use crate::session::checkpoint::MemoryCheckpointStore;

        struct NoopService;
        #[async_trait::async_trait]
        impl EnrichmentService for NoopService {
            async fn enrich(
                &self,
                _request: EnrichmentRequest,
            ) -> Result<EnrichmentPayload, EnrichmentError> {
                unreachable!("never dispatched in this test")
            }
        }

        let orchestrator =
            EnrichmentOrchestrator::new(Arc::new(NoopService), Arc::new(MemoryCheckpointStore::new()));

        let roles = ColumnRoleMap::new().with_role("nome", ColumnRole::Analyze);
        let result = orchestrator
            .start(Vec::new(), roles.clone(), RunOptions::default())
            .await;
        assert!(matches!(result, Err(StartError::EmptyRowSet)));

        let rows = vec![ProductRecord::from_pairs([("nome", "Parafuso")])];
        let no_analyze = ColumnRoleMap::new().with_key_column("sku");
        let result = orchestrator
            .start(rows, no_analyze, RunOptions::default())
            .await;
        assert!(matches!(result, Err(StartError::InvalidRoles(_))));
    }
}
