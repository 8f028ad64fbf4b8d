//! Worker task loop.
//!
//! [`WorkerRunner`] owns a worker identity and an executor, heartbeats in
//! the background, and processes dispatched tasks sequentially: receive,
//! execute, report the outcome. Executor failures become `Failure`
//! results; the coordinator relays them to the waiting client rather than
//! treating the worker as dead.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use fabric_core::error::CoreError;
use fabric_core::task::{TaskRequest, TaskResult};
use fabric_core::transport::{HeartbeatSink, ResultSink};
use fabric_core::types::WorkerId;
use fabric_core::worker::{validate_capabilities, validate_worker_id};

use crate::executor::TaskExecutor;
use crate::heartbeat;

/// Default heartbeat send interval. The coordinator's liveness timeout
/// should be a 3-5x multiple of this.
const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);

pub struct WorkerRunner {
    worker_id: WorkerId,
    capabilities: Vec<String>,
    executor: Arc<dyn TaskExecutor>,
    heartbeats: Arc<dyn HeartbeatSink>,
    results: Arc<dyn ResultSink>,
    heartbeat_interval: Duration,
}

impl WorkerRunner {
    /// Create a runner with a validated, caller-chosen worker id.
    pub fn new(
        worker_id: impl Into<WorkerId>,
        executor: Arc<dyn TaskExecutor>,
        heartbeats: Arc<dyn HeartbeatSink>,
        results: Arc<dyn ResultSink>,
    ) -> Result<Self, CoreError> {
        let worker_id = worker_id.into();
        validate_worker_id(&worker_id)?;
        Ok(Self {
            worker_id,
            capabilities: Vec::new(),
            executor,
            heartbeats,
            results,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        })
    }

    /// A self-chosen identity in the `worker-NNN` style.
    pub fn generated_id() -> WorkerId {
        format!("worker-{}", rand::rng().random_range(100..1000))
    }

    /// Advertise capability tags on every heartbeat.
    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Result<Self, CoreError> {
        validate_capabilities(&capabilities)?;
        self.capabilities = capabilities;
        Ok(self)
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn worker_id(&self) -> &WorkerId {
        &self.worker_id
    }

    /// Process tasks from `inbox` until cancelled or the inbox closes.
    ///
    /// Heartbeats run as a separate task for the whole lifetime of the
    /// loop, so a slow execution never silences the liveness signal.
    pub async fn run(&self, mut inbox: mpsc::Receiver<TaskRequest>, cancel: CancellationToken) {
        let heartbeat_cancel = cancel.child_token();
        let heartbeat_handle = tokio::spawn(heartbeat::run(
            self.heartbeats.clone(),
            self.worker_id.clone(),
            self.capabilities.clone(),
            self.heartbeat_interval,
            heartbeat_cancel.clone(),
        ));

        tracing::info!(worker_id = %self.worker_id, "Worker ready");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(worker_id = %self.worker_id, "Worker shutting down");
                    break;
                }
                request = inbox.recv() => {
                    match request {
                        Some(request) => self.process(request).await,
                        None => {
                            tracing::info!(
                                worker_id = %self.worker_id,
                                "Task inbox closed, worker stopping",
                            );
                            break;
                        }
                    }
                }
            }
        }

        heartbeat_cancel.cancel();
        let _ = heartbeat_handle.await;
    }

    async fn process(&self, request: TaskRequest) {
        tracing::debug!(
            worker_id = %self.worker_id,
            task_id = %request.task_id,
            task_kind = %request.task_kind,
            "Task received",
        );

        let result = match self
            .executor
            .execute(&request.task_kind, &request.payload)
            .await
        {
            Ok(payload) => TaskResult::success(request.task_id, payload),
            Err(e) => {
                tracing::warn!(
                    worker_id = %self.worker_id,
                    task_id = %request.task_id,
                    task_kind = %request.task_kind,
                    error = %e,
                    "Execution failed",
                );
                TaskResult::failure(request.task_id, e.to_string())
            }
        };

        self.results.send_result(result).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
