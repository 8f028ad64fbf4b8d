//! End-to-end submit → dispatch → await → relay orchestration.
//!
//! [`Coordinator`] composes the registry, pending table, dispatcher, and
//! relay. Each request moves through `Submitted → Dispatched →
//! {Completed | TimedOut | DispatchFailed}`:
//!
//! - the pending entry is registered *before* dispatch, so a fast worker's
//!   result can never arrive ahead of the entry it resolves;
//! - `Completed` and `TimedOut` race through the pending table's atomic
//!   take-and-remove, so exactly one terminal transition fires;
//! - `DispatchFailed` releases the entry immediately and nothing is left
//!   behind.
//!
//! Timeout expiry is driven both by the waiter's own timer
//! ([`Coordinator::submit_and_wait`]) and by the background sweep
//! ([`Coordinator::run`]); both routes go through
//! [`PendingTable::expire`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use fabric_core::error::CoreError;
use fabric_core::event_names::{EVENT_TASK_DISPATCHED, EVENT_TASK_TIMED_OUT, EVENT_WORKER_EVICTED};
use fabric_core::task::{Heartbeat, TaskRequest, TaskResult, TaskSubmission};
use fabric_core::transport::{HeartbeatSink, ResultSink, TaskTransport};
use fabric_core::types::{TaskId, Timestamp};
use fabric_events::{EventBus, FabricEvent};

use crate::config::FabricConfig;
use crate::dispatcher::Dispatcher;
use crate::pending::{PendingTable, WaitOutcome};
use crate::registry::{WorkerRecord, WorkerRegistry};
use crate::relay::ResultRelay;

/// Handle to a submitted request.
///
/// Returned by [`Coordinator::submit`] (fire-and-correlate). Holding the
/// ticket and awaiting [`TaskTicket::wait`] relies on the background sweep
/// to deliver `TimedOut`; [`Coordinator::submit_and_wait`] runs its own
/// timer instead.
#[derive(Debug)]
pub struct TaskTicket {
    pub task_id: TaskId,
    receiver: oneshot::Receiver<WaitOutcome>,
}

impl TaskTicket {
    /// Suspend until the request reaches a terminal state.
    pub async fn wait(self) -> Result<WaitOutcome, CoreError> {
        self.receiver.await.map_err(|_| {
            CoreError::Internal("waiter channel closed without an outcome".to_string())
        })
    }
}

/// The task-dispatch fabric's single logical coordinator.
///
/// Created once via [`Coordinator::new`]; the returned `Arc` is cheap to
/// clone into every ingestion flow. The registry and pending table carry
/// independent locks; no operation spans both.
pub struct Coordinator {
    config: FabricConfig,
    registry: Arc<WorkerRegistry>,
    pending: Arc<PendingTable>,
    dispatcher: Dispatcher,
    relay: ResultRelay,
    events: Arc<EventBus>,
}

impl Coordinator {
    /// Wire up a coordinator over the given transport and event bus.
    ///
    /// Fails with [`CoreError::Validation`] if the configuration's timing
    /// relationships are invalid.
    pub fn new(
        config: FabricConfig,
        transport: Arc<dyn TaskTransport>,
        events: Arc<EventBus>,
    ) -> Result<Arc<Self>, CoreError> {
        config.validate()?;

        let registry = Arc::new(WorkerRegistry::new(config.liveness_timeout));
        let pending = Arc::new(PendingTable::new());
        let dispatcher = Dispatcher::new(registry.clone(), transport);
        let relay = ResultRelay::new(pending.clone(), events.clone());

        Ok(Arc::new(Self {
            config,
            registry,
            pending,
            dispatcher,
            relay,
            events,
        }))
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Accept a submission, dispatch it, and return a correlation ticket.
    ///
    /// Assigns a task id if the caller did not supply one; a supplied id
    /// colliding with an outstanding request is rejected with
    /// [`CoreError::DuplicateTaskId`] before anything is dispatched. On
    /// dispatch failure the pending entry is released and the error is
    /// surfaced immediately.
    pub async fn submit(&self, submission: TaskSubmission) -> Result<TaskTicket, CoreError> {
        let task_id = submission.task_id.unwrap_or_else(uuid::Uuid::new_v4);
        let submitted_at = Utc::now();
        let deadline = submitted_at + self.request_timeout_chrono();

        let (waiter, receiver) = oneshot::channel();
        self.pending
            .register(task_id, waiter, deadline, submission.task_kind.clone())
            .await?;

        let request = TaskRequest {
            task_id,
            task_kind: submission.task_kind,
            payload: submission.payload,
            submitted_at,
        };

        match self.dispatcher.dispatch(&request, None).await {
            Ok(worker_id) => {
                tracing::info!(
                    task_id = %task_id,
                    worker_id = %worker_id,
                    task_kind = %request.task_kind,
                    "Task dispatched",
                );
                self.events.publish(
                    FabricEvent::new(EVENT_TASK_DISPATCHED)
                        .with_worker(worker_id)
                        .with_task(task_id)
                        .with_payload(serde_json::json!({"task_kind": request.task_kind})),
                );
                Ok(TaskTicket { task_id, receiver })
            }
            Err(e) => {
                // Nothing was handed off; release the entry we registered.
                self.pending.expire(&task_id).await;
                tracing::warn!(
                    task_id = %task_id,
                    task_kind = %request.task_kind,
                    error = %e,
                    "Dispatch failed, request rejected",
                );
                Err(e)
            }
        }
    }

    /// Synchronous variant: submit and block until the result arrives or
    /// the request timeout elapses.
    ///
    /// On expiry this routes through the same atomic
    /// [`PendingTable::expire`] as the background sweep, so a result
    /// racing the timeout resolves to exactly one of the two outcomes. A
    /// result that loses the race is already in flight and is returned,
    /// not discarded.
    pub async fn submit_and_wait(
        &self,
        submission: TaskSubmission,
    ) -> Result<TaskResult, CoreError> {
        let mut ticket = self.submit(submission).await?;
        let task_id = ticket.task_id;

        match tokio::time::timeout(self.config.request_timeout, &mut ticket.receiver).await {
            Ok(Ok(WaitOutcome::Completed(result))) => Ok(result),
            // The sweep expired us just before our own timer fired.
            Ok(Ok(WaitOutcome::TimedOut)) => Err(self.request_timeout_error()),
            Ok(Err(_)) => Err(CoreError::Internal(
                "waiter channel closed without an outcome".to_string(),
            )),
            Err(_elapsed) => match self.pending.expire(&task_id).await {
                Some(entry) => {
                    self.emit_timed_out(task_id, &entry.task_kind);
                    Err(self.request_timeout_error())
                }
                // complete() won the race; the outcome is already in flight.
                None => match ticket.receiver.await {
                    Ok(WaitOutcome::Completed(result)) => Ok(result),
                    Ok(WaitOutcome::TimedOut) => Err(self.request_timeout_error()),
                    Err(_) => Err(CoreError::Internal(
                        "waiter channel closed without an outcome".to_string(),
                    )),
                },
            },
        }
    }

    // -----------------------------------------------------------------------
    // Ingestion (transport-in surfaces)
    // -----------------------------------------------------------------------

    /// Record a worker heartbeat, stamped with the arrival time.
    pub async fn record_heartbeat(&self, heartbeat: Heartbeat) {
        tracing::debug!(worker_id = %heartbeat.worker_id, "Heartbeat received");
        self.registry.record_heartbeat(&heartbeat, Utc::now()).await;
    }

    /// Feed a worker result into the relay.
    pub async fn ingest_result(&self, result: TaskResult) {
        self.relay.on_result(result).await;
    }

    // -----------------------------------------------------------------------
    // Background sweeps
    // -----------------------------------------------------------------------

    /// Run the eviction and deadline sweeps until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        tracing::info!(
            sweep_interval_ms = self.config.sweep_interval.as_millis() as u64,
            liveness_timeout_ms = self.config.liveness_timeout.as_millis() as u64,
            "Coordinator sweep loop started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Coordinator sweep loop shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.sweep_once(Utc::now()).await;
                }
            }
        }
    }

    /// One sweep cycle: evict silent workers, expire overdue requests.
    ///
    /// Public so tests (and embedders driving their own scheduler) can
    /// sweep with an explicit timestamp.
    pub async fn sweep_once(&self, at: Timestamp) {
        for worker_id in self.registry.sweep(at).await {
            tracing::warn!(worker_id = %worker_id, "Worker evicted after missed heartbeats");
            self.events
                .publish(FabricEvent::new(EVENT_WORKER_EVICTED).with_worker(worker_id));
        }

        for task_id in self.pending.pending_before(at).await {
            // The id may complete concurrently between the scan and this
            // call; expire decides the winner.
            if let Some(entry) = self.pending.expire(&task_id).await {
                self.emit_timed_out(task_id, &entry.task_kind);
                let _ = entry.waiter.send(WaitOutcome::TimedOut);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Observability
    // -----------------------------------------------------------------------

    /// Current worker records, for monitoring surfaces.
    pub async fn workers(&self) -> Vec<WorkerRecord> {
        self.registry.snapshot().await
    }

    /// Number of outstanding requests.
    pub async fn outstanding(&self) -> usize {
        self.pending.len().await
    }

    fn emit_timed_out(&self, task_id: TaskId, task_kind: &str) {
        tracing::warn!(
            task_id = %task_id,
            task_kind = %task_kind,
            timeout_ms = self.config.request_timeout.as_millis() as u64,
            "Request deadline passed with no result",
        );
        self.events.publish(
            FabricEvent::new(EVENT_TASK_TIMED_OUT)
                .with_task(task_id)
                .with_payload(serde_json::json!({"task_kind": task_kind})),
        );
    }

    fn request_timeout_error(&self) -> CoreError {
        CoreError::RequestTimeout {
            timeout_secs: self.config.request_timeout.as_secs(),
        }
    }

    fn request_timeout_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.config.request_timeout)
            .unwrap_or(chrono::Duration::MAX)
    }
}

#[async_trait]
impl HeartbeatSink for Coordinator {
    async fn send_heartbeat(&self, heartbeat: Heartbeat) {
        self.record_heartbeat(heartbeat).await;
    }
}

#[async_trait]
impl ResultSink for Coordinator {
    async fn send_result(&self, result: TaskResult) {
        self.ingest_result(result).await;
    }
}
