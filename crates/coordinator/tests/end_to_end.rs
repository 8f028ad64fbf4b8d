//! End-to-end integration tests: the full submit → dispatch → await →
//! relay flow over the in-process channel transport, with real worker
//! runners heartbeating and executing.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use fabric_coordinator::{ChannelTransport, Coordinator, FabricConfig};
use fabric_core::error::CoreError;
use fabric_core::event_names::EVENT_TASK_DISPATCHED;
use fabric_core::task::{Heartbeat, TaskOutcome, TaskSubmission};
use fabric_core::transport::{HeartbeatSink, ResultSink, TaskTransport};
use fabric_events::EventBus;
use fabric_worker::{ExecutionError, TaskExecutor, WorkerRunner};

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Byte-level stand-ins for the real processing kinds.
struct DemoExecutor;

#[async_trait]
impl TaskExecutor for DemoExecutor {
    async fn execute(&self, task_kind: &str, payload: &[u8]) -> Result<Vec<u8>, ExecutionError> {
        match task_kind {
            "uppercase" => Ok(payload.to_ascii_uppercase()),
            "reverse" => Ok(payload.iter().rev().copied().collect()),
            "stall" => {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(payload.to_vec())
            }
            other => Err(ExecutionError::UnsupportedKind(other.to_string())),
        }
    }
}

struct Fabric {
    coordinator: Arc<Coordinator>,
    transport: Arc<ChannelTransport>,
    events: Arc<EventBus>,
    cancel: CancellationToken,
}

impl Drop for Fabric {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Boot a coordinator plus `worker_ids.len()` running workers and wait
/// until every worker has heartbeated into the registry.
async fn start_fabric(config: FabricConfig, worker_ids: &[&str]) -> Fabric {
    // RUST_LOG=debug makes the flows visible when a test misbehaves.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let transport = Arc::new(ChannelTransport::new());
    let events = Arc::new(EventBus::default());
    let coordinator = Coordinator::new(
        config,
        transport.clone() as Arc<dyn TaskTransport>,
        events.clone(),
    )
    .unwrap();
    let cancel = CancellationToken::new();

    {
        let coordinator = coordinator.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { coordinator.run(cancel).await });
    }

    for id in worker_ids {
        let inbox = transport.attach(id).await.unwrap();
        let runner = WorkerRunner::new(
            *id,
            Arc::new(DemoExecutor),
            coordinator.clone() as Arc<dyn HeartbeatSink>,
            coordinator.clone() as Arc<dyn ResultSink>,
        )
        .unwrap()
        .with_heartbeat_interval(Duration::from_millis(200));
        let cancel = cancel.clone();
        tokio::spawn(async move { runner.run(inbox, cancel).await });
    }

    // First heartbeats are immediate; give the spawned tasks a moment.
    let expected = worker_ids.len();
    for _ in 0..100 {
        if coordinator.workers().await.len() == expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(coordinator.workers().await.len(), expected, "workers never joined");

    Fabric {
        coordinator,
        transport,
        events,
        cancel,
    }
}

fn quick_config() -> FabricConfig {
    FabricConfig {
        heartbeat_interval: Duration::from_millis(200),
        liveness_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(5),
        sweep_interval: Duration::from_millis(100),
    }
}

// ---------------------------------------------------------------------------
// Test: a submission round-trips through a worker
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submission_round_trips_through_a_worker() {
    let fabric = start_fabric(quick_config(), &["worker-1"]).await;

    let result = fabric
        .coordinator
        .submit_and_wait(TaskSubmission::new("uppercase", b"hello fabric".to_vec()))
        .await
        .unwrap();

    assert_matches!(
        result.outcome,
        TaskOutcome::Success { payload } if payload == b"HELLO FABRIC".to_vec()
    );
    assert_eq!(fabric.coordinator.outstanding().await, 0);
}

// ---------------------------------------------------------------------------
// Test: round-robin spreads sequential requests evenly
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sequential_requests_spread_evenly_across_workers() {
    let fabric = start_fabric(quick_config(), &["worker-a", "worker-b", "worker-c"]).await;
    let mut event_rx = fabric.events.subscribe();

    for i in 0..9 {
        let result = fabric
            .coordinator
            .submit_and_wait(TaskSubmission::new("reverse", vec![i]))
            .await
            .unwrap();
        assert_matches!(result.outcome, TaskOutcome::Success { .. });
    }

    let mut per_worker = std::collections::HashMap::new();
    while let Ok(event) = event_rx.try_recv() {
        if event.event_type == EVENT_TASK_DISPATCHED {
            *per_worker.entry(event.worker_id.unwrap()).or_insert(0) += 1;
        }
    }

    assert_eq!(per_worker.len(), 3);
    for (worker_id, count) in per_worker {
        assert_eq!(count, 3, "uneven share for {worker_id}");
    }
}

// ---------------------------------------------------------------------------
// Test: executor failure is relayed as a failure outcome
// ---------------------------------------------------------------------------

#[tokio::test]
async fn executor_failure_is_relayed_to_the_caller() {
    let fabric = start_fabric(quick_config(), &["worker-1"]).await;

    let result = fabric
        .coordinator
        .submit_and_wait(TaskSubmission::new("sharpen", vec![1, 2, 3]))
        .await
        .unwrap();
    assert_matches!(
        result.outcome,
        TaskOutcome::Failure { error } if error.contains("sharpen")
    );

    // The worker survives a failed execution.
    let ok = fabric
        .coordinator
        .submit_and_wait(TaskSubmission::new("uppercase", b"still here".to_vec()))
        .await
        .unwrap();
    assert_matches!(ok.outcome, TaskOutcome::Success { .. });
}

// ---------------------------------------------------------------------------
// Test: a slow request does not starve other requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn slow_request_does_not_starve_others() {
    let fabric = start_fabric(quick_config(), &["worker-1", "worker-2"]).await;

    let slow = fabric
        .coordinator
        .submit_and_wait(TaskSubmission::new("stall", vec![0]));
    let quick = fabric
        .coordinator
        .submit_and_wait(TaskSubmission::new("uppercase", b"io".to_vec()));

    let (slow, quick) = tokio::join!(slow, quick);
    assert_matches!(slow.unwrap().outcome, TaskOutcome::Success { .. });
    assert_matches!(quick.unwrap().outcome, TaskOutcome::Success { .. });
}

// ---------------------------------------------------------------------------
// Test: no live workers fails fast and leaves nothing pending
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_live_workers_fails_fast() {
    let fabric = start_fabric(quick_config(), &[]).await;

    let err = fabric
        .coordinator
        .submit_and_wait(TaskSubmission::new("uppercase", vec![1]))
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::NoWorkersAvailable);
    assert_eq!(fabric.coordinator.outstanding().await, 0);
}

// ---------------------------------------------------------------------------
// Test: transport failure on a live-but-unreachable worker
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_worker_surfaces_dispatch_failed() {
    let fabric = start_fabric(quick_config(), &[]).await;

    // Live in the registry but never attached to the transport, so both
    // the initial hand-off and the retry fail.
    fabric
        .coordinator
        .record_heartbeat(Heartbeat::new("worker-ghost"))
        .await;

    let err = fabric
        .coordinator
        .submit_and_wait(TaskSubmission::new("uppercase", vec![1]))
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::DispatchFailed(_));
    assert_eq!(fabric.coordinator.outstanding().await, 0);
}

// ---------------------------------------------------------------------------
// Test: hand-off failure retries onto a reachable worker
// ---------------------------------------------------------------------------

#[tokio::test]
async fn hand_off_failure_retries_onto_reachable_worker() {
    let fabric = start_fabric(quick_config(), &["worker-b"]).await;

    // "worker-a" sorts ahead of "worker-b" and is live but unreachable;
    // the first hand-off fails and the retry must land on worker-b.
    fabric
        .coordinator
        .record_heartbeat(Heartbeat::new("worker-a"))
        .await;

    let result = fabric
        .coordinator
        .submit_and_wait(TaskSubmission::new("uppercase", b"retry me".to_vec()))
        .await
        .unwrap();

    assert_matches!(
        result.outcome,
        TaskOutcome::Success { payload } if payload == b"RETRY ME".to_vec()
    );
}

// ---------------------------------------------------------------------------
// Test: duplicate caller-supplied task id is rejected
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_task_id_rejected_while_outstanding() {
    let fabric = start_fabric(quick_config(), &[]).await;
    let task_id = uuid::Uuid::new_v4();

    // A live worker whose inbox we hold but never drain keeps the first
    // request outstanding deterministically.
    let _inbox = fabric.transport.attach("worker-idle").await.unwrap();
    fabric
        .coordinator
        .record_heartbeat(Heartbeat::new("worker-idle"))
        .await;

    let ticket = fabric
        .coordinator
        .submit(TaskSubmission::new("uppercase", vec![1]).with_task_id(task_id))
        .await
        .unwrap();
    assert_eq!(ticket.task_id, task_id);

    let err = fabric
        .coordinator
        .submit(TaskSubmission::new("uppercase", vec![2]).with_task_id(task_id))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::DuplicateTaskId(id) if id == task_id);

    // The first registration is untouched.
    assert_eq!(fabric.coordinator.outstanding().await, 1);
}
