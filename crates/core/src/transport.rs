//! Boundary traits between the coordinator and the outside world.
//!
//! Concrete wire transports (sockets, message queues) live outside this
//! workspace; the coordinator only sees these contracts. An in-process
//! channel-backed implementation ships with `fabric-coordinator` for
//! embedding and tests.

use async_trait::async_trait;

use crate::task::{Heartbeat, TaskRequest, TaskResult};
use crate::types::WorkerId;

/// Delivery of a task request to a specific worker failed.
///
/// This is the signal that triggers the dispatcher's one-shot retry against
/// a freshly computed live set.
#[derive(Debug, thiserror::Error)]
#[error("worker {worker_id} unreachable: {reason}")]
pub struct TransportError {
    pub worker_id: WorkerId,
    pub reason: String,
}

impl TransportError {
    pub fn new(worker_id: impl Into<WorkerId>, reason: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            reason: reason.into(),
        }
    }
}

/// Coordinator → worker hand-off.
#[async_trait]
pub trait TaskTransport: Send + Sync {
    /// Deliver a task request to the given worker.
    ///
    /// May fail if the worker disconnected between selection and send.
    async fn send_task(
        &self,
        worker_id: &WorkerId,
        request: TaskRequest,
    ) -> Result<(), TransportError>;
}

/// Worker → coordinator liveness signal.
#[async_trait]
pub trait HeartbeatSink: Send + Sync {
    async fn send_heartbeat(&self, heartbeat: Heartbeat);
}

/// Worker → coordinator result delivery.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn send_result(&self, result: TaskResult);
}
