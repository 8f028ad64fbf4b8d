//! In-process channel-backed transport.
//!
//! [`ChannelTransport`] connects a coordinator to workers running in the
//! same process through per-worker mpsc inboxes. It is the transport used
//! by the integration tests and by embedded deployments; wire transports
//! implement [`TaskTransport`] outside this workspace.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use fabric_core::error::CoreError;
use fabric_core::task::TaskRequest;
use fabric_core::transport::{TaskTransport, TransportError};
use fabric_core::types::WorkerId;
use fabric_core::worker::validate_worker_id;

/// Default per-worker inbox depth.
const DEFAULT_INBOX_CAPACITY: usize = 32;

/// Per-worker task inboxes, indexed by worker id.
#[derive(Default)]
pub struct ChannelTransport {
    links: RwLock<HashMap<WorkerId, mpsc::Sender<TaskRequest>>>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker and hand back the receiving end of its inbox.
    ///
    /// Re-attaching an id replaces the previous inbox; sends to the old
    /// receiver fail from then on, which the dispatcher observes as an
    /// unreachable worker.
    pub async fn attach(
        &self,
        worker_id: &str,
    ) -> Result<mpsc::Receiver<TaskRequest>, CoreError> {
        self.attach_with_capacity(worker_id, DEFAULT_INBOX_CAPACITY).await
    }

    pub async fn attach_with_capacity(
        &self,
        worker_id: &str,
        capacity: usize,
    ) -> Result<mpsc::Receiver<TaskRequest>, CoreError> {
        validate_worker_id(worker_id)?;
        let (tx, rx) = mpsc::channel(capacity);
        self.links.write().await.insert(worker_id.to_string(), tx);
        tracing::debug!(worker_id, "Worker inbox attached");
        Ok(rx)
    }

    /// Drop a worker's inbox. Subsequent sends to it fail.
    pub async fn detach(&self, worker_id: &str) {
        if self.links.write().await.remove(worker_id).is_some() {
            tracing::debug!(worker_id, "Worker inbox detached");
        }
    }

    /// Ids of currently attached workers, sorted.
    pub async fn attached_workers(&self) -> Vec<WorkerId> {
        let mut ids: Vec<WorkerId> = self.links.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl TaskTransport for ChannelTransport {
    async fn send_task(
        &self,
        worker_id: &WorkerId,
        request: TaskRequest,
    ) -> Result<(), TransportError> {
        // Clone the sender so the map lock is not held across the send.
        let sender = self
            .links
            .read()
            .await
            .get(worker_id)
            .cloned()
            .ok_or_else(|| TransportError::new(worker_id.clone(), "worker not attached"))?;

        sender
            .send(request)
            .await
            .map_err(|_| TransportError::new(worker_id.clone(), "worker inbox closed"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn request() -> TaskRequest {
        TaskRequest {
            task_id: uuid::Uuid::new_v4(),
            task_kind: "edge".into(),
            payload: vec![7],
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn attached_worker_receives_sent_tasks() {
        let transport = ChannelTransport::new();
        let mut inbox = transport.attach("worker-1").await.unwrap();

        let sent = request();
        transport
            .send_task(&"worker-1".to_string(), sent.clone())
            .await
            .unwrap();

        let received = inbox.recv().await.expect("inbox must yield the task");
        assert_eq!(received.task_id, sent.task_id);
    }

    #[tokio::test]
    async fn send_to_unattached_worker_fails() {
        let transport = ChannelTransport::new();
        let err = transport
            .send_task(&"worker-ghost".to_string(), request())
            .await
            .unwrap_err();
        assert_eq!(err.worker_id, "worker-ghost");
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_fails() {
        let transport = ChannelTransport::new();
        let inbox = transport.attach("worker-1").await.unwrap();
        drop(inbox);

        assert!(transport
            .send_task(&"worker-1".to_string(), request())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn detach_removes_the_inbox() {
        let transport = ChannelTransport::new();
        let _inbox = transport.attach("worker-1").await.unwrap();
        transport.detach("worker-1").await;

        assert!(transport.attached_workers().await.is_empty());
        assert!(transport
            .send_task(&"worker-1".to_string(), request())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn invalid_worker_id_cannot_attach() {
        let transport = ChannelTransport::new();
        assert!(transport.attach("bad id").await.is_err());
    }
}
