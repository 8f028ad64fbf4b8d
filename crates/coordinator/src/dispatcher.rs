//! Worker selection and transport hand-off.
//!
//! [`Dispatcher`] picks a live worker for each task and hands the request
//! to the transport. Selection is round-robin over the sorted live set:
//! the simplest fair policy, with bounded worst-case staleness. Selection
//! never correlates with `task_kind`; the optional capability filter on
//! [`Dispatcher::dispatch`] exists for capability-aware routing and is not
//! used by the default submit path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;

use fabric_core::error::CoreError;
use fabric_core::task::TaskRequest;
use fabric_core::transport::TaskTransport;
use fabric_core::types::WorkerId;

use crate::registry::WorkerRegistry;

pub struct Dispatcher {
    registry: Arc<WorkerRegistry>,
    transport: Arc<dyn TaskTransport>,
    /// Round-robin cursor; wraps over the current live set.
    cursor: AtomicUsize,
}

impl Dispatcher {
    pub fn new(registry: Arc<WorkerRegistry>, transport: Arc<dyn TaskTransport>) -> Self {
        Self {
            registry,
            transport,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Pick the next worker from the live set.
    ///
    /// Fails with [`CoreError::NoWorkersAvailable`] when the set is empty.
    pub fn select_worker(&self, live: &[WorkerId]) -> Result<WorkerId, CoreError> {
        if live.is_empty() {
            return Err(CoreError::NoWorkersAvailable);
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % live.len();
        Ok(live[index].clone())
    }

    /// Select a live worker and hand the request to the transport.
    ///
    /// If the hand-off fails (the chosen worker disconnected between
    /// selection and send), selection is retried once against a freshly
    /// computed live set. A second transport failure surfaces
    /// [`CoreError::DispatchFailed`]; an empty live set surfaces
    /// [`CoreError::NoWorkersAvailable`] on either attempt.
    pub async fn dispatch(
        &self,
        request: &TaskRequest,
        required_capabilities: Option<&[String]>,
    ) -> Result<WorkerId, CoreError> {
        let live = self.live_set(required_capabilities).await;
        let worker_id = self.select_worker(&live)?;

        let first_failure = match self.transport.send_task(&worker_id, request.clone()).await {
            Ok(()) => return Ok(worker_id),
            Err(e) => e,
        };

        tracing::warn!(
            task_id = %request.task_id,
            worker_id = %worker_id,
            error = %first_failure,
            "Task hand-off failed, retrying against a fresh live set",
        );

        let live = self.live_set(required_capabilities).await;
        let retry_worker = self.select_worker(&live)?;
        self.transport
            .send_task(&retry_worker, request.clone())
            .await
            .map_err(|second_failure| {
                CoreError::DispatchFailed(format!(
                    "hand-off to {worker_id} failed ({first_failure}), \
                     retry to {retry_worker} failed ({second_failure})"
                ))
            })?;

        Ok(retry_worker)
    }

    async fn live_set(&self, required_capabilities: Option<&[String]>) -> Vec<WorkerId> {
        let now = Utc::now();
        match required_capabilities {
            Some(required) => self.registry.live_workers_with(now, required).await,
            None => self.registry.live_workers(now).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
