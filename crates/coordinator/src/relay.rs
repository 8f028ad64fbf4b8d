//! Result-to-request correlation.
//!
//! [`ResultRelay`] matches each incoming worker result to its pending
//! request and completes it. A result whose task id is absent from the
//! table is the expected, non-error outcome for a request that already
//! timed out. It can also legitimately happen when the coordinator
//! restarted (no persistence) or a worker echoes a stale id. Either way it
//! is logged and discarded; no caller is waiting.

use std::sync::Arc;

use fabric_core::event_names::EVENT_TASK_COMPLETED;
use fabric_core::task::{TaskOutcome, TaskResult};
use fabric_events::{EventBus, FabricEvent};

use crate::pending::{PendingTable, WaitOutcome};

pub struct ResultRelay {
    pending: Arc<PendingTable>,
    events: Arc<EventBus>,
}

impl ResultRelay {
    pub fn new(pending: Arc<PendingTable>, events: Arc<EventBus>) -> Self {
        Self { pending, events }
    }

    /// Resolve the pending entry for an incoming result.
    ///
    /// Uses the table's atomic take-and-remove, so a concurrent timeout on
    /// the same id cannot complete the entry twice.
    pub async fn on_result(&self, result: TaskResult) {
        let task_id = result.task_id;

        let Some(entry) = self.pending.complete(&task_id).await else {
            tracing::debug!(
                task_id = %task_id,
                "Discarding result for unknown or already-resolved task",
            );
            return;
        };

        let succeeded = matches!(result.outcome, TaskOutcome::Success { .. });
        tracing::info!(
            task_id = %task_id,
            task_kind = %entry.task_kind,
            succeeded,
            "Task completed",
        );

        self.events.publish(
            FabricEvent::new(EVENT_TASK_COMPLETED)
                .with_task(task_id)
                .with_payload(serde_json::json!({
                    "task_kind": entry.task_kind,
                    "succeeded": succeeded,
                })),
        );

        // The waiter may already be gone (ticket dropped); delivery is then
        // a no-op, matching the lossy event-bus contract.
        let _ = entry.waiter.send(WaitOutcome::Completed(result));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
