//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`FabricEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` across the coordinator's
//! flows.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use fabric_core::types::{TaskId, Timestamp, WorkerId};

// ---------------------------------------------------------------------------
// FabricEvent
// ---------------------------------------------------------------------------

/// A coordinator lifecycle event.
///
/// Constructed via [`FabricEvent::new`] and enriched with the builder
/// methods [`with_worker`](FabricEvent::with_worker),
/// [`with_task`](FabricEvent::with_task), and
/// [`with_payload`](FabricEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricEvent {
    /// Dot-separated event name, e.g. `"task.completed"`.
    pub event_type: String,

    /// Worker the event concerns, when there is one.
    pub worker_id: Option<WorkerId>,

    /// Task the event concerns, when there is one.
    pub task_id: Option<TaskId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: Timestamp,
}

impl FabricEvent {
    /// Create a new event with only the required `event_type`.
    ///
    /// All optional fields default to `None` / empty object.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            worker_id: None,
            task_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the worker the event concerns.
    pub fn with_worker(mut self, worker_id: impl Into<WorkerId>) -> Self {
        self.worker_id = Some(worker_id.into());
        self
    }

    /// Attach the task the event concerns.
    pub fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`FabricEvent`].
///
/// # Usage
///
/// ```rust
/// use fabric_events::bus::{EventBus, FabricEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(FabricEvent::new("worker.evicted").with_worker("worker-101"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<FabricEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// the fabric does not persist events.
    pub fn publish(&self, event: FabricEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<FabricEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
