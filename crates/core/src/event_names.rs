//! Well-known observability event name constants.
//!
//! These must match the `event_type` values published on the event bus and
//! consumed by external sinks (dashboards, log shippers).

/// A worker was removed from the registry after exceeding the liveness
/// timeout without a heartbeat.
pub const EVENT_WORKER_EVICTED: &str = "worker.evicted";

/// A task request was handed to a worker via the transport.
pub const EVENT_TASK_DISPATCHED: &str = "task.dispatched";

/// A worker result was correlated back to its pending request.
pub const EVENT_TASK_COMPLETED: &str = "task.completed";

/// A dispatched request reached its deadline with no result.
pub const EVENT_TASK_TIMED_OUT: &str = "task.timed_out";
