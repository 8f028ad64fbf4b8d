//! Fabric coordinator: the task-dispatch core.
//!
//! Clients submit opaque work, the coordinator hands it to a live worker
//! from a heartbeat-tracked pool, and the asynchronous result is correlated
//! back to the waiting client by task id.
//!
//! - [`WorkerRegistry`] — heartbeat-driven worker liveness tracking.
//! - [`PendingTable`] — outstanding-request correlation with atomic
//!   take-and-remove resolution.
//! - [`Dispatcher`] — round-robin worker selection and transport hand-off.
//! - [`ResultRelay`] — matches incoming results to pending requests.
//! - [`Coordinator`] — composes the above into the submit → dispatch →
//!   await → relay flow, with timeout enforcement and background sweeps.
//! - [`ChannelTransport`] — in-process transport for embedding and tests.

pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod pending;
pub mod registry;
pub mod relay;
pub mod transport;

pub use config::FabricConfig;
pub use coordinator::{Coordinator, TaskTicket};
pub use dispatcher::Dispatcher;
pub use pending::{PendingTable, WaitOutcome};
pub use registry::{WorkerRecord, WorkerRegistry};
pub use relay::ResultRelay;
pub use transport::ChannelTransport;
