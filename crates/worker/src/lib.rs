//! Fabric worker harness.
//!
//! Everything a worker process needs around its actual processing
//! functions: a periodic [`heartbeat`] loop, and a [`WorkerRunner`] that
//! receives dispatched tasks, invokes the [`TaskExecutor`] boundary, and
//! reports outcomes back to the coordinator. What `execute` actually does
//! (image transforms, ML inference, ...) is the embedder's business.

pub mod executor;
pub mod heartbeat;
pub mod runner;

pub use executor::{ExecutionError, TaskExecutor};
pub use runner::WorkerRunner;
