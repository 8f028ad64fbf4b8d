//! Fabric observability event infrastructure.
//!
//! The coordinator emits structured events (`worker.evicted`,
//! `task.dispatched`, `task.completed`, `task.timed_out`) to an in-process
//! bus; external sinks subscribe and ship them wherever they like. Event
//! name constants live in [`fabric_core::event_names`].
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`FabricEvent`] — the canonical event envelope.

pub mod bus;

pub use bus::{EventBus, FabricEvent};
