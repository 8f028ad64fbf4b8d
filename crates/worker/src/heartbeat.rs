//! Periodic heartbeat push loop.
//!
//! Runs as its own task so a long-running execution never stalls the
//! liveness signal. The first heartbeat fires immediately, so a freshly
//! started worker becomes dispatch-eligible without waiting a full
//! interval.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use fabric_core::task::Heartbeat;
use fabric_core::transport::HeartbeatSink;
use fabric_core::types::WorkerId;

/// Push heartbeats at `interval` until cancelled.
pub async fn run(
    sink: Arc<dyn HeartbeatSink>,
    worker_id: WorkerId,
    capabilities: Vec<String>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    tracing::debug!(
        worker_id = %worker_id,
        interval_ms = interval.as_millis() as u64,
        "Heartbeat loop started",
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(worker_id = %worker_id, "Heartbeat loop stopped");
                break;
            }
            _ = ticker.tick() => {
                sink.send_heartbeat(
                    Heartbeat::new(worker_id.clone())
                        .with_capabilities(capabilities.clone()),
                )
                .await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
