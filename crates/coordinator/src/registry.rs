//! Heartbeat-driven worker liveness registry.
//!
//! [`WorkerRegistry`] tracks every worker identity that has heartbeated,
//! answers the authoritative "is this worker eligible for dispatch" query,
//! and evicts identities whose heartbeat age exceeds the liveness timeout.
//! Eviction has no side effect on already-dispatched tasks: a request whose
//! worker vanished simply times out.
//!
//! All operations take explicit `at` timestamps so liveness arithmetic is
//! deterministic under test.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;

use fabric_core::task::Heartbeat;
use fabric_core::types::{Timestamp, WorkerId};
use fabric_core::worker::satisfies_capabilities;

/// Everything the registry knows about one worker identity.
///
/// A worker that reappears after eviction gets a brand-new record; no
/// continuity of in-flight task state is assumed.
#[derive(Debug, Clone)]
pub struct WorkerRecord {
    pub worker_id: WorkerId,
    /// Timestamp of the most recently received heartbeat.
    pub last_heartbeat_at: Timestamp,
    /// When this identity was first seen (or re-seen after eviction).
    pub first_seen_at: Timestamp,
    /// Capability tags carried by the latest heartbeat.
    pub capabilities: Vec<String>,
}

/// Shared worker liveness map.
///
/// Wraps `RwLock<HashMap<..>>` so heartbeat ingestion, dispatch queries,
/// and the eviction sweep can run concurrently. The lock never spans the
/// pending table; operations on one collection do not block the other.
pub struct WorkerRegistry {
    workers: RwLock<HashMap<WorkerId, WorkerRecord>>,
    liveness_timeout: chrono::Duration,
}

impl WorkerRegistry {
    pub fn new(liveness_timeout: Duration) -> Self {
        Self {
            workers: RwLock::new(HashMap::new()),
            liveness_timeout: chrono::Duration::from_std(liveness_timeout)
                .unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Insert or refresh the record for the heartbeating worker.
    ///
    /// Idempotent; no error conditions. The latest heartbeat's capability
    /// tags replace whatever was advertised before.
    pub async fn record_heartbeat(&self, heartbeat: &Heartbeat, at: Timestamp) {
        let mut workers = self.workers.write().await;
        match workers.get_mut(&heartbeat.worker_id) {
            Some(record) => {
                record.last_heartbeat_at = at;
                record.capabilities = heartbeat.capabilities.clone();
            }
            None => {
                tracing::info!(worker_id = %heartbeat.worker_id, "Worker joined the pool");
                workers.insert(
                    heartbeat.worker_id.clone(),
                    WorkerRecord {
                        worker_id: heartbeat.worker_id.clone(),
                        last_heartbeat_at: at,
                        first_seen_at: at,
                        capabilities: heartbeat.capabilities.clone(),
                    },
                );
            }
        }
    }

    /// All workers whose heartbeat age is within the liveness timeout,
    /// sorted by id for deterministic selection.
    ///
    /// A worker with zero heartbeats is never live.
    pub async fn live_workers(&self, at: Timestamp) -> Vec<WorkerId> {
        let workers = self.workers.read().await;
        let mut live: Vec<WorkerId> = workers
            .values()
            .filter(|record| self.is_live(record, at))
            .map(|record| record.worker_id.clone())
            .collect();
        live.sort();
        live
    }

    /// Live workers carrying every tag in `required`.
    ///
    /// Forward-compatible capability routing; default dispatch passes no
    /// filter and never consults the task kind.
    pub async fn live_workers_with(&self, at: Timestamp, required: &[String]) -> Vec<WorkerId> {
        let workers = self.workers.read().await;
        let mut live: Vec<WorkerId> = workers
            .values()
            .filter(|record| {
                self.is_live(record, at) && satisfies_capabilities(&record.capabilities, required)
            })
            .map(|record| record.worker_id.clone())
            .collect();
        live.sort();
        live
    }

    /// Remove every record whose heartbeat age exceeds the liveness
    /// timeout; returns the evicted ids sorted by id.
    pub async fn sweep(&self, at: Timestamp) -> Vec<WorkerId> {
        let mut workers = self.workers.write().await;
        let mut evicted: Vec<WorkerId> = workers
            .values()
            .filter(|record| !self.is_live(record, at))
            .map(|record| record.worker_id.clone())
            .collect();
        evicted.sort();
        for worker_id in &evicted {
            workers.remove(worker_id);
        }
        evicted
    }

    /// Current records, sorted by worker id. Monitoring surface.
    pub async fn snapshot(&self) -> Vec<WorkerRecord> {
        let workers = self.workers.read().await;
        let mut records: Vec<WorkerRecord> = workers.values().cloned().collect();
        records.sort_by(|a, b| a.worker_id.cmp(&b.worker_id));
        records
    }

    fn is_live(&self, record: &WorkerRecord, at: Timestamp) -> bool {
        at.signed_duration_since(record.last_heartbeat_at) <= self.liveness_timeout
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
