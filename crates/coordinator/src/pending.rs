//! Outstanding-request correlation table.
//!
//! [`PendingTable`] maps a task id to the context needed to answer the
//! original caller: a oneshot waiter channel plus the request deadline.
//! Entries are created exactly once at registration and removed exactly
//! once, either by the relay on result arrival ([`PendingTable::complete`])
//! or by the timeout path ([`PendingTable::expire`]). Both removal paths
//! are the same atomic take-and-remove under one lock, so a race between a
//! late result and a timeout has exactly one winner; the loser observes
//! `None` and takes no further action.

use std::collections::HashMap;

use tokio::sync::{oneshot, Mutex};

use fabric_core::error::CoreError;
use fabric_core::task::TaskResult;
use fabric_core::types::{TaskId, Timestamp};

/// What a waiter receives through its oneshot channel.
#[derive(Debug)]
pub enum WaitOutcome {
    /// The worker's result arrived before the deadline.
    Completed(TaskResult),
    /// The deadline sweep expired the entry before a result arrived.
    /// Waiters running their own timer never see this; they observe the
    /// timer firing instead.
    TimedOut,
}

/// Coordinator-side record of a dispatched-but-unresolved request.
#[derive(Debug)]
pub struct PendingEntry {
    /// Completes the original caller's wait.
    pub waiter: oneshot::Sender<WaitOutcome>,
    /// `submitted_at + request_timeout`; consulted by the deadline sweep.
    pub deadline: Timestamp,
    /// Kept for log and event context only; never interpreted.
    pub task_kind: String,
}

/// Shared table of outstanding requests.
///
/// A `task_id` is single-use end-to-end: at any moment ids in the table are
/// unique, and once removed an id is never reinserted.
#[derive(Default)]
pub struct PendingTable {
    entries: Mutex<HashMap<TaskId, PendingEntry>>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the entry for a freshly dispatched request.
    ///
    /// Fails with [`CoreError::DuplicateTaskId`] if the id is already
    /// outstanding; the existing entry is left untouched.
    pub async fn register(
        &self,
        task_id: TaskId,
        waiter: oneshot::Sender<WaitOutcome>,
        deadline: Timestamp,
        task_kind: impl Into<String>,
    ) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&task_id) {
            return Err(CoreError::DuplicateTaskId(task_id));
        }
        entries.insert(
            task_id,
            PendingEntry {
                waiter,
                deadline,
                task_kind: task_kind.into(),
            },
        );
        Ok(())
    }

    /// Atomic take-and-remove on result arrival.
    ///
    /// `None` means the entry is absent: already completed, already
    /// expired, or never registered.
    pub async fn complete(&self, task_id: &TaskId) -> Option<PendingEntry> {
        self.take(task_id).await
    }

    /// Atomic take-and-remove on deadline expiry.
    ///
    /// Same contract as [`complete`](Self::complete); exactly one of the
    /// two wins for any given id.
    pub async fn expire(&self, task_id: &TaskId) -> Option<PendingEntry> {
        self.take(task_id).await
    }

    /// Ids whose deadline is at or before `at`, for the periodic sweep.
    ///
    /// The sweep must still route each id through [`expire`](Self::expire);
    /// an id returned here may be completed concurrently before the sweep
    /// reaches it.
    pub async fn pending_before(&self, at: Timestamp) -> Vec<TaskId> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .filter(|(_, entry)| entry.deadline <= at)
            .map(|(task_id, _)| *task_id)
            .collect()
    }

    /// Number of outstanding requests.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn take(&self, task_id: &TaskId) -> Option<PendingEntry> {
        self.entries.lock().await.remove(task_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
