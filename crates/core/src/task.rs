//! Task and heartbeat wire types.
//!
//! The fabric forwards `task_kind` and payload bytes without interpreting
//! either; what a kind means is a contract between the submitting client
//! and the worker's executor.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::{TaskId, Timestamp, WorkerId};

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// A unit of work as handed to the coordinator by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSubmission {
    /// Optional caller-supplied correlation id. When absent the coordinator
    /// generates one; when present it must not collide with any
    /// outstanding request.
    #[serde(default)]
    pub task_id: Option<TaskId>,

    /// Tag selecting which processing capability to invoke
    /// (e.g. `"grayscale"`, `"edge"`).
    pub task_kind: String,

    /// Opaque work input.
    #[serde(with = "serde_bytes_base64")]
    pub payload: Vec<u8>,
}

impl TaskSubmission {
    pub fn new(task_kind: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            task_id: None,
            task_kind: task_kind.into(),
            payload,
        }
    }

    /// Pin the submission to a caller-chosen task id.
    pub fn with_task_id(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }
}

// ---------------------------------------------------------------------------
// Request / result
// ---------------------------------------------------------------------------

/// A dispatched unit of work as delivered to a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub task_id: TaskId,
    pub task_kind: String,
    #[serde(with = "serde_bytes_base64")]
    pub payload: Vec<u8>,
    /// When the coordinator accepted the submission; timeout accounting is
    /// anchored here.
    pub submitted_at: Timestamp,
}

/// What a worker produced for a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Success {
        #[serde(with = "serde_bytes_base64")]
        payload: Vec<u8>,
    },
    Failure {
        error: String,
    },
}

/// A worker's answer for a previously dispatched task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Must match a dispatched [`TaskRequest::task_id`]; results carrying
    /// unknown ids are discarded by the relay.
    pub task_id: TaskId,
    #[serde(flatten)]
    pub outcome: TaskOutcome,
}

impl TaskResult {
    pub fn success(task_id: TaskId, payload: Vec<u8>) -> Self {
        Self {
            task_id,
            outcome: TaskOutcome::Success { payload },
        }
    }

    pub fn failure(task_id: TaskId, error: impl Into<String>) -> Self {
        Self {
            task_id,
            outcome: TaskOutcome::Failure {
                error: error.into(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

/// Periodic liveness signal sent by a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    pub worker_id: WorkerId,
    pub sent_at: Timestamp,
    /// Free-form capability tags (e.g. `"gpu"`). Empty for workers that do
    /// not advertise capabilities.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl Heartbeat {
    /// Create a heartbeat stamped with the current time.
    pub fn new(worker_id: impl Into<WorkerId>) -> Self {
        Self {
            worker_id: worker_id.into(),
            sent_at: Utc::now(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }
}

// ---------------------------------------------------------------------------
// Payload encoding
// ---------------------------------------------------------------------------

/// Serialize opaque payload bytes as base64 text, the shape the original
/// wire protocol used for image payloads.
mod serde_bytes_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(&text).map_err(serde::de::Error::custom)
    }
}
