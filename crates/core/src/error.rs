use crate::types::TaskId;

/// Error taxonomy shared across the fabric crates.
///
/// Everything a caller can observe from the submit path is here. Results
/// arriving for unknown or already-resolved task ids are *not* errors;
/// they are logged and discarded by the relay, since no caller is waiting.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// No live worker existed at dispatch time.
    #[error("no live workers available")]
    NoWorkersAvailable,

    /// The transport hand-off failed twice (initial attempt plus one retry
    /// against a freshly computed live set).
    #[error("task dispatch failed: {0}")]
    DispatchFailed(String),

    /// No result arrived before the request deadline. The pending entry has
    /// already been released when this is surfaced.
    #[error("request timed out after {timeout_secs}s")]
    RequestTimeout { timeout_secs: u64 },

    /// A caller-supplied task id collided with an outstanding request.
    /// Nothing was registered or dispatched.
    #[error("duplicate task id: {0}")]
    DuplicateTaskId(TaskId),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}
