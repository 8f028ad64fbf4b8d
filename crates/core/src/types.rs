/// Correlation token tying a submitted request to its eventual result.
///
/// Generated by the coordinator at submission time unless the caller
/// supplies one. Single-use: once a task id has been resolved it is never
/// reused.
pub type TaskId = uuid::Uuid;

/// Worker identity, chosen by the worker itself and stable for its lifetime.
pub type WorkerId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
