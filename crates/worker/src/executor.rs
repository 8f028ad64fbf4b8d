use async_trait::async_trait;

/// Why an executor could not produce output for a task.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// The worker has no handler for this task kind.
    #[error("unsupported task kind: {0}")]
    UnsupportedKind(String),

    /// The handler ran and failed.
    #[error("execution failed: {0}")]
    Failed(String),
}

/// The processing boundary: `(task_kind, payload) -> payload`.
///
/// The fabric forwards both arguments opaquely; what a kind means is a
/// contract between the submitting client and this implementation.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, task_kind: &str, payload: &[u8]) -> Result<Vec<u8>, ExecutionError>;
}
