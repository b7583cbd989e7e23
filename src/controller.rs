// Container runtime capability consumed by the lifecycle controller

use crate::models::Component;

/// Why the runtime refused or could not perform an operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("runtime rejected the operation: {0}")]
    Rejected(String),
    #[error("container not found: {0}")]
    NotFound(String),
    #[error("runtime unavailable: {0}")]
    Unavailable(String),
}

/// A failed result must leave the backing container in the state it reports;
/// callers treat the returned value as ground truth.
#[async_trait::async_trait]
pub trait ContainerController: Send + Sync {
    /// Starts the component's container and returns its container id.
    async fn start(&self, component: &Component) -> Result<String, ControllerError>;

    async fn stop(&self, component: &Component) -> Result<(), ControllerError>;

    /// Restarts (or starts, if stopped) the container and returns its container id.
    async fn restart(&self, component: &Component) -> Result<String, ControllerError>;

    /// Most recent `tail` log lines, oldest first.
    async fn logs(&self, container_id: &str, tail: usize) -> Result<Vec<String>, ControllerError>;
}
