// Start/stop/restart with all-or-nothing registry updates.
// The registry only changes after the controller confirms success; operations on the
// same component are serialized by the record's control lock held across the whole transition.

use crate::controller::{ContainerController, ControllerError};
use crate::models::{
    Component, ComponentId, ComponentStatus, ComponentUpdate, LifecycleAction, LifecycleEvent,
};
use crate::registry::{ComponentRegistry, RegistryError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlFailureReason {
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("{0}")]
    Rejected(String),
    #[error("container missing: {0}")]
    ContainerMissing(String),
    #[error("runtime unavailable: {0}")]
    Unavailable(String),
}

impl From<ControllerError> for ControlFailureReason {
    fn from(e: ControllerError) -> Self {
        match e {
            ControllerError::Rejected(m) => ControlFailureReason::Rejected(m),
            ControllerError::NotFound(m) => ControlFailureReason::ContainerMissing(m),
            ControllerError::Unavailable(m) => ControlFailureReason::Unavailable(m),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("component {0} not found")]
    NotFound(ComponentId),
    #[error("component {0} is not running")]
    NotRunning(ComponentId),
    #[error("failed to {action} component {id}: {reason}")]
    ControlFailure {
        id: ComponentId,
        action: &'static str,
        reason: ControlFailureReason,
    },
}

impl From<RegistryError> for LifecycleError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(id) => LifecycleError::NotFound(id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Bound on each controller call; exceeding it is a control failure.
    pub timeout: Duration,
    /// Number of log lines requested from the controller.
    pub log_tail: usize,
}

pub struct LifecycleController {
    registry: Arc<ComponentRegistry>,
    controller: Arc<dyn ContainerController>,
    events: broadcast::Sender<LifecycleEvent>,
    config: LifecycleConfig,
}

impl LifecycleController {
    pub fn new(
        registry: Arc<ComponentRegistry>,
        controller: Arc<dyn ContainerController>,
        events: broadcast::Sender<LifecycleEvent>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            registry,
            controller,
            events,
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, ControllerError>>,
    ) -> Result<T, ControlFailureReason> {
        match tokio::time::timeout(self.config.timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ControlFailureReason::Timeout(
                self.config.timeout.as_millis() as u64,
            )),
        }
    }

    fn publish(
        &self,
        component: &Component,
        action: LifecycleAction,
        failure: Option<&ControlFailureReason>,
    ) {
        let event = LifecycleEvent {
            component_id: component.id,
            name: component.name.clone(),
            display_name: component.display_name.clone(),
            action,
            succeeded: failure.is_none(),
            reason: failure.map(|r| r.to_string()),
            status: component.status,
            timestamp: chrono::Utc::now(),
        };
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    fn fail(
        &self,
        component: &Component,
        action: LifecycleAction,
        reason: ControlFailureReason,
    ) -> LifecycleError {
        tracing::warn!(
            operation = action.as_str(),
            component = %component.name,
            reason = %reason,
            "lifecycle operation failed; registry unchanged"
        );
        self.publish(component, action, Some(&reason));
        LifecycleError::ControlFailure {
            id: component.id,
            action: action.as_str(),
            reason,
        }
    }

    fn running_update(container_id: String) -> ComponentUpdate {
        ComponentUpdate {
            status: Some(ComponentStatus::Running),
            enabled: Some(true),
            container_id: Some(Some(container_id)),
            created_at: Some(Some(chrono::Utc::now())),
            uptime: Some(Some("0m".into())),
            ..Default::default()
        }
    }

    /// Starts (`enabled = true`) or stops the component's container and records the outcome.
    pub async fn set_enabled(
        &self,
        id: ComponentId,
        enabled: bool,
    ) -> Result<Component, LifecycleError> {
        let lock = self.registry.control_lock(id)?;
        let _guard = lock.lock().await;
        let component = self.registry.get(id)?;

        let (action, update) = if enabled {
            let container_id = match self.call(self.controller.start(&component)).await {
                Ok(cid) => cid,
                Err(reason) => return Err(self.fail(&component, LifecycleAction::Start, reason)),
            };
            (LifecycleAction::Start, Self::running_update(container_id))
        } else {
            if let Err(reason) = self.call(self.controller.stop(&component)).await {
                return Err(self.fail(&component, LifecycleAction::Stop, reason));
            }
            let update = ComponentUpdate {
                status: Some(ComponentStatus::Stopped),
                enabled: Some(false),
                container_id: Some(None),
                uptime: Some(None),
                ..Default::default()
            };
            (LifecycleAction::Stop, update)
        };

        let updated = self.registry.update(id, update)?;
        tracing::info!(
            operation = action.as_str(),
            component = %updated.name,
            status = %updated.status,
            "lifecycle operation succeeded"
        );
        self.publish(&updated, action, None);
        Ok(updated)
    }

    pub async fn restart(&self, id: ComponentId) -> Result<Component, LifecycleError> {
        let lock = self.registry.control_lock(id)?;
        let _guard = lock.lock().await;
        let component = self.registry.get(id)?;

        let container_id = match self.call(self.controller.restart(&component)).await {
            Ok(cid) => cid,
            Err(reason) => return Err(self.fail(&component, LifecycleAction::Restart, reason)),
        };
        let updated = self.registry.update(id, Self::running_update(container_id))?;
        tracing::info!(
            operation = "restart",
            component = %updated.name,
            "lifecycle operation succeeded"
        );
        self.publish(&updated, LifecycleAction::Restart, None);
        Ok(updated)
    }

    /// Recent log lines from the component's container.
    pub async fn logs(&self, id: ComponentId) -> Result<Vec<String>, LifecycleError> {
        let component = self.registry.get(id)?;
        let container_id = component
            .container_id
            .as_deref()
            .ok_or(LifecycleError::NotRunning(id))?;
        self.call(self.controller.logs(container_id, self.config.log_tail))
            .await
            .map_err(|reason| LifecycleError::ControlFailure {
                id,
                action: "fetch logs for",
                reason,
            })
    }
}
