// Docker-backed adapters via bollard: container control and host/container telemetry.

mod host;
mod stats;

pub use host::HostMetricsSource;

use crate::controller::{ContainerController, ControllerError};
use crate::models::Component;
use bollard::Docker;
use bollard::errors::Error as DockerError;
use bollard::query_parameters::{
    InspectContainerOptions, LogsOptions, RestartContainerOptions, StartContainerOptions,
    StopContainerOptions,
};
use futures_util::StreamExt;
use tracing::instrument;

/// "Not modified": the container was already in the requested state.
const NOT_MODIFIED: u16 = 304;
const NOT_FOUND: u16 = 404;

fn classify(e: DockerError) -> ControllerError {
    match e {
        DockerError::DockerResponseServerError {
            status_code,
            message,
        } if status_code == NOT_FOUND => ControllerError::NotFound(message),
        DockerError::DockerResponseServerError { message, .. } => {
            ControllerError::Rejected(message)
        }
        other => ControllerError::Unavailable(other.to_string()),
    }
}

fn is_not_modified(e: &DockerError) -> bool {
    matches!(
        e,
        DockerError::DockerResponseServerError { status_code, .. } if *status_code == NOT_MODIFIED
    )
}

/// Controls one container per component, addressed by container id or component name.
#[derive(Clone)]
pub struct DockerController {
    docker: Docker,
}

impl DockerController {
    pub fn from_client(docker: Docker) -> Self {
        Self { docker }
    }

    async fn container_id(&self, name: &str) -> Result<String, ControllerError> {
        let info = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .map_err(classify)?;
        Ok(info.id.unwrap_or_else(|| name.to_string()))
    }
}

#[async_trait::async_trait]
impl ContainerController for DockerController {
    #[instrument(skip_all, fields(adapter = "docker", operation = "start", component = %component.name))]
    async fn start(&self, component: &Component) -> Result<String, ControllerError> {
        let target = component.name.as_str();
        match self
            .docker
            .start_container(target, None::<StartContainerOptions>)
            .await
        {
            Ok(()) => {}
            Err(e) if is_not_modified(&e) => {
                tracing::debug!("container already running");
            }
            Err(e) => return Err(classify(e)),
        }
        self.container_id(target).await
    }

    #[instrument(skip_all, fields(adapter = "docker", operation = "stop", component = %component.name))]
    async fn stop(&self, component: &Component) -> Result<(), ControllerError> {
        match self
            .docker
            .stop_container(component.container_ref(), None::<StopContainerOptions>)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if is_not_modified(&e) => {
                tracing::debug!("container already stopped");
                Ok(())
            }
            Err(e) => Err(classify(e)),
        }
    }

    #[instrument(skip_all, fields(adapter = "docker", operation = "restart", component = %component.name))]
    async fn restart(&self, component: &Component) -> Result<String, ControllerError> {
        let target = component.container_ref();
        self.docker
            .restart_container(target, None::<RestartContainerOptions>)
            .await
            .map_err(classify)?;
        self.container_id(target).await
    }

    #[instrument(skip(self), fields(adapter = "docker", operation = "logs"))]
    async fn logs(&self, container_id: &str, tail: usize) -> Result<Vec<String>, ControllerError> {
        let options = LogsOptions {
            stdout: true,
            stderr: true,
            tail: tail.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.logs(container_id, Some(options));
        let mut lines = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(classify)?;
            lines.extend(
                chunk
                    .to_string()
                    .lines()
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
            );
        }
        Ok(lines)
    }
}
