//! Infrastructure implementation of the `ContainerRuntime` port over the
//! Docker Engine API.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, LogsOptions, RemoveContainerOptions,
    RestartContainerOptions, StartContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, Mount, MountTypeEnum, PortBinding};
use futures_util::TryStreamExt;

use crate::application::ports::ContainerRuntime;
use crate::domain::container::split_image_reference;
use crate::domain::{ContainerSpec, RegistryCredentials};

/// Production `ContainerRuntime` backed by the local Docker daemon.
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Build a client from `DOCKER_HOST` or the platform default socket.
    ///
    /// No connection is made until the first request.
    ///
    /// # Errors
    ///
    /// Returns an error if the Docker environment is malformed.
    pub fn from_env() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults().context("failed to create docker client")?;
        Ok(Self { docker })
    }
}

/// Docker create-container body for the broker.
pub fn container_config(spec: &ContainerSpec) -> Config<String> {
    let port_key = spec.port_key();
    let port_bindings = HashMap::from([(
        port_key.clone(),
        Some(vec![PortBinding {
            host_ip: Some("0.0.0.0".to_string()),
            host_port: Some(spec.host_port.to_string()),
        }]),
    )]);

    let host_config = HostConfig {
        network_mode: Some("host".to_string()),
        port_bindings: Some(port_bindings),
        auto_remove: Some(false),
        mounts: Some(vec![Mount {
            typ: Some(MountTypeEnum::BIND),
            source: Some(spec.host_dir.to_string_lossy().into_owned()),
            target: Some(spec.mount_target.clone()),
            ..Default::default()
        }]),
        ..Default::default()
    };

    Config {
        hostname: Some(spec.name.clone()),
        image: Some(spec.image.clone()),
        tty: Some(true),
        exposed_ports: Some(HashMap::from([(port_key, HashMap::new())])),
        network_disabled: Some(false),
        host_config: Some(host_config),
        ..Default::default()
    }
}

/// Pull request for one tag (or digest) of `image`, never every tag.
pub fn pull_options(image: &str) -> CreateImageOptions<String> {
    let (repository, tag) = split_image_reference(image);
    CreateImageOptions {
        from_image: repository.to_string(),
        tag: tag.to_string(),
        ..Default::default()
    }
}

/// Registry auth for image pulls. Bollard encodes the header.
pub fn registry_auth(credentials: &RegistryCredentials) -> DockerCredentials {
    DockerCredentials {
        username: Some(credentials.username().to_string()),
        password: Some(credentials.password().to_string()),
        ..Default::default()
    }
}

/// Point-in-time stdout and stderr with timestamps.
pub fn logs_options() -> LogsOptions<String> {
    LogsOptions {
        stdout: true,
        stderr: true,
        timestamps: true,
        follow: false,
        ..Default::default()
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn pull_image(&self, image: &str, credentials: &RegistryCredentials) -> Result<()> {
        let options = pull_options(image);
        let reference = format!("{}:{}", options.from_image, options.tag);

        self.docker
            .create_image(Some(options), None, Some(registry_auth(credentials)))
            .try_for_each(|info| {
                let reference = &reference;
                async move {
                    if let Some(status) = info.status {
                        tracing::debug!(image = %reference, %status, "pull progress");
                    }
                    Ok(())
                }
            })
            .await
            .with_context(|| format!("pulling {reference}"))
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };
        let response = self
            .docker
            .create_container(Some(options), container_config(spec))
            .await
            .with_context(|| format!("creating container {}", spec.name))?;
        for warning in &response.warnings {
            tracing::warn!(container = %spec.name, %warning, "docker warning on create");
        }
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .with_context(|| format!("starting container {id}"))
    }

    async fn restart_container(&self, id: &str, grace: Duration) -> Result<()> {
        let t = isize::try_from(grace.as_secs()).unwrap_or(isize::MAX);
        self.docker
            .restart_container(id, Some(RestartContainerOptions { t }))
            .await
            .with_context(|| format!("restarting container {id}"))
    }

    async fn is_running(&self, id: &str) -> Result<bool> {
        let details = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .with_context(|| format!("inspecting container {id}"))?;
        Ok(details
            .state
            .and_then(|state| state.running)
            .unwrap_or(false))
    }

    async fn logs(&self, id: &str) -> Result<String> {
        self.docker
            .logs(id, Some(logs_options()))
            .try_fold(String::new(), |mut acc, chunk| async move {
                acc.push_str(&chunk.to_string());
                Ok(acc)
            })
            .await
            .with_context(|| format!("reading logs of container {id}"))
    }

    async fn force_remove(&self, id: &str) -> Result<()> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
            .with_context(|| format!("removing container {id}"))
    }
}
