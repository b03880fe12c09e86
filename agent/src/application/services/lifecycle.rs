//! Container lifecycle operations: provision, start, restart, state, logs, remove.
//!
//! Every operation works on at most one `ContainerRecord` and names the
//! failing step in its error. Imports only from `crate::domain` and
//! `crate::application::ports`.

use std::path::Path;

use crate::application::ports::{ContainerRuntime, HostFs, PortAllocator};
use crate::domain::container::{RESTART_GRACE, container_name};
use crate::domain::{
    CleanupError, ClientId, ContainerRecord, ContainerSpec, LifecycleError, LifecycleOp,
    RegistryCredentials,
};

/// Inputs of [`provision`].
pub struct ProvisionRequest<'a> {
    pub client_id: ClientId,
    pub image: &'a str,
    /// Absolute path inside the container.
    pub mount_target: &'a str,
    /// Already-created host directory; its lifecycle belongs to the caller.
    pub host_dir: &'a Path,
    pub credentials: &'a RegistryCredentials,
}

/// Pull the image, reserve a host port and create the broker container.
///
/// Never touches the host directory, even on failure.
///
/// # Errors
///
/// Returns `LifecycleError::Failed` naming the pull, port or create step.
pub async fn provision(
    runtime: &dyn ContainerRuntime,
    ports: &dyn PortAllocator,
    req: ProvisionRequest<'_>,
) -> Result<ContainerRecord, LifecycleError> {
    runtime
        .pull_image(req.image, req.credentials)
        .await
        .map_err(LifecycleError::failed(LifecycleOp::PullImage))?;
    tracing::info!(image = req.image, "image pulled");

    let host_port = ports
        .allocate()
        .map_err(LifecycleError::failed(LifecycleOp::AllocatePort))?;

    let name = container_name(req.client_id);
    let spec = ContainerSpec::broker(
        name.clone(),
        req.image,
        req.host_dir,
        req.mount_target,
        host_port,
    );
    let id = runtime
        .create_container(&spec)
        .await
        .map_err(LifecycleError::failed(LifecycleOp::CreateContainer))?;

    tracing::info!(container = %name, id = %id, host_port, "container created");
    Ok(ContainerRecord {
        id,
        name,
        host_dir: req.host_dir.to_path_buf(),
        host_port,
    })
}

/// # Errors
///
/// Returns `LifecycleError::Failed` with `LifecycleOp::Start`.
pub async fn start(
    runtime: &dyn ContainerRuntime,
    record: &ContainerRecord,
) -> Result<(), LifecycleError> {
    runtime
        .start_container(&record.id)
        .await
        .map_err(LifecycleError::failed(LifecycleOp::Start))
}

/// Restart with the fixed grace period.
///
/// # Errors
///
/// Returns `LifecycleError::Failed` with `LifecycleOp::Restart`.
pub async fn restart(
    runtime: &dyn ContainerRuntime,
    record: &ContainerRecord,
) -> Result<(), LifecycleError> {
    runtime
        .restart_container(&record.id, RESTART_GRACE)
        .await
        .map_err(LifecycleError::failed(LifecycleOp::Restart))
}

/// Ask the runtime; the answer is never cached.
///
/// # Errors
///
/// Returns `LifecycleError::Failed` with `LifecycleOp::Inspect`.
pub async fn running(
    runtime: &dyn ContainerRuntime,
    record: &ContainerRecord,
) -> Result<bool, LifecycleError> {
    runtime
        .is_running(&record.id)
        .await
        .map_err(LifecycleError::failed(LifecycleOp::Inspect))
}

/// # Errors
///
/// Returns `LifecycleError::Failed` with `LifecycleOp::Logs`.
pub async fn logs(
    runtime: &dyn ContainerRuntime,
    record: &ContainerRecord,
) -> Result<String, LifecycleError> {
    runtime
        .logs(&record.id)
        .await
        .map_err(LifecycleError::failed(LifecycleOp::Logs))
}

/// Remove the host directory, then force-remove the container.
///
/// Both halves are always attempted. The first failure is returned; a second
/// one is only logged.
///
/// # Errors
///
/// Returns `CleanupError::Directory` or `CleanupError::Container`.
pub async fn remove(
    runtime: &dyn ContainerRuntime,
    fs: &dyn HostFs,
    record: &ContainerRecord,
) -> Result<(), CleanupError> {
    let dir = fs
        .remove_dir_all(&record.host_dir)
        .map_err(|source| CleanupError::Directory {
            path: record.host_dir.clone(),
            source,
        });
    if let Err(err) = &dir {
        tracing::warn!(container = %record.name, error = %err, "host directory not removed");
    }

    let container = runtime
        .force_remove(&record.id)
        .await
        .map_err(|source| CleanupError::Container {
            id: record.id.clone(),
            source,
        });
    if let Err(err) = &container {
        tracing::warn!(container = %record.name, error = %err, "container not removed");
    }

    dir.and(container)
}
