//! Broker container model: record, creation spec and the agent's single slot.
//!
//! Pure types only: no I/O.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::config::ClientId;
use crate::domain::error::LifecycleError;

// ── Constants ────────────────────────────────────────────────────────────────

/// Service port the broker listens on inside the container.
pub const BROKER_PORT: u16 = 9092;

/// Grace period given to the broker before it is killed on restart.
pub const RESTART_GRACE: Duration = Duration::from_secs(5);

/// Name of the properties file written into the mounted directory.
pub const PROPERTIES_FILE: &str = "server.properties";

/// Prefix of the private host directories handed to containers.
pub const HOST_DIR_PREFIX: &str = "ranch";

/// Tag pulled when an image reference names none.
pub const DEFAULT_TAG: &str = "latest";

/// Deterministic container name for an agent.
#[must_use]
pub fn container_name(id: ClientId) -> String {
    format!("ranch-{id}")
}

// ── Record ───────────────────────────────────────────────────────────────────

/// One provisioned broker container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    /// Runtime-assigned container id.
    pub id: String,
    pub name: String,
    /// Host directory bind-mounted into the container. Owned by this record.
    pub host_dir: PathBuf,
    /// Host port reserved for the broker's service port.
    pub host_port: u16,
}

impl ContainerRecord {
    #[must_use]
    pub fn properties_path(&self) -> PathBuf {
        self.host_dir.join(PROPERTIES_FILE)
    }
}

// ── Creation spec ────────────────────────────────────────────────────────────

/// Everything the runtime needs to create the broker container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub host_dir: PathBuf,
    /// Absolute path inside the container the host directory is mounted at.
    pub mount_target: String,
    pub host_port: u16,
    pub container_port: u16,
}

impl ContainerSpec {
    /// Broker container: host networking, TTY, no auto-removal, one bind mount
    /// and the broker port published on every host interface.
    #[must_use]
    pub fn broker(
        name: String,
        image: &str,
        host_dir: &Path,
        mount_target: &str,
        host_port: u16,
    ) -> Self {
        Self {
            name,
            image: image.to_string(),
            host_dir: host_dir.to_path_buf(),
            mount_target: mount_target.to_string(),
            host_port,
            container_port: BROKER_PORT,
        }
    }

    /// Port key in Docker's `<port>/<proto>` form.
    #[must_use]
    pub fn port_key(&self) -> String {
        format!("{}/tcp", self.container_port)
    }
}

// ── Image references ─────────────────────────────────────────────────────────

/// Split an image reference into the repository and the tag (or digest) to pull.
///
/// `kafka` → (`kafka`, `latest`), `reg:5000/kafka:7` → (`reg:5000/kafka`, `7`),
/// `kafka:7@sha256:ab` → (`kafka`, `sha256:ab`). An empty tag or digest falls
/// back to `latest`; the runtime would otherwise pull every tag.
#[must_use]
pub fn split_image_reference(image: &str) -> (&str, &str) {
    if let Some((name, digest)) = image.split_once('@') {
        let (repository, _) = split_tag(name);
        return (repository, non_empty_or_default(digest));
    }
    let (repository, tag) = split_tag(image);
    (repository, tag.map_or(DEFAULT_TAG, non_empty_or_default))
}

/// Split `name[:tag]`, ignoring a `:port` in the registry part.
fn split_tag(name: &str) -> (&str, Option<&str>) {
    let name_start = name.rfind('/').map_or(0, |i| i + 1);
    match name[name_start..].rfind(':') {
        Some(i) => (&name[..name_start + i], Some(&name[name_start + i + 1..])),
        None => (name, None),
    }
}

fn non_empty_or_default(reference: &str) -> &str {
    if reference.is_empty() {
        DEFAULT_TAG
    } else {
        reference
    }
}

/// Reject `Create` arguments the runtime would choke on, before any side effect.
///
/// # Errors
///
/// Returns `InvalidRequest` for an empty image or a relative mount target.
pub fn validate_create_request(image: &str, mount_target: &str) -> Result<(), LifecycleError> {
    if image.trim().is_empty() {
        return Err(LifecycleError::InvalidRequest(
            "image must not be empty".to_string(),
        ));
    }
    if !mount_target.starts_with('/') {
        return Err(LifecycleError::InvalidRequest(format!(
            "confPath must be an absolute path, got '{mount_target}'"
        )));
    }
    Ok(())
}

// ── Slot state machine ───────────────────────────────────────────────────────

/// The agent's single container slot.
///
/// `Uninitialized → Created → Removed`; never goes backwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ContainerSlot {
    #[default]
    Uninitialized,
    Created(ContainerRecord),
    Removed,
}

impl ContainerSlot {
    /// # Errors
    ///
    /// Returns `AlreadyCreated` or `ShuttingDown` unless the slot is empty.
    pub fn ensure_vacant(&self) -> Result<(), LifecycleError> {
        match self {
            Self::Uninitialized => Ok(()),
            Self::Created(_) => Err(LifecycleError::AlreadyCreated),
            Self::Removed => Err(LifecycleError::ShuttingDown),
        }
    }

    /// # Errors
    ///
    /// Returns `NotCreated` or `ShuttingDown` unless a container exists.
    pub fn record(&self) -> Result<&ContainerRecord, LifecycleError> {
        match self {
            Self::Created(record) => Ok(record),
            Self::Uninitialized => Err(LifecycleError::NotCreated),
            Self::Removed => Err(LifecycleError::ShuttingDown),
        }
    }

    /// Move to `Removed`, handing back the record if there was one.
    pub fn retire(&mut self) -> Option<ContainerRecord> {
        match std::mem::replace(self, Self::Removed) {
            Self::Created(record) => Some(record),
            Self::Uninitialized | Self::Removed => None,
        }
    }
}
