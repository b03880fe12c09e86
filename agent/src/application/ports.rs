//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`
//! or `crate::rpc`.
//!
//! The traits are object-safe and `Send + Sync`: the client service is shared
//! across request tasks and hands the runtime to its log-capture task.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{ClientId, ContainerSpec, RegistrationError, RegistryCredentials};

// ── Container Runtime Port ────────────────────────────────────────────────────

/// Container engine operations the lifecycle manager drives.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Pull `image`, authenticating with `credentials`, and wait for completion.
    async fn pull_image(&self, image: &str, credentials: &RegistryCredentials) -> Result<()>;
    /// Create (but do not start) a container, returning its runtime id.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String>;
    async fn start_container(&self, id: &str) -> Result<()>;
    /// Restart, giving the old process `grace` before it is killed.
    async fn restart_container(&self, id: &str, grace: Duration) -> Result<()>;
    /// Whether the container is currently running.
    async fn is_running(&self, id: &str) -> Result<bool>;
    /// Point-in-time stdout+stderr with timestamps.
    async fn logs(&self, id: &str) -> Result<String>;
    /// Remove the container even if it is running.
    async fn force_remove(&self, id: &str) -> Result<()>;
}

// ── Host Resource Ports ───────────────────────────────────────────────────────

/// Hands out free host TCP ports.
pub trait PortAllocator: Send + Sync {
    /// Return a port that is free at the time of the call.
    fn allocate(&self) -> Result<u16>;
}

/// Host filesystem operations on container-owned directories.
pub trait HostFs: Send + Sync {
    /// Create a fresh directory readable only by this user.
    fn create_private_dir(&self) -> Result<PathBuf>;
    /// Remove a directory tree. A missing directory is not an error.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    /// Create or truncate `path` and write `contents`.
    fn write_file(&self, path: &Path, contents: &str) -> Result<()>;
}

// ── Orchestrator Port ─────────────────────────────────────────────────────────

/// Registration handshake with the orchestrator.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn register(&self, id: ClientId) -> std::result::Result<(), RegistrationError>;
}
