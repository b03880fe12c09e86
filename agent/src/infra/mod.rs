//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: the Docker client, the
//! orchestrator client, port allocation, host directories and signals.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::rpc` are forbidden.

pub mod docker;
pub mod fs;
pub mod network;
pub mod orchestrator;
pub mod signals;

pub use docker::DockerRuntime;
pub use fs::LocalFs;
pub use network::EphemeralPortAllocator;
pub use orchestrator::OrchestratorClient;
