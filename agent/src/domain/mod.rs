//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `crate::rpc`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod container;
pub mod error;
pub mod properties;

pub use config::{AgentConfig, ClientId, RawAgentConfig, RegistryCredentials};
pub use container::{ContainerRecord, ContainerSlot, ContainerSpec};
pub use error::{
    AgentError, CleanupError, ErrorKind, LifecycleError, LifecycleOp, RegistrationError,
    ShutdownError, ValidationError,
};
pub use properties::{ConfigMapping, render_properties};
