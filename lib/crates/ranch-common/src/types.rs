//! Payloads exchanged between the orchestrator and a ranch agent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// HTTP path the agent serves JSON-RPC on.
pub const RPC_PATH: &str = "/rpc";

/// Orchestrator method called once by every agent at startup.
pub const REGISTER_METHOD: &str = "Ranch.Register";

/// Agent method that provisions the broker container.
pub const CREATE_METHOD: &str = "Client.Create";

/// Agent method that writes broker config and (re)starts the container.
pub const START_METHOD: &str = "Client.Start";

/// Registration handshake payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    /// Agent id, positive and unique among agents.
    pub id: u64,
}

/// Parameters of `Client.Create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Image reference of the broker, e.g. `confluentinc/cp-kafka:7.6.0`.
    pub image: String,
    /// Absolute path inside the container where the config directory is mounted.
    pub conf_path: String,
}

/// Result of `Client.Create`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateResponse {
    /// Host port reserved for the broker's service port.
    pub port: u16,
}

/// Parameters of `Client.Start`.
///
/// Keys are kept sorted so the rendered `server.properties` is deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartRequest {
    #[serde(default, alias = "Config")]
    pub config: BTreeMap<String, String>,
}

/// Result of `Client.Start` (always empty).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartResponse {}
