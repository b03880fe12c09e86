//! Agent identity and startup configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::fmt;
use std::num::NonZeroU64;
use std::time::Duration;

use url::Url;

use crate::domain::error::ValidationError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_LISTEN_PORT: u16 = 8080;
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// ── Identity ─────────────────────────────────────────────────────────────────

/// Numeric agent id, positive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(NonZeroU64);

impl ClientId {
    /// Validates a raw id as received from the command line.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClientId` when `raw` is zero or negative.
    pub fn new(raw: i64) -> Result<Self, ValidationError> {
        u64::try_from(raw)
            .ok()
            .and_then(NonZeroU64::new)
            .map(Self)
            .ok_or(ValidationError::InvalidClientId(raw))
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry login used for image pulls only.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    username: String,
    password: String,
}

impl RegistryCredentials {
    /// # Errors
    ///
    /// Returns an error if either value is empty.
    pub fn new(username: &str, password: &str) -> Result<Self, ValidationError> {
        if username.is_empty() {
            return Err(ValidationError::MissingUsername);
        }
        if password.is_empty() {
            return Err(ValidationError::MissingPassword);
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ── Startup configuration ────────────────────────────────────────────────────

/// Unvalidated values as collected from flags and environment.
#[derive(Debug, Clone, Default)]
pub struct RawAgentConfig {
    pub master: Option<String>,
    pub client_id: Option<i64>,
    pub listen_port: u16,
    pub docker_user: Option<String>,
    pub docker_pass: Option<String>,
    pub shutdown_timeout_secs: u64,
}

/// Validated, immutable agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Orchestrator JSON-RPC endpoint.
    pub master: Url,
    pub client_id: ClientId,
    pub listen_port: u16,
    pub credentials: RegistryCredentials,
    /// Upper bound for cleanup plus HTTP drain on shutdown.
    pub shutdown_timeout: Duration,
}

impl AgentConfig {
    /// Validates raw values in the order the flags are documented.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` encountered.
    pub fn validate(raw: RawAgentConfig) -> Result<Self, ValidationError> {
        let master = validate_master(raw.master.as_deref())?;
        let client_id = ClientId::new(raw.client_id.ok_or(ValidationError::MissingClientId)?)?;
        if raw.listen_port == 0 {
            return Err(ValidationError::InvalidListenPort(raw.listen_port));
        }
        let credentials = RegistryCredentials::new(
            raw.docker_user.as_deref().unwrap_or_default(),
            raw.docker_pass.as_deref().unwrap_or_default(),
        )?;
        if raw.shutdown_timeout_secs == 0 {
            return Err(ValidationError::InvalidShutdownTimeout(raw.shutdown_timeout_secs));
        }
        Ok(Self {
            master,
            client_id,
            listen_port: raw.listen_port,
            credentials,
            shutdown_timeout: Duration::from_secs(raw.shutdown_timeout_secs),
        })
    }
}

/// The master address must be an absolute http(s) URL with a host.
///
/// # Errors
///
/// Returns an error if the address is missing, unparsable, hostless, or not http(s).
pub fn validate_master(raw: Option<&str>) -> Result<Url, ValidationError> {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => return Err(ValidationError::MissingMaster),
    };
    let url = Url::parse(raw).map_err(|_| ValidationError::InvalidMaster(raw.to_string()))?;
    if !url.has_host() {
        return Err(ValidationError::InvalidMaster(raw.to_string()));
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme(url.scheme().to_string()));
    }
    Ok(url)
}
