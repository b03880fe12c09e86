//! CLI argument parsing with clap derive

use clap::Parser;

use crate::app;
use crate::domain::config::{DEFAULT_LISTEN_PORT, DEFAULT_SHUTDOWN_TIMEOUT_SECS};
use crate::domain::{AgentConfig, AgentError, RawAgentConfig, ValidationError};

/// Runs one broker container on behalf of the ranch orchestrator
#[derive(Parser, Debug)]
#[command(name = "ranch-agent", version)]
pub struct Cli {
    /// Orchestrator JSON-RPC endpoint, e.g. http://master:8080/rpc
    #[arg(long, env = "RANCH_MASTER")]
    pub master: Option<String>,

    /// Id of this agent. Must be unique and greater than 0
    #[arg(long, env = "RANCH_CLIENT_ID", allow_negative_numbers = true)]
    pub id: Option<i64>,

    /// Port the RPC endpoint listens on
    #[arg(long, env = "RANCH_PORT", default_value_t = DEFAULT_LISTEN_PORT)]
    pub port: u16,

    /// Registry login used for image pulls
    #[arg(long = "docker-user", env = "RANCH_DOCKER_USER")]
    pub docker_user: Option<String>,

    /// Registry password or token used for image pulls
    #[arg(long = "docker-pass", env = "RANCH_DOCKER_PASS", hide_env_values = true)]
    pub docker_pass: Option<String>,

    /// Seconds allowed for cleanup and HTTP drain on shutdown
    #[arg(
        long = "shutdown-timeout",
        env = "RANCH_SHUTDOWN_TIMEOUT",
        default_value_t = DEFAULT_SHUTDOWN_TIMEOUT_SECS
    )]
    pub shutdown_timeout: u64,
}

impl Cli {
    #[must_use]
    pub fn into_raw(self) -> RawAgentConfig {
        RawAgentConfig {
            master: self.master,
            client_id: self.id,
            listen_port: self.port,
            docker_user: self.docker_user,
            docker_pass: self.docker_pass,
            shutdown_timeout_secs: self.shutdown_timeout,
        }
    }

    /// # Errors
    ///
    /// Returns the first invalid setting.
    pub fn into_config(self) -> Result<AgentConfig, ValidationError> {
        AgentConfig::validate(self.into_raw())
    }

    /// Validate the configuration and run the agent to completion.
    ///
    /// # Errors
    ///
    /// Validation, startup, registration or shutdown failure.
    pub async fn run(self) -> Result<(), AgentError> {
        let config = self.into_config()?;
        tracing::info!(
            master = %config.master,
            client_id = %config.client_id,
            port = config.listen_port,
            "starting agent",
        );
        app::run(config).await
    }
}
