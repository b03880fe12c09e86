//! Typed domain error enums.
//!
//! Every failure the agent can report belongs to one of a closed set of kinds
//! (validation, registration, lifecycle, cleanup, shutdown). Each kind carries
//! its structured cause so callers branch on the variant, never on message
//! text. Infrastructure errors arrive as `anyhow::Error` and are kept as the
//! `source` of the typed variant.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// ── Validation errors ─────────────────────────────────────────────────────────

/// Invalid or missing startup configuration. Always fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Master address must be provided")]
    MissingMaster,

    #[error("Invalid master address: {0}")]
    InvalidMaster(String),

    #[error("Unsupported master address scheme '{0}': expected http or https")]
    UnsupportedScheme(String),

    #[error("Client id must be provided")]
    MissingClientId,

    #[error("Invalid client id: {0}. Must be unique and more than 0")]
    InvalidClientId(i64),

    #[error("Invalid listen port: {0}")]
    InvalidListenPort(u16),

    #[error("Username must be provided")]
    MissingUsername,

    #[error("Password must be provided")]
    MissingPassword,

    #[error("Invalid shutdown timeout: {0}s. Must be at least 1 second")]
    InvalidShutdownTimeout(u64),
}

// ── Registration errors ───────────────────────────────────────────────────────

/// Failure of the startup handshake with the orchestrator. Always fatal; the
/// variant only distinguishes transport from application failures in logs.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Failed to register client due to transport error")]
    Transport(#[source] anyhow::Error),

    #[error("Failed to register client due to HTTP error (status {status})")]
    Http { status: u16 },

    #[error("Orchestrator rejected registration: {message} (code {code})")]
    Rejected { code: i64, message: String },
}

impl RegistrationError {
    /// `true` when the orchestrator was reached and answered.
    #[must_use]
    pub fn is_application_level(&self) -> bool {
        !matches!(self, Self::Transport(_))
    }
}

// ── Lifecycle errors ──────────────────────────────────────────────────────────

/// Container operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    CreateHostDir,
    PullImage,
    AllocatePort,
    CreateContainer,
    WriteConfig,
    Inspect,
    Start,
    Restart,
    Logs,
}

impl LifecycleOp {
    /// Stable machine-readable name, exposed to RPC callers.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateHostDir => "create_host_dir",
            Self::PullImage => "pull_image",
            Self::AllocatePort => "allocate_port",
            Self::CreateContainer => "create_container",
            Self::WriteConfig => "write_config",
            Self::Inspect => "inspect",
            Self::Start => "start",
            Self::Restart => "restart",
            Self::Logs => "logs",
        }
    }
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateHostDir => "create host directory for container",
            Self::PullImage => "pull image",
            Self::AllocatePort => "get free port",
            Self::CreateContainer => "create container",
            Self::WriteConfig => "write config",
            Self::Inspect => "check container status",
            Self::Start => "start container",
            Self::Restart => "restart container",
            Self::Logs => "get container logs",
        })
    }
}

/// Errors returned by `Create` / `Start` to the calling orchestrator.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Container already created")]
    AlreadyCreated,

    #[error("Container not created yet. Call Client.Create first")]
    NotCreated,

    #[error("Agent is shutting down")]
    ShuttingDown,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to {op}")]
    Failed {
        op: LifecycleOp,
        #[source]
        source: anyhow::Error,
    },
}

impl LifecycleError {
    pub(crate) fn failed(op: LifecycleOp) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| Self::Failed { op, source }
    }

    /// Stable machine-readable reason, exposed to RPC callers.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::AlreadyCreated => "already_created",
            Self::NotCreated => "not_created",
            Self::ShuttingDown => "shutting_down",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Failed { op, .. } => op.as_str(),
        }
    }
}

// ── Cleanup errors ────────────────────────────────────────────────────────────

/// Best-effort teardown failures. Logged, never escalated.
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Failed to remove host directory {}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to remove container with id {id}")]
    Container {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

// ── Shutdown errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("Shutdown did not finish within {deadline:?}")]
    DeadlineExceeded { deadline: Duration },

    #[error("Failed to shutdown gracefully due to HTTP server")]
    Server(#[source] anyhow::Error),
}

// ── Top-level ─────────────────────────────────────────────────────────────────

/// Error kind, for logging and RPC error payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Startup,
    Validation,
    Registration,
    Lifecycle,
    Shutdown,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Validation => "validation",
            Self::Registration => "registration",
            Self::Lifecycle => "lifecycle",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Any error the agent process can end with.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{context}")]
    Startup {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

impl AgentError {
    pub(crate) fn startup(context: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| Self::Startup { context, source }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Startup { .. } => ErrorKind::Startup,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Registration(_) => ErrorKind::Registration,
            Self::Shutdown(_) => ErrorKind::Shutdown,
        }
    }
}

/// Render an error and all of its sources as `outer: inner: root`.
#[must_use]
pub fn render_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
