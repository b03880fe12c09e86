//! Agent boot sequence: build the infrastructure, register, serve, shut down.

use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::application::services::{ClientService, registration, shutdown};
use crate::domain::{AgentConfig, AgentError};
use crate::infra::{DockerRuntime, EphemeralPortAllocator, LocalFs, OrchestratorClient, signals};
use crate::rpc;

/// Run the agent until a termination signal has been handled.
///
/// Registration happens before the listener is bound: an agent the
/// orchestrator refused never opens its port.
///
/// # Errors
///
/// Any startup, registration or shutdown failure.
pub async fn run(config: AgentConfig) -> Result<(), AgentError> {
    let runtime = DockerRuntime::from_env().map_err(AgentError::startup("Failed to create service"))?;
    let registrar = OrchestratorClient::new(config.master.clone())
        .map_err(AgentError::startup("Failed to create service"))?;

    registration::register(&registrar, config.client_id).await?;

    let service = Arc::new(ClientService::new(
        config.client_id,
        config.credentials.clone(),
        Arc::new(runtime),
        Arc::new(EphemeralPortAllocator),
        Arc::new(LocalFs::default()),
    ));

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.listen_port))
        .await
        .with_context(|| format!("binding port {}", config.listen_port))
        .map_err(AgentError::startup("Failed to open listener"))?;
    tracing::info!(port = config.listen_port, "Listening on {}", config.listen_port);

    serve(listener, service, config.shutdown_timeout, signals::termination()).await
}

/// Serve the RPC router on `listener` until `stop` resolves (or the server
/// dies), then stop accepting, clean up and drain within `deadline`.
///
/// # Errors
///
/// Returns `AgentError::Shutdown` when the shutdown sequence fails.
pub async fn serve<F>(
    listener: TcpListener,
    service: Arc<ClientService>,
    deadline: Duration,
    stop: F,
) -> Result<(), AgentError>
where
    F: Future<Output = anyhow::Result<&'static str>>,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let router = rpc::router(Arc::clone(&service));
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    let finished = tokio::select! {
        signal = stop => {
            match signal {
                Ok(name) => tracing::info!(signal = name, "received shutdown signal"),
                Err(e) => tracing::warn!(error = %e, "signal handling failed, shutting down"),
            }
            None
        }
        joined = &mut server => {
            tracing::error!("HTTP server stopped unexpectedly");
            Some(joined)
        }
    };

    // Stop accepting before cleanup starts.
    let _ = stop_tx.send(());
    let drain = async move {
        let joined = match finished {
            Some(joined) => joined,
            None => server.await,
        };
        joined
            .context("HTTP server task failed")?
            .context("HTTP server error")
    };

    shutdown::shutdown(&service, drain, deadline).await?;
    Ok(())
}
