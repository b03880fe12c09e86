//! Application service: bounded shutdown sequence.

use std::future::Future;
use std::time::Duration;

use crate::application::services::client_service::ClientService;
use crate::domain::ShutdownError;

/// Clean the client service, then wait for the HTTP server to drain, all
/// within `deadline`.
///
/// The caller must already have told the server to stop accepting requests.
/// Cleanup failures are logged by the service and never abort the sequence.
///
/// # Errors
///
/// `DeadlineExceeded` when cleanup plus drain overrun `deadline`, or `Server`
/// when the server finished with an error.
pub async fn shutdown<S>(
    service: &ClientService,
    server: S,
    deadline: Duration,
) -> Result<(), ShutdownError>
where
    S: Future<Output = anyhow::Result<()>>,
{
    let sequence = async {
        if service.clean().await.is_err() {
            tracing::warn!("continuing shutdown after cleanup failure");
        }
        server.await.map_err(ShutdownError::Server)
    };

    match tokio::time::timeout(deadline, sequence).await {
        Ok(result) => {
            result?;
            tracing::info!("service was shutdown gracefully");
            Ok(())
        }
        Err(_) => Err(ShutdownError::DeadlineExceeded { deadline }),
    }
}
