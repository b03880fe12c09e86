//! Termination signal handling.
//!
//! Only interceptable signals are listened for. SIGKILL and SIGSTOP can never
//! be observed by the process.

use anyhow::{Context, Result};

/// Resolve with the name of the first termination signal received.
///
/// # Errors
///
/// Returns an error if a signal handler cannot be installed.
#[cfg(unix)]
pub async fn termination() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    let mut int = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    let mut quit = signal(SignalKind::quit()).context("installing SIGQUIT handler")?;

    let name = tokio::select! {
        _ = term.recv() => "SIGTERM",
        _ = int.recv() => "SIGINT",
        _ = quit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Resolve on Ctrl-C.
///
/// # Errors
///
/// Returns an error if the Ctrl-C handler cannot be installed.
#[cfg(not(unix))]
pub async fn termination() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("installing Ctrl-C handler")?;
    Ok("ctrl-c")
}
