//! Application service: registration handshake use-case.

use crate::application::ports::Registrar;
use crate::domain::error::render_chain;
use crate::domain::{ClientId, RegistrationError};

/// Announce this agent to the orchestrator. One attempt, no retry.
///
/// # Errors
///
/// Returns the registrar's error unchanged; every variant is fatal to startup.
pub async fn register(registrar: &dyn Registrar, id: ClientId) -> Result<(), RegistrationError> {
    tracing::info!(client_id = %id, "registering with orchestrator");
    match registrar.register(id).await {
        Ok(()) => {
            tracing::info!(client_id = %id, "registered client");
            Ok(())
        }
        Err(err) => {
            if err.is_application_level() {
                tracing::error!(client_id = %id, error = %render_chain(&err), "orchestrator refused registration");
            } else {
                tracing::error!(client_id = %id, error = %render_chain(&err), "orchestrator unreachable");
            }
            Err(err)
        }
    }
}
