//! Infrastructure implementation of the `Registrar` port: a JSON-RPC 2.0
//! client for the orchestrator.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use ranch_common::{REGISTER_METHOD, RegisterRequest, RpcRequest, RpcResponse};
use url::Url;

use crate::application::ports::Registrar;
use crate::domain::{ClientId, RegistrationError};

/// Upper bound for the single registration request.
pub const REGISTER_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC client posting to the orchestrator's endpoint.
pub struct OrchestratorClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl OrchestratorClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend
    /// initialisation).
    pub fn new(endpoint: Url) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REGISTER_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl Registrar for OrchestratorClient {
    async fn register(&self, id: ClientId) -> Result<(), RegistrationError> {
        let request = RpcRequest::new(REGISTER_METHOD, &RegisterRequest { id: id.get() }, 1)
            .map_err(|e| RegistrationError::Transport(e.into()))?;

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .with_context(|| format!("sending {REGISTER_METHOD} to {}", self.endpoint))
            .map_err(RegistrationError::Transport)?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .context("reading registration response")
            .map_err(RegistrationError::Transport)?;

        classify(status.as_u16(), &body)
    }
}

/// Map an HTTP status and body to the registration outcome.
///
/// A decodable JSON-RPC error wins over the HTTP status; otherwise any status
/// of 400 and above is an HTTP error.
///
/// # Errors
///
/// `Rejected`, `Http` or `Transport` (undecodable success body).
pub fn classify(status: u16, body: &[u8]) -> Result<(), RegistrationError> {
    match serde_json::from_slice::<RpcResponse>(body).map(RpcResponse::into_result) {
        Ok(Err(err)) => Err(RegistrationError::Rejected {
            code: err.code,
            message: err.message,
        }),
        _ if status >= 400 => Err(RegistrationError::Http { status }),
        Ok(Ok(_)) => Ok(()),
        Err(e) => Err(RegistrationError::Transport(
            anyhow::Error::new(e).context("decoding registration response"),
        )),
    }
}
