//! JSON-RPC endpoint: maps `Client.Create` / `Client.Start` onto the client
//! service.
//!
//! Every JSON-RPC outcome, errors included, is answered with HTTP 200 and a
//! JSON-RPC response body. Service failures use code `-32000` and carry the
//! error kind and a machine-readable reason in `data`.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use ranch_common::rpc::JSONRPC_VERSION;
use ranch_common::{
    CREATE_METHOD, CreateRequest, CreateResponse, RPC_PATH, RpcError, RpcRequest, RpcResponse,
    START_METHOD, StartRequest, StartResponse, error_codes,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::application::services::ClientService;
use crate::domain::error::render_chain;
use crate::domain::{ErrorKind, LifecycleError};

/// Path of the liveness check.
pub const HEALTH_PATH: &str = "/health";

/// Build the agent's HTTP router.
pub fn router(service: Arc<ClientService>) -> Router {
    Router::new()
        .route(RPC_PATH, post(handle_rpc))
        .route(HEALTH_PATH, get(health))
        .with_state(service)
}

/// Minimal health-check handler.
async fn health() -> StatusCode {
    StatusCode::OK
}

async fn handle_rpc(State(service): State<Arc<ClientService>>, body: Bytes) -> Json<RpcResponse> {
    Json(dispatch(&service, &body).await)
}

/// Decode one JSON-RPC request body, run it, and build the response.
pub async fn dispatch(service: &ClientService, body: &[u8]) -> RpcResponse {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return RpcResponse::failure(
                Value::Null,
                RpcError::new(error_codes::PARSE_ERROR, format!("parse error: {e}")),
            );
        }
    };
    let id = value.get("id").cloned().unwrap_or(Value::Null);

    let request: RpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return RpcResponse::failure(
                id,
                RpcError::new(error_codes::INVALID_REQUEST, format!("invalid request: {e}")),
            );
        }
    };
    if request.jsonrpc != JSONRPC_VERSION {
        return RpcResponse::failure(
            id,
            RpcError::new(
                error_codes::INVALID_REQUEST,
                format!("jsonrpc must be \"{JSONRPC_VERSION}\""),
            ),
        );
    }

    match call(service, &request).await {
        Ok(result) => RpcResponse::success(id, result),
        Err(err) => RpcResponse::failure(id, err),
    }
}

async fn call(service: &ClientService, request: &RpcRequest) -> Result<Value, RpcError> {
    tracing::debug!(method = %request.method, "rpc call");
    match request.method.as_str() {
        CREATE_METHOD => {
            let params: CreateRequest = decode(request)?;
            let port = service
                .create(&params.image, &params.conf_path)
                .await
                .map_err(|e| service_error(CREATE_METHOD, &e))?;
            encode(&CreateResponse { port })
        }
        START_METHOD => {
            let params: StartRequest = decode(request)?;
            // The log capture outlives the call; its handle is not needed here.
            let _outcome = service
                .start(&params.config)
                .await
                .map_err(|e| service_error(START_METHOD, &e))?;
            encode(&StartResponse {})
        }
        other => Err(RpcError::new(
            error_codes::METHOD_NOT_FOUND,
            format!("rpc: can't find method \"{other}\""),
        )),
    }
}

fn decode<T: DeserializeOwned>(request: &RpcRequest) -> Result<T, RpcError> {
    request
        .params_as()
        .map_err(|e| RpcError::new(error_codes::INVALID_PARAMS, format!("invalid params: {e}")))
}

fn encode<T: Serialize>(result: &T) -> Result<Value, RpcError> {
    serde_json::to_value(result)
        .map_err(|e| RpcError::new(error_codes::SERVER_ERROR, format!("encoding result: {e}")))
}

fn service_error(method: &str, err: &LifecycleError) -> RpcError {
    let kind = match err {
        LifecycleError::InvalidRequest(_) => ErrorKind::Validation,
        _ => ErrorKind::Lifecycle,
    };
    let message = render_chain(err);
    tracing::warn!(method, kind = kind.as_str(), reason = err.reason(), error = %message, "rpc call failed");
    RpcError::new(error_codes::SERVER_ERROR, message).with_data(json!({
        "kind": kind.as_str(),
        "reason": err.reason(),
    }))
}
