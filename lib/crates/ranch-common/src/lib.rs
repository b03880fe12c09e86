pub mod rpc;
pub mod types;

pub use rpc::{RpcError, RpcRequest, RpcResponse, error_codes};
pub use types::*;
