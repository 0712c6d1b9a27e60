//! Tool server handlers (JSON-RPC 2.0 over HTTP)

use crate::state::ToolServerState;
use axum::{body::Bytes, extract::State, Json};
use flowpilot_core::mcp::protocol::{METHOD_TOOLS_CALL, METHOD_TOOLS_LIST};
use flowpilot_core::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use serde_json::Value;

/// `POST /mcp`
///
/// Always answers 200 with a JSON-RPC envelope; protocol failures are
/// carried in its `error` member.
pub async fn json_rpc(State(state): State<ToolServerState>, body: Bytes) -> Json<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return Json(JsonRpcResponse::error(
                Value::Null,
                JsonRpcError::parse_error(format!("Invalid JSON-RPC request: {}", e)),
            ))
        }
    };

    let id = request.id.clone();
    let result = dispatch(&state, request).await;
    Json(JsonRpcResponse::from_result(id, result))
}

async fn dispatch(state: &ToolServerState, request: JsonRpcRequest) -> Result<Value, JsonRpcError> {
    request.validate()?;

    match request.method.as_str() {
        METHOD_TOOLS_LIST => Ok(state.registry.list_tools_json()),
        METHOD_TOOLS_CALL => {
            let call = request.extract_tool_call()?;
            tracing::info!(tool = %call.name, "tools/call");

            let registry = state.registry.clone();
            let client = state.client.clone();
            let result = tokio::task::spawn_blocking(move || {
                registry.call(&client, &call.name, &call.arguments)
            })
            .await
            .map_err(|e| JsonRpcError::internal_error(format!("Tool task failed: {}", e)))??;

            serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
        }
        other => Err(JsonRpcError::method_not_found(other)),
    }
}

/// `GET /mcp/tools/list`
pub async fn list_tools(State(state): State<ToolServerState>) -> Json<Value> {
    Json(state.registry.list_tools_json())
}
