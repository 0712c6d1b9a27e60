//! Tool server client
//!
//! Lists and invokes tools on a remote tool server over JSON-RPC.

use super::protocol::{
    JsonRpcRequest, JsonRpcResponse, ToolCallResult, ToolDescriptor, METHOD_TOOLS_CALL,
    METHOD_TOOLS_LIST,
};
use crate::agent::ToolBackend;
use crate::error::{FlowpilotError, Result};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Blocking JSON-RPC client for the tool server
pub struct McpClient {
    url: String,
    bearer_token: String,
    agent: ureq::Agent,
    next_id: AtomicU64,
}

impl McpClient {
    pub fn new(url: &str, bearer_token: &str, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            bearer_token: bearer_token.to_string(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            next_id: AtomicU64::new(1),
        }
    }

    fn rpc(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);

        let mut call = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json");
        if !self.bearer_token.is_empty() {
            call = call.set("Authorization", &format!("Bearer {}", self.bearer_token));
        }

        let response: JsonRpcResponse = call.send_json(&request)?.into_json()?;
        response
            .into_result()
            .map_err(|e| FlowpilotError::tool(e.to_string()))
    }

    /// Fetch the advertised tools
    pub fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let result = self.rpc(METHOD_TOOLS_LIST, None)?;
        let tools = result
            .get("tools")
            .cloned()
            .ok_or_else(|| FlowpilotError::tool("tools/list result has no 'tools' field"))?;
        Ok(serde_json::from_value(tools)?)
    }

    /// Invoke a tool by name
    pub fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        let result = self.rpc(
            METHOD_TOOLS_CALL,
            Some(json!({ "name": name, "arguments": arguments })),
        )?;
        Ok(serde_json::from_value(result)?)
    }
}

impl ToolBackend for McpClient {
    fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        McpClient::list_tools(self)
    }

    fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        McpClient::call_tool(self, name, arguments)
    }
}
