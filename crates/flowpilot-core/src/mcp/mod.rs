//! Tool registration layer
//!
//! Exposes the orchestrator operations as discoverable, schema-described
//! tools over JSON-RPC 2.0 (`tools/list`, `tools/call`), and the client the
//! agent runtime uses to consume them.

mod client;
pub mod protocol;
mod registry;

pub use client::McpClient;
pub use protocol::{
    error_codes, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams, ToolCallResult,
    ToolContent, ToolDescriptor,
};
pub use registry::{ToolParam, ToolRegistry, ToolSpec};
