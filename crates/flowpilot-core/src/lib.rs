//! Flowpilot Core - backend library for Flowpilot
//!
//! This crate provides everything the HTTP services need, independent of
//! any web framework:
//! - Orchestrator REST proxy (`orchestrator`)
//! - Tool registry and JSON-RPC wire types (`mcp`)
//! - OpenAI-compatible chat model (`llm`) and the tool-calling agent loop (`agent`)
//! - Relay client and session store for the embedded chat widget (`bridge`, `session`)
//! - Configuration loading
//!
//! # Architecture
//!
//! ```text
//! browser ──SSE── bridge ──HTTP── relay ── agent ──JSON-RPC── tools ──REST── orchestrator
//! ```
//!
//! # Example
//!
//! ```ignore
//! use flowpilot_core::{OrchestratorClient, ToolRegistry};
//!
//! let client = OrchestratorClient::new(&config.orchestrator);
//! let registry = ToolRegistry::new();
//! let result = registry.call(&client, "get_dag", &serde_json::json!({"dag_id": "etl"}))?;
//! ```

pub mod config;
pub mod error;

// Orchestrator REST proxy
pub mod orchestrator;

// Tool registration layer
pub mod mcp;

// Chat model and agent loop
pub mod agent;
pub mod llm;

// Embedded chat bridge
pub mod bridge;
pub mod session;

pub use error::{FlowpilotError, Result};

pub use config::{
    BridgeConfig, FlowpilotConfig, LlmConfig, OrchestratorConfig, RelayConfig, ToolCachePolicy,
    ToolServerConfig,
};

pub use orchestrator::{
    DagRunFilter, HttpMethod, Operation, OrchestratorClient, OrchestratorRequest, ProxyError,
    ProxyErrorKind, ProxyResult,
};

pub use mcp::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpClient, ToolCallResult, ToolDescriptor,
    ToolRegistry,
};

pub use agent::{Agent, AgentConfig, AgentRuntime, ConversationMemory, ToolBackend, ToolCatalog};
pub use llm::{ChatMessage, ChatModel, LlmError, OpenAIProvider, SharedModel};

pub use bridge::{ChatChunk, RelayClient};
pub use session::{InMemorySessionStore, SessionRecord, SessionStore};

/// Get the crate version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
