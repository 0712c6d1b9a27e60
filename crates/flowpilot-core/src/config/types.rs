//! Configuration types for Flowpilot
//!
//! Defines the structure of `.flowpilot.toml` configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowpilotConfig {
    /// Orchestrator REST API connection
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Tool server (JSON-RPC tool surface over the orchestrator proxy)
    #[serde(default)]
    pub tools: ToolServerConfig,

    /// Chat relay (agent runtime behind `/chat/*`)
    #[serde(default)]
    pub relay: RelayConfig,

    /// Session bridge embedded in the orchestrator console
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Chat model used by the relay's agent
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Orchestrator REST API section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Base URL including the API prefix (e.g. `http://airflow-webserver:8080/api/v1`)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Basic auth username (supports ${ENV_VAR} syntax)
    #[serde(default = "default_airflow_credential")]
    pub username: String,

    /// Basic auth password (supports ${ENV_VAR} syntax)
    #[serde(default = "default_airflow_credential")]
    pub password: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_proxy_timeout")]
    pub timeout: u64,
}

fn default_api_url() -> String {
    "http://airflow-webserver:8080/api/v1".to_string()
}

fn default_airflow_credential() -> String {
    "airflow".to_string()
}

fn default_proxy_timeout() -> u64 {
    30
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            username: default_airflow_credential(),
            password: default_airflow_credential(),
            timeout: default_proxy_timeout(),
        }
    }
}

/// Tool server section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolServerConfig {
    /// Address the tool server binds to
    #[serde(default = "default_tools_bind")]
    pub bind_address: SocketAddr,

    /// Bearer token required from callers; empty disables the check
    #[serde(default)]
    pub bearer_token: String,
}

fn default_tools_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

impl Default for ToolServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_tools_bind(),
            bearer_token: String::new(),
        }
    }
}

/// How the relay obtains the tool list for each chat turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCachePolicy {
    /// Fetch the tool list from the tool server on every turn
    #[default]
    PerTurn,

    /// Fetch once and keep it until explicitly invalidated
    Process,
}

/// Chat relay section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Address the relay binds to
    #[serde(default = "default_relay_bind")]
    pub bind_address: SocketAddr,

    /// Shared secret expected in `x-access-token`; empty disables the check
    #[serde(default = "default_access_token")]
    pub access_token: String,

    /// JSON-RPC endpoint of the tool server
    #[serde(default = "default_tool_server_url")]
    pub tool_server_url: String,

    /// Bearer token sent to the tool server
    #[serde(default)]
    pub tool_token: String,

    /// Tool server request timeout in seconds
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout: u64,

    /// Maximum number of model steps per chat turn
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: usize,

    /// Tool list caching policy
    #[serde(default)]
    pub tool_cache: ToolCachePolicy,
}

fn default_relay_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_access_token() -> String {
    "ThisIsATempAccessTokenForLocalEnvs.ReplaceInProd".to_string()
}

fn default_tool_server_url() -> String {
    "http://mcp_sse_server:8000/mcp".to_string()
}

fn default_tool_timeout() -> u64 {
    30
}

fn default_recursion_limit() -> usize {
    100
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_relay_bind(),
            access_token: default_access_token(),
            tool_server_url: default_tool_server_url(),
            tool_token: String::new(),
            tool_timeout: default_tool_timeout(),
            recursion_limit: default_recursion_limit(),
            tool_cache: ToolCachePolicy::default(),
        }
    }
}

/// Session bridge section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Address the bridge binds to
    #[serde(default = "default_bridge_bind")]
    pub bind_address: SocketAddr,

    /// Base URL of the chat relay
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// Shared secret sent to the relay as `x-access-token`
    #[serde(default = "default_access_token")]
    pub access_token: String,

    /// Request header carrying the caller's comma separated roles
    #[serde(default = "default_role_header")]
    pub role_header: String,

    /// Roles allowed to use the chat endpoints
    #[serde(default = "default_approved_roles")]
    pub approved_roles: Vec<String>,

    /// Timeout for `/chat/new` in seconds
    #[serde(default = "default_init_timeout")]
    pub init_timeout: u64,

    /// Read timeout for `/chat/ask` in seconds
    #[serde(default = "default_ask_timeout")]
    pub ask_timeout: u64,
}

fn default_bridge_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8081))
}

fn default_relay_url() -> String {
    "http://fastapi:8080".to_string()
}

fn default_role_header() -> String {
    "x-airflow-roles".to_string()
}

fn default_approved_roles() -> Vec<String> {
    ["Admin", "User", "Op", "Viewer"]
        .iter()
        .map(|r| r.to_string())
        .collect()
}

fn default_init_timeout() -> u64 {
    10
}

fn default_ask_timeout() -> u64 {
    30
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bridge_bind(),
            relay_url: default_relay_url(),
            access_token: default_access_token(),
            role_header: default_role_header(),
            approved_roles: default_approved_roles(),
            init_timeout: default_init_timeout(),
            ask_timeout: default_ask_timeout(),
        }
    }
}

/// Chat model section (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL for the API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// API key (supports ${ENV_VAR} syntax)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout: u64,

    /// System prompt prepended to every conversation
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.0
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_system_prompt() -> String {
    "You are an assistant for an Apache Airflow deployment. Use the available tools to \
     inspect connections, DAGs, tasks and DAG runs, or to trigger DAG runs when asked. \
     Answer concisely and say so when a tool reports an error."
        .to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            timeout: default_llm_timeout(),
            system_prompt: default_system_prompt(),
        }
    }
}
