//! Server state management

use flowpilot_core::agent::ConversationMemory;
use flowpilot_core::{
    AgentRuntime, BridgeConfig, ChatModel, FlowpilotConfig, InMemorySessionStore, McpClient,
    OpenAIProvider, OrchestratorClient, RelayClient, RelayConfig, SessionStore, ToolBackend,
    ToolCatalog, ToolRegistry, ToolServerConfig,
};
use std::sync::Arc;
use std::time::Duration;

/// Tool server state
#[derive(Clone)]
pub struct ToolServerState {
    pub registry: Arc<ToolRegistry>,
    pub client: OrchestratorClient,
    /// Empty disables bearer auth
    pub bearer_token: String,
}

impl ToolServerState {
    pub fn new(client: OrchestratorClient, config: &ToolServerConfig) -> Self {
        Self {
            registry: Arc::new(ToolRegistry::new()),
            client,
            bearer_token: config.bearer_token.clone(),
        }
    }

    pub fn from_config(config: &FlowpilotConfig) -> Self {
        Self::new(OrchestratorClient::new(&config.orchestrator), &config.tools)
    }
}

/// Chat relay state
#[derive(Clone)]
pub struct RelayState {
    pub runtime: AgentRuntime,
    /// Empty disables the `x-access-token` check
    pub access_token: String,
    pub recursion_limit: usize,
}

impl RelayState {
    pub fn new(
        model: Arc<dyn ChatModel>,
        backend: Arc<dyn ToolBackend>,
        config: &RelayConfig,
        system_prompt: &str,
    ) -> Self {
        let catalog = Arc::new(ToolCatalog::new(backend, config.tool_cache));
        let runtime = AgentRuntime::new(model, catalog, Arc::new(ConversationMemory::new()))
            .with_system_prompt(system_prompt);
        Self {
            runtime,
            access_token: config.access_token.clone(),
            recursion_limit: config.recursion_limit,
        }
    }

    pub fn from_config(config: &FlowpilotConfig) -> Self {
        if config.llm.api_key.as_deref().unwrap_or("").is_empty() {
            tracing::warn!("No LLM API key configured, relying on an open endpoint");
        }
        let model = Arc::new(OpenAIProvider::from_config(&config.llm));
        let backend = Arc::new(McpClient::new(
            &config.relay.tool_server_url,
            &config.relay.tool_token,
            Duration::from_secs(config.relay.tool_timeout),
        ));
        Self::new(model, backend, &config.relay, &config.llm.system_prompt)
    }
}

/// Session bridge state
#[derive(Clone)]
pub struct BridgeState {
    pub client: Arc<RelayClient>,
    pub role_header: String,
    pub approved_roles: Vec<String>,
}

impl BridgeState {
    pub fn new(config: &BridgeConfig, store: Arc<dyn SessionStore>) -> Self {
        Self {
            client: Arc::new(RelayClient::new(config, store)),
            role_header: config.role_header.to_ascii_lowercase(),
            approved_roles: config.approved_roles.clone(),
        }
    }

    pub fn from_config(config: &FlowpilotConfig) -> Self {
        Self::new(&config.bridge, Arc::new(InMemorySessionStore::new()))
    }
}
