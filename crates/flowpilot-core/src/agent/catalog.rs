//! Tool discovery for the agent runtime

use crate::config::ToolCachePolicy;
use crate::error::Result;
use crate::mcp::{ToolCallResult, ToolDescriptor};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

/// Where the agent's tools come from
///
/// Implemented by [`McpClient`](crate::mcp::McpClient) for the remote tool
/// server. Calls are blocking.
pub trait ToolBackend: Send + Sync {
    /// Fetch the advertised tools
    fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Invoke a tool by name
    fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult>;
}

/// Tool list provider with an explicit caching policy
pub struct ToolCatalog {
    backend: Arc<dyn ToolBackend>,
    policy: ToolCachePolicy,
    cached: RwLock<Option<Vec<ToolDescriptor>>>,
}

impl ToolCatalog {
    pub fn new(backend: Arc<dyn ToolBackend>, policy: ToolCachePolicy) -> Self {
        Self {
            backend,
            policy,
            cached: RwLock::new(None),
        }
    }

    pub fn policy(&self) -> ToolCachePolicy {
        self.policy
    }

    pub fn backend(&self) -> Arc<dyn ToolBackend> {
        Arc::clone(&self.backend)
    }

    /// Tools for one agent turn
    ///
    /// `PerTurn` asks the backend every time. `Process` asks once and keeps
    /// the answer until [`invalidate`](Self::invalidate).
    pub fn tools(&self) -> Result<Vec<ToolDescriptor>> {
        if self.policy == ToolCachePolicy::PerTurn {
            return self.backend.list_tools();
        }

        if let Some(tools) = self.cached.read().as_ref() {
            return Ok(tools.clone());
        }

        let tools = self.backend.list_tools()?;
        tracing::debug!(count = tools.len(), "caching tool list");
        *self.cached.write() = Some(tools.clone());
        Ok(tools)
    }

    /// Drop the cached tool list
    pub fn invalidate(&self) {
        *self.cached.write() = None;
    }
}
