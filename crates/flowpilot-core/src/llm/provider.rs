//! Chat model trait

use super::{AssistantTurn, ChatMessage, LlmError};
use crate::mcp::ToolDescriptor;

/// A chat model that can request tool calls
///
/// Calls are blocking; the agent runs them on its own worker thread.
pub trait ChatModel: Send + Sync {
    /// Get the provider's unique identifier (e.g., "openai")
    fn id(&self) -> &str;

    /// Get the currently active model name
    fn model(&self) -> String;

    /// Send the conversation and return the model's next turn
    fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDescriptor],
    ) -> Result<AssistantTurn, LlmError>;
}

/// Shared handle to a chat model
pub type SharedModel = std::sync::Arc<dyn ChatModel>;
