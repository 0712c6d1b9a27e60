//! LLM integration module
//!
//! Chat models that can call tools. Only the OpenAI chat-completions wire
//! format is implemented, which also covers most self-hosted gateways.

mod error;
mod message;
mod openai;
mod provider;

pub use error::LlmError;
pub use message::{AssistantTurn, ChatMessage, Role, ToolCall};
pub use openai::OpenAIProvider;
pub use provider::{ChatModel, SharedModel};
