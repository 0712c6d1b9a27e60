//! Agent runtime
//!
//! Drives a [`ChatModel`](crate::llm::ChatModel) through tool calls served
//! by a [`ToolBackend`], keeping per-thread history in memory.

mod catalog;
mod memory;
mod runner;

pub use catalog::{ToolBackend, ToolCatalog};
pub use memory::ConversationMemory;
pub use runner::{Agent, AgentConfig, AgentRuntime, DEFAULT_RECURSION_LIMIT};
