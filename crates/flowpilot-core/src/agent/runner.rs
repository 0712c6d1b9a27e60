//! The tool-calling agent loop

use super::{ConversationMemory, ToolBackend, ToolCatalog};
use crate::error::{FlowpilotError, Result};
use crate::llm::{ChatMessage, SharedModel};
use crate::mcp::ToolDescriptor;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Default cap on model steps per turn
pub const DEFAULT_RECURSION_LIMIT: usize = 100;

/// Output channel capacity for one streamed turn
const STREAM_BUFFER: usize = 32;

/// Per-turn agent configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Conversation thread, the relay session id
    pub thread_id: String,
    /// Maximum model steps before the turn fails
    pub recursion_limit: usize,
}

impl AgentConfig {
    pub fn for_session(session_id: impl Into<String>, recursion_limit: usize) -> Self {
        Self {
            thread_id: session_id.into(),
            recursion_limit,
        }
    }
}

/// A chat model bound to one tool list for one turn
pub struct Agent {
    model: SharedModel,
    tools: Vec<ToolDescriptor>,
    backend: Arc<dyn ToolBackend>,
    memory: Arc<ConversationMemory>,
    system_prompt: Option<String>,
}

impl Agent {
    pub fn new(
        model: SharedModel,
        tools: Vec<ToolDescriptor>,
        backend: Arc<dyn ToolBackend>,
        memory: Arc<ConversationMemory>,
    ) -> Self {
        Self {
            model,
            tools,
            backend,
            memory,
            system_prompt: None,
        }
    }

    /// Seed new threads with a system message
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = (!prompt.trim().is_empty()).then_some(prompt);
        self
    }

    /// Run one user turn to completion
    ///
    /// Every non-empty assistant text is passed to `emit`. Returning `false`
    /// from `emit` stops the turn early without saving history.
    pub fn run<F>(&self, message: &str, config: &AgentConfig, mut emit: F) -> Result<()>
    where
        F: FnMut(String) -> bool,
    {
        let mut history = self.memory.history(&config.thread_id);
        if history.is_empty() {
            if let Some(ref prompt) = self.system_prompt {
                history.push(ChatMessage::system(prompt.clone()));
            }
        }
        history.push(ChatMessage::user(message));

        for step in 0..config.recursion_limit {
            let turn = self.model.complete(&history, &self.tools)?;
            tracing::debug!(
                thread = %config.thread_id,
                step,
                tool_calls = turn.tool_calls.len(),
                "model step"
            );

            if !turn.content.is_empty() && !emit(turn.content.clone()) {
                tracing::debug!(thread = %config.thread_id, "output closed, stopping turn");
                return Ok(());
            }

            let calls = turn.tool_calls.clone();
            history.push(turn.into_message());

            if calls.is_empty() {
                self.memory.save(&config.thread_id, history);
                return Ok(());
            }

            for call in calls {
                tracing::info!(tool = %call.name, "calling tool");
                let content = match self.backend.call_tool(&call.name, call.arguments) {
                    Ok(result) => result.joined_text(),
                    Err(e) => {
                        tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                        format!("Error: {}", e)
                    }
                };
                history.push(ChatMessage::tool_result(call.id, content));
            }
        }

        Err(FlowpilotError::agent(format!(
            "Recursion limit of {} reached without a final answer",
            config.recursion_limit
        )))
    }
}

/// Shared pieces needed to start agent turns
#[derive(Clone)]
pub struct AgentRuntime {
    model: SharedModel,
    catalog: Arc<ToolCatalog>,
    memory: Arc<ConversationMemory>,
    system_prompt: String,
}

impl AgentRuntime {
    pub fn new(model: SharedModel, catalog: Arc<ToolCatalog>, memory: Arc<ConversationMemory>) -> Self {
        Self {
            model,
            catalog,
            memory,
            system_prompt: String::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    pub fn memory(&self) -> &Arc<ConversationMemory> {
        &self.memory
    }

    /// Start a turn on a worker thread and stream its output
    ///
    /// Chunks arrive in order. A failure while fetching tools or running
    /// the agent is delivered as a final `Err` item.
    pub fn stream(&self, message: String, config: AgentConfig) -> mpsc::Receiver<Result<String>> {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let runtime = self.clone();

        std::thread::spawn(move || {
            let outcome = runtime.catalog.tools().and_then(|tools| {
                let agent = Agent::new(
                    Arc::clone(&runtime.model),
                    tools,
                    runtime.catalog.backend(),
                    Arc::clone(&runtime.memory),
                )
                .with_system_prompt(runtime.system_prompt.clone());
                agent.run(&message, &config, |chunk| tx.blocking_send(Ok(chunk)).is_ok())
            });

            match outcome {
                Ok(()) => tracing::debug!(
                    thread = %config.thread_id,
                    threads = runtime.memory.thread_count(),
                    "agent turn finished"
                ),
                Err(e) => {
                    tracing::error!(thread = %config.thread_id, error = %e, "agent turn failed");
                    let _ = tx.blocking_send(Err(e));
                }
            }
        });

        rx
    }
}
