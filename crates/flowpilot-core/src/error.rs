//! Error types for Flowpilot Core
//!
//! Provides a unified error type for the agent, tool and relay plumbing.
//! Orchestrator calls use their own tagged [`ProxyError`](crate::ProxyError)
//! so callers can tell transport failures from HTTP status failures.

use thiserror::Error;

/// Result type for Flowpilot Core operations
pub type Result<T> = std::result::Result<T, FlowpilotError>;

/// Unified error type for Flowpilot Core
#[derive(Error, Debug)]
pub enum FlowpilotError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] crate::llm::LlmError),

    /// Tool server or tool invocation error
    #[error("Tool error: {0}")]
    Tool(String),

    /// Agent loop error
    #[error("Agent error: {0}")]
    Agent(String),

    /// HTTP transport error talking to a backend service
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("Backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Channel error (communication failure)
    #[error("Channel error: {0}")]
    Channel(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FlowpilotError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        FlowpilotError::Config(msg.into())
    }

    /// Create a tool error
    pub fn tool(msg: impl Into<String>) -> Self {
        FlowpilotError::Tool(msg.into())
    }

    /// Create an agent error
    pub fn agent(msg: impl Into<String>) -> Self {
        FlowpilotError::Agent(msg.into())
    }

    /// Create a channel error
    pub fn channel(msg: impl Into<String>) -> Self {
        FlowpilotError::Channel(msg.into())
    }

    /// Whether this error came from the network layer rather than the backend
    pub fn is_transport(&self) -> bool {
        matches!(self, FlowpilotError::Transport(_) | FlowpilotError::Io(_))
    }
}

impl From<serde_json::Error> for FlowpilotError {
    fn from(err: serde_json::Error) -> Self {
        FlowpilotError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for FlowpilotError {
    fn from(err: toml::de::Error) -> Self {
        FlowpilotError::Config(err.to_string())
    }
}

impl From<ureq::Error> for FlowpilotError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => {
                let message = response
                    .into_string()
                    .unwrap_or_else(|_| "Unknown error".to_string());
                FlowpilotError::Status { status, message }
            }
            ureq::Error::Transport(transport) => FlowpilotError::Transport(transport.to_string()),
        }
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for FlowpilotError {
    fn from(err: tokio::sync::mpsc::error::SendError<T>) -> Self {
        FlowpilotError::Channel(format!("Send error: {}", err))
    }
}
