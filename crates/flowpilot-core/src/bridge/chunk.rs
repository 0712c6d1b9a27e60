//! Streamed chat chunk sent to the browser

use serde::{Deserialize, Serialize};

/// One piece of a streamed answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatChunk {
    pub content: String,
    pub conversation_id: String,
    /// Local time, ISO-8601 without offset
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
}

impl ChatChunk {
    /// A chunk of relay output stamped with the current time
    pub fn content(content: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            conversation_id: conversation_id.into(),
            timestamp: now_iso(),
            error: None,
        }
    }

    /// A chunk reporting a failure to the user
    pub fn error(message: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            error: Some(true),
            ..Self::content(message, conversation_id)
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.unwrap_or(false)
    }
}

fn now_iso() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
