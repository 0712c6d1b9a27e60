//! Per-thread conversation history

use crate::llm::ChatMessage;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-process chat history keyed by thread id
///
/// Threads live for the whole process. Nothing evicts them, and all of them
/// are lost on restart.
#[derive(Default)]
pub struct ConversationMemory {
    threads: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a thread's history (empty for unknown threads)
    pub fn history(&self, thread_id: &str) -> Vec<ChatMessage> {
        self.threads
            .read()
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace a thread's history
    pub fn save(&self, thread_id: &str, messages: Vec<ChatMessage>) {
        self.threads.write().insert(thread_id.to_string(), messages);
    }

    pub fn thread_count(&self) -> usize {
        self.threads.read().len()
    }
}
