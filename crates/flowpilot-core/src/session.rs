//! Bridge session store
//!
//! Maps a browser conversation id to the relay cookies obtained when the
//! session was initialized.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Cookie carrying the relay session id
pub const SESSION_COOKIE: &str = "chat_session_id";

/// Allocate a relay session id (`user_<uuid>`)
pub fn new_session_id() -> String {
    format!("user_{}", Uuid::new_v4())
}

/// Allocate a browser conversation id
pub fn new_conversation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Relay session state for one conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// `Cookie` header value to replay on `/chat/ask`
    pub cookies: String,
    pub initialized: bool,
}

impl SessionRecord {
    pub fn initialized(cookies: impl Into<String>) -> Self {
        Self {
            cookies: cookies.into(),
            initialized: true,
        }
    }
}

/// Storage for bridge sessions
///
/// Injected into the relay client so tests and alternative backends can
/// supply their own.
pub trait SessionStore: Send + Sync {
    fn get(&self, conversation_id: &str) -> Option<SessionRecord>;

    fn put(&self, conversation_id: &str, record: SessionRecord);

    /// Remove a session, returning whether it existed
    fn delete(&self, conversation_id: &str) -> bool;
}

/// Process-local session store
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, conversation_id: &str) -> Option<SessionRecord> {
        self.sessions.read().get(conversation_id).cloned()
    }

    fn put(&self, conversation_id: &str, record: SessionRecord) {
        self.sessions
            .write()
            .insert(conversation_id.to_string(), record);
    }

    fn delete(&self, conversation_id: &str) -> bool {
        self.sessions.write().remove(conversation_id).is_some()
    }
}
