//! Relay client used by the embedded chat bridge
//!
//! Keeps one relay session per browser conversation and forwards each
//! message to the relay, re-emitting the streamed answer as [`ChatChunk`]s.

use super::ChatChunk;
use crate::config::BridgeConfig;
use crate::error::{FlowpilotError, Result};
use crate::session::{SessionRecord, SessionStore};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Bytes read from the relay per chunk
pub const READ_CHUNK_SIZE: usize = 1024;

pub const INIT_FAILED_MESSAGE: &str = "Failed to initialize chat session. Please try again.";

/// Blocking client for the chat relay
pub struct RelayClient {
    relay_url: String,
    access_token: String,
    store: Arc<dyn SessionStore>,
    init_agent: ureq::Agent,
    ask_agent: ureq::Agent,
}

impl RelayClient {
    pub fn new(config: &BridgeConfig, store: Arc<dyn SessionStore>) -> Self {
        Self {
            relay_url: config.relay_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            store,
            init_agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(config.init_timeout))
                .build(),
            ask_agent: ureq::AgentBuilder::new()
                .timeout_read(Duration::from_secs(config.ask_timeout))
                .build(),
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Open a relay session for a conversation and remember its cookies
    ///
    /// Not atomic with respect to other callers for the same conversation:
    /// concurrent first messages may each open a session, the last one wins.
    pub fn initialize_session(&self, conversation_id: &str) -> Result<SessionRecord> {
        let url = format!("{}/chat/new", self.relay_url);
        let response = self
            .init_agent
            .post(&url)
            .set("x-access-token", &self.access_token)
            .call()?;

        let cookies = cookie_header(&response.all("set-cookie"));
        tracing::debug!(conversation = %conversation_id, "relay session initialized");

        let record = SessionRecord::initialized(cookies);
        self.store.put(conversation_id, record.clone());
        Ok(record)
    }

    /// Forward one message and stream the relay's answer into `sink`
    ///
    /// Failures are reported as a single error chunk. Blocks the calling
    /// thread; run it off the async runtime.
    pub fn stream_chat_response(
        &self,
        message: &str,
        conversation_id: &str,
        sink: &mpsc::Sender<ChatChunk>,
    ) {
        let record = match self.store.get(conversation_id) {
            Some(record) if record.initialized => record,
            _ => match self.initialize_session(conversation_id) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(conversation = %conversation_id, error = %e, "session init failed");
                    let _ = sink.blocking_send(ChatChunk::error(INIT_FAILED_MESSAGE, conversation_id));
                    return;
                }
            },
        };

        if let Err(e) = self.forward(message, conversation_id, &record, sink) {
            tracing::warn!(conversation = %conversation_id, error = %e, "relay ask failed");
            let _ = sink.blocking_send(ChatChunk::error(failure_message(&e), conversation_id));
        }
    }

    fn forward(
        &self,
        message: &str,
        conversation_id: &str,
        record: &SessionRecord,
        sink: &mpsc::Sender<ChatChunk>,
    ) -> Result<()> {
        let url = format!("{}/chat/ask", self.relay_url);
        let mut request = self
            .ask_agent
            .post(&url)
            .set("x-access-token", &self.access_token);
        if !record.cookies.is_empty() {
            request = request.set("Cookie", &record.cookies);
        }

        let response = request.send_json(serde_json::json!({ "message": message }))?;
        let mut reader = response.into_reader();
        let mut buf = [0u8; READ_CHUNK_SIZE];

        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                return Ok(());
            }
            let Ok(text) = std::str::from_utf8(&buf[..n]) else {
                tracing::debug!(bytes = n, "dropping undecodable chunk");
                continue;
            };
            if sink
                .blocking_send(ChatChunk::content(text, conversation_id))
                .is_err()
            {
                tracing::debug!(conversation = %conversation_id, "client went away");
                return Ok(());
            }
        }
    }

    /// Forget the relay session for a conversation
    pub fn clear_session(&self, conversation_id: &str) -> bool {
        self.store.delete(conversation_id)
    }
}

/// Join `Set-Cookie` values into a `Cookie` header, keeping name=value only
fn cookie_header(set_cookies: &[&str]) -> String {
    set_cookies
        .iter()
        .filter_map(|c| c.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect::<Vec<_>>()
        .join("; ")
}

fn failure_message(err: &FlowpilotError) -> String {
    if err.is_transport() || matches!(err, FlowpilotError::Status { .. }) {
        format!(
            "Connection error: {}. Please check if the relay service is running.",
            err
        )
    } else {
        format!("An unexpected error occurred: {}", err)
    }
}
