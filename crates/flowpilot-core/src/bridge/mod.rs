//! Embedded session bridge
//!
//! Client side of the chat relay, as used by the widget embedded in the
//! orchestrator console.

mod chunk;
mod client;

pub use chunk::ChatChunk;
pub use client::{RelayClient, INIT_FAILED_MESSAGE, READ_CHUNK_SIZE};
