//! Chat model errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// The endpoint could not be reached or the body could not be read
    #[error("Connection error: {0}")]
    Connection(String),

    /// Non-success status, or an `error` object in a 200 body
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited")]
    RateLimited,

    /// The body was not a chat completion
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<ureq::Error> for LlmError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(429, _) => LlmError::RateLimited,
            ureq::Error::Status(status @ (401 | 403), _) => LlmError::Api {
                status,
                message: "Authentication failed".to_string(),
            },
            ureq::Error::Status(status, response) => LlmError::Api {
                status,
                message: response
                    .into_string()
                    .unwrap_or_else(|_| "Unknown error".to_string()),
            },
            ureq::Error::Transport(transport) => LlmError::Connection(transport.to_string()),
        }
    }
}

/// Body reads fail with `InvalidData` when the payload is not JSON
impl From<std::io::Error> for LlmError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::InvalidData => LlmError::InvalidResponse(err.to_string()),
            _ => LlmError::Connection(err.to_string()),
        }
    }
}
