//! Orchestrator proxy errors

use serde::Serialize;
use std::fmt;

/// Result of a proxied orchestrator call
pub type ProxyResult = std::result::Result<serde_json::Value, ProxyError>;

/// What went wrong with a proxied call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyErrorKind {
    /// Connection refused, DNS failure, timeout
    Transport,

    /// Orchestrator answered with a non-2xx status
    Status,

    /// 2xx response whose body was not JSON
    Decode,
}

impl fmt::Display for ProxyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProxyErrorKind::Transport => "transport error",
            ProxyErrorKind::Status => "HTTP error",
            ProxyErrorKind::Decode => "decode error",
        };
        f.write_str(label)
    }
}

/// Tagged failure of a proxied orchestrator call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyError {
    pub kind: ProxyErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({}): {}", self.kind, status, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ProxyError {}

impl ProxyError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ProxyErrorKind::Transport,
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ProxyErrorKind::Status,
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: ProxyErrorKind::Decode,
            status: None,
            message: message.into(),
        }
    }
}

impl From<ureq::Error> for ProxyError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => {
                let message = response
                    .into_string()
                    .unwrap_or_else(|_| "Unknown error".to_string());
                ProxyError::status(status, message)
            }
            ureq::Error::Transport(transport) => ProxyError::transport(transport.to_string()),
        }
    }
}
