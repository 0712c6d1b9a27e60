//! Configuration module for Flowpilot
//!
//! Handles loading and parsing of `.flowpilot.toml` configuration files
//! with support for environment variable expansion.

mod loader;
mod types;

pub use loader::{load_config, load_from_file, parse_config, sample_config, ConfigError};
pub use types::{
    BridgeConfig, FlowpilotConfig, LlmConfig, OrchestratorConfig, RelayConfig, ToolCachePolicy,
    ToolServerConfig,
};
