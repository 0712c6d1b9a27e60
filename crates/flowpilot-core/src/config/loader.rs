//! Configuration loader with environment variable expansion
//!
//! Loads configuration from an explicit path, `.flowpilot.toml` in the working
//! directory, or the user config directory.

use super::types::FlowpilotConfig;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Load configuration from various sources
///
/// Priority order:
/// 1. Explicit path passed on the command line
/// 2. Project-level `.flowpilot.toml`
/// 3. User-level `~/.config/flowpilot/config.toml`
/// 4. Default configuration
///
/// Environment overrides are applied on top in every case.
pub fn load_config(
    explicit: Option<&Path>,
    project_dir: &Path,
) -> Result<FlowpilotConfig, ConfigError> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        return load_from_file(path);
    }

    let project_config = project_dir.join(".flowpilot.toml");
    if project_config.exists() {
        return load_from_file(&project_config);
    }

    if let Some(user_config) = get_user_config_path() {
        if user_config.exists() {
            return load_from_file(&user_config);
        }
    }

    Ok(apply_env_overrides(FlowpilotConfig::default(), env_lookup))
}

/// Get user config directory path
fn get_user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("flowpilot").join("config.toml"))
}

/// Load configuration from a specific file
pub fn load_from_file(path: &Path) -> Result<FlowpilotConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content, env_lookup)
}

/// Parse configuration text, expanding `${VAR}` and applying overrides via `lookup`
pub fn parse_config(
    content: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<FlowpilotConfig, ConfigError> {
    let mut config: FlowpilotConfig = toml::from_str(content)?;
    expand_env_vars(&mut config, &lookup);
    Ok(apply_env_overrides(config, lookup))
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn env_regex() -> Regex {
    Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid")
}

/// Expand ${VAR} patterns in secret and URL values
///
/// A field naming an unset variable falls back to its built-in default.
fn expand_env_vars(config: &mut FlowpilotConfig, lookup: &impl Fn(&str) -> Option<String>) {
    let env_regex = env_regex();
    let defaults = FlowpilotConfig::default();

    let fields: [(&mut String, &String); 10] = [
        (&mut config.orchestrator.api_url, &defaults.orchestrator.api_url),
        (&mut config.orchestrator.username, &defaults.orchestrator.username),
        (&mut config.orchestrator.password, &defaults.orchestrator.password),
        (&mut config.tools.bearer_token, &defaults.tools.bearer_token),
        (&mut config.relay.access_token, &defaults.relay.access_token),
        (&mut config.relay.tool_server_url, &defaults.relay.tool_server_url),
        (&mut config.relay.tool_token, &defaults.relay.tool_token),
        (&mut config.bridge.relay_url, &defaults.bridge.relay_url),
        (&mut config.bridge.access_token, &defaults.bridge.access_token),
        (&mut config.llm.base_url, &defaults.llm.base_url),
    ];
    for (field, default) in fields {
        *field = expand_string(field, &env_regex, lookup).unwrap_or_else(|| default.clone());
    }

    config.llm.api_key = config
        .llm
        .api_key
        .as_deref()
        .and_then(|key| expand_string(key, &env_regex, lookup));
}

/// Expand environment variables in a single string
///
/// Returns `None` when any referenced variable is unset.
fn expand_string(
    s: &str,
    regex: &Regex,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    let mut unresolved = false;
    let expanded = regex
        .replace_all(s, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_else(|| {
                tracing::debug!(var = &caps[1], "config variable is not set");
                unresolved = true;
                String::new()
            })
        })
        .to_string();
    (!unresolved).then_some(expanded)
}

/// Apply environment variable overrides for deployment settings
///
/// Supports direct environment variables:
/// - airflow_api_url / airflow_username / airflow_password -> orchestrator
/// - FAST_API_ACCESS_SECRET_TOKEN -> relay.access_token and bridge.access_token
/// - MCP_TOKEN -> tools.bearer_token and relay.tool_token
/// - OPENAI_API_KEY / LLM_BASE_URL / LLM_MODEL -> llm
/// - FLOWPILOT_RELAY_URL -> bridge.relay_url
/// - FLOWPILOT_TOOL_SERVER_URL -> relay.tool_server_url
fn apply_env_overrides(
    mut config: FlowpilotConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> FlowpilotConfig {
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(url) = get("airflow_api_url") {
        config.orchestrator.api_url = url;
    }
    if let Some(username) = get("airflow_username") {
        config.orchestrator.username = username;
    }
    if let Some(password) = get("airflow_password") {
        config.orchestrator.password = password;
    }

    if let Some(token) = get("FAST_API_ACCESS_SECRET_TOKEN") {
        config.relay.access_token = token.clone();
        config.bridge.access_token = token;
    }

    if let Some(token) = get("MCP_TOKEN") {
        config.tools.bearer_token = token.clone();
        config.relay.tool_token = token;
    }

    if let Some(key) = get("OPENAI_API_KEY") {
        config.llm.api_key = Some(key);
    }
    if let Some(url) = get("LLM_BASE_URL") {
        config.llm.base_url = url;
    }
    if let Some(model) = get("LLM_MODEL") {
        config.llm.model = model;
    }

    if let Some(url) = get("FLOWPILOT_RELAY_URL") {
        config.bridge.relay_url = url;
    }
    if let Some(url) = get("FLOWPILOT_TOOL_SERVER_URL") {
        config.relay.tool_server_url = url;
    }

    config
}

/// Create a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# Flowpilot Configuration
# Place this file in your working directory as .flowpilot.toml
# or in ~/.config/flowpilot/config.toml for global settings

# ${VAR} values are read from the environment. When a variable is unset
# the field keeps its built-in default.

[orchestrator]
api_url = "http://airflow-webserver:8080/api/v1"
username = "${airflow_username}"
password = "${airflow_password}"
# Per-request timeout in seconds
timeout = 30

[tools]
bind_address = "0.0.0.0:8000"
bearer_token = "${MCP_TOKEN}"

[relay]
bind_address = "0.0.0.0:8080"
access_token = "${FAST_API_ACCESS_SECRET_TOKEN}"
tool_server_url = "http://mcp_sse_server:8000/mcp"
tool_token = "${MCP_TOKEN}"
recursion_limit = 100
# per_turn: fetch tools every chat turn, process: cache until invalidated
tool_cache = "per_turn"

[bridge]
bind_address = "0.0.0.0:8081"
relay_url = "http://fastapi:8080"
access_token = "${FAST_API_ACCESS_SECRET_TOKEN}"
role_header = "x-airflow-roles"
approved_roles = ["Admin", "User", "Op", "Viewer"]

[llm]
base_url = "https://api.openai.com/v1"
api_key = "${OPENAI_API_KEY}"
model = "gpt-4o-mini"
"#
}
