//! OpenAI-compatible LLM provider
//!
//! Connects to any endpoint implementing `/chat/completions` with function
//! tools (OpenAI, Azure, vLLM, Ollama's OpenAI shim, local proxies).

use super::{AssistantTurn, ChatMessage, ChatModel, LlmError, ToolCall};
use crate::config::LlmConfig;
use crate::mcp::ToolDescriptor;
use serde_json::Value;
use std::time::Duration;

/// OpenAI provider
pub struct OpenAIProvider {
    /// API key
    api_key: String,

    /// Base URL for the API (supports OpenAI-compatible APIs)
    base_url: String,

    /// Model name sent with every request
    model: String,

    temperature: f32,

    client: ureq::Agent,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.to_string(),
            temperature: 0.0,
            client: ureq::Agent::new(),
        }
    }

    /// Create from the `[llm]` config section
    pub fn from_config(config: &LlmConfig) -> Self {
        let mut provider = Self::new(config.api_key.as_deref().unwrap_or(""), &config.model)
            .with_base_url(&config.base_url);
        provider.temperature = config.temperature;
        provider.client = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout))
            .build();
        provider
    }

    /// Create with a specific base URL (for OpenAI-compatible APIs like Azure, local proxies)
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

impl ChatModel for OpenAIProvider {
    fn id(&self) -> &str {
        "openai"
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDescriptor],
    ) -> Result<AssistantTurn, LlmError> {
        let conversation: Vec<Value> = messages.iter().map(ChatMessage::to_api_json).collect();

        let mut body = serde_json::json!({
            "model": self.model(),
            "messages": conversation,
            "temperature": self.temperature
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(tool_json).collect());
        }

        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self
            .client
            .post(&url)
            .set("Content-Type", "application/json");
        if !self.api_key.is_empty() {
            request = request.set("Authorization", &format!("Bearer {}", self.api_key));
        }

        let json: Value = request.send_json(&body)?.into_json()?;

        if let Some(error) = json.get("error") {
            let error_msg = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error");
            return Err(LlmError::Api {
                status: 500,
                message: error_msg.to_string(),
            });
        }

        parse_completion(&json)
    }
}

/// Render a tool descriptor as an OpenAI function tool
fn tool_json(tool: &ToolDescriptor) -> Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.input_schema,
        }
    })
}

/// Extract text and tool calls from a chat-completions response
fn parse_completion(json: &Value) -> Result<AssistantTurn, LlmError> {
    let message = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| LlmError::InvalidResponse("missing choices[0].message".to_string()))?;

    let content = message
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string();

    let tool_calls = message
        .get("tool_calls")
        .and_then(|t| t.as_array())
        .map(|calls| calls.iter().filter_map(parse_tool_call).collect())
        .unwrap_or_default();

    Ok(AssistantTurn {
        content,
        tool_calls,
    })
}

fn parse_tool_call(call: &Value) -> Option<ToolCall> {
    let id = call.get("id")?.as_str()?.to_string();
    let function = call.get("function")?;
    let name = function.get("name")?.as_str()?.to_string();
    let raw_args = function
        .get("arguments")
        .and_then(|a| a.as_str())
        .unwrap_or("{}");
    let arguments = serde_json::from_str(raw_args).unwrap_or_else(|e| {
        tracing::warn!(tool = %name, error = %e, "model sent non-JSON tool arguments");
        Value::String(raw_args.to_string())
    });

    Some(ToolCall {
        id,
        name,
        arguments,
    })
}
