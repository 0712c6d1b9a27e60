//! Chat relay router tests with a scripted model and in-process tools

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use flowpilot_core::llm::{AssistantTurn, ToolCall};
use flowpilot_core::{
    ChatMessage, ChatModel, FlowpilotError, LlmError, RelayConfig, ToolBackend, ToolCallResult,
    ToolDescriptor,
};
use flowpilot_server::{build_relay_router, RelayState};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const TOKEN: &str = "secret";

struct ScriptedModel {
    turns: Mutex<VecDeque<AssistantTurn>>,
    seen: Mutex<Vec<usize>>,
}

impl ChatModel for ScriptedModel {
    fn id(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> String {
        "scripted-1".into()
    }

    fn complete(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolDescriptor],
    ) -> Result<AssistantTurn, LlmError> {
        self.seen.lock().unwrap().push(messages.len());
        Ok(self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| AssistantTurn::text("no more turns")))
    }
}

struct StaticTools {
    reachable: bool,
}

impl ToolBackend for StaticTools {
    fn list_tools(&self) -> flowpilot_core::Result<Vec<ToolDescriptor>> {
        if !self.reachable {
            return Err(FlowpilotError::Transport("connection refused".into()));
        }
        Ok(vec![ToolDescriptor {
            name: "get_dags".into(),
            description: "List DAGs".into(),
            input_schema: json!({"type": "object", "properties": {}}),
        }])
    }

    fn call_tool(&self, _name: &str, _arguments: Value) -> flowpilot_core::Result<ToolCallResult> {
        Ok(ToolCallResult::text(r#"{"dags": [{"dag_id": "load_sales"}]}"#))
    }
}

fn state(turns: Vec<AssistantTurn>, reachable: bool) -> (RelayState, Arc<ScriptedModel>) {
    let model = Arc::new(ScriptedModel {
        turns: Mutex::new(turns.into()),
        seen: Mutex::new(Vec::new()),
    });
    let config = RelayConfig {
        access_token: TOKEN.into(),
        ..Default::default()
    };
    let state = RelayState::new(
        model.clone(),
        Arc::new(StaticTools { reachable }),
        &config,
        "",
    );
    (state, model)
}

fn ask(message: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/chat/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-access-token", TOKEN);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(json!({ "message": message }).to_string()))
        .unwrap()
}

async fn text(app: Router, request: Request<Body>) -> (axum::http::response::Parts, String) {
    let response = app.oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    (parts, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test(flavor = "multi_thread")]
async fn rejects_missing_access_token() {
    let (state, _) = state(vec![], true);
    let response = build_relay_router(state)
        .oneshot(Request::post("/chat/new").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread")]
async fn new_chat_sets_session_cookie() {
    let (state, _) = state(vec![], true);
    let request = Request::post("/chat/new")
        .header("x-access-token", TOKEN)
        .body(Body::empty())
        .unwrap();
    let (parts, body) = text(build_relay_router(state), request).await;

    assert_eq!(parts.status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"results": "ok"}));
    let cookie = parts.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("chat_session_id=user_"), "{}", cookie);
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test(flavor = "multi_thread")]
async fn ask_without_cookie_allocates_session_and_streams_text() {
    let (state, _) = state(
        vec![
            AssistantTurn {
                content: "Let me look. ".into(),
                tool_calls: vec![ToolCall {
                    id: "call_1".into(),
                    name: "get_dags".into(),
                    arguments: json!({}),
                }],
            },
            AssistantTurn::text("You have one DAG: load_sales."),
        ],
        true,
    );
    let (parts, body) = text(build_relay_router(state), ask("what dags exist?", None)).await;

    assert_eq!(parts.status, StatusCode::OK);
    assert_eq!(
        parts.headers[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert!(parts.headers.contains_key(header::SET_COOKIE));
    assert_eq!(body, "Let me look. You have one DAG: load_sales.");
}

#[tokio::test(flavor = "multi_thread")]
async fn ask_with_cookie_reuses_thread_history() {
    let (state, model) = state(
        vec![AssistantTurn::text("first"), AssistantTurn::text("second")],
        true,
    );
    let app = build_relay_router(state.clone());

    let (parts, body) = text(app.clone(), ask("one", Some("chat_session_id=user_fixed"))).await;
    assert!(!parts.headers.contains_key(header::SET_COOKIE));
    assert_eq!(body, "first");

    let (_, body) = text(app, ask("two", Some("chat_session_id=user_fixed"))).await;
    assert_eq!(body, "second");

    // user, assistant, then the new user message
    assert_eq!(*model.seen.lock().unwrap(), vec![1, 3]);
    assert_eq!(state.runtime.memory().history("user_fixed").len(), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn tool_server_failure_breaks_the_stream() {
    let (state, model) = state(vec![AssistantTurn::text("unused")], false);
    let response = build_relay_router(state)
        .oneshot(ask("hi", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(to_bytes(response.into_body(), usize::MAX).await.is_err());
    assert!(model.seen.lock().unwrap().is_empty());
}
