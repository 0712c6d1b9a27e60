//! Session bridge router tests against a mocked chat relay

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use flowpilot_core::{BridgeConfig, InMemorySessionStore, SessionRecord, SessionStore};
use flowpilot_server::{build_bridge_router, BridgeState};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{header as header_is, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROLES: &str = "x-airflow-roles";

fn app_for(relay_url: &str) -> (Router, Arc<InMemorySessionStore>) {
    let store = Arc::new(InMemorySessionStore::new());
    let config = BridgeConfig {
        relay_url: relay_url.to_string(),
        access_token: "secret".into(),
        ..Default::default()
    };
    (build_bridge_router(BridgeState::new(&config, store.clone())), store)
}

fn post(uri: &str, roles: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(roles) = roles {
        builder = builder.header(ROLES, roles);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_response(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// `data:` payloads of an SSE body, in order
fn sse_data(body: &str) -> Vec<String> {
    body.split("\n\n")
        .filter(|event| !event.trim().is_empty())
        .map(|event| {
            event
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(str::trim_start)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}

async fn mount_relay(server: &MockServer, answer: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/new"))
        .and(header_is("x-access-token", "secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "chat_session_id=user_1; HttpOnly; Path=/")
                .set_body_json(json!({"results": "ok"})),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/ask"))
        .and(header_is("cookie", "chat_session_id=user_1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(answer))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_roles_is_unauthenticated() {
    let (app, _) = app_for("http://127.0.0.1:1");
    let (status, body) = json_response(app, post("/airflow_chat/api/chat", None, "{}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Authentication required"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn unapproved_role_is_denied() {
    let (app, _) = app_for("http://127.0.0.1:1");
    let (status, body) =
        json_response(app, post("/airflow_chat/api/new_chat", Some("Public"), "")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "Access denied"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn chat_page_served_to_viewers() {
    let (app, _) = app_for("http://127.0.0.1:1");
    let request = Request::get("/airflow_chat/")
        .header(ROLES, "Public, Viewer")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("api/chat"));
}

#[tokio::test(flavor = "multi_thread")]
async fn blank_message_is_rejected() {
    let (app, _) = app_for("http://127.0.0.1:1");
    let (status, body) = json_response(
        app,
        post(
            "/airflow_chat/api/chat",
            Some("Admin"),
            r#"{"message": "   ", "conversation_id": "c1"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Message is required"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_body_is_generic_failure() {
    let (app, _) = app_for("http://127.0.0.1:1");
    let (status, body) =
        json_response(app, post("/airflow_chat/api/chat", Some("Admin"), "{oops")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Something went wrong"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn chat_streams_chunks_then_done() {
    let server = MockServer::start().await;
    mount_relay(&server, "load_sales ran 3 times today.").await;
    let (app, store) = app_for(&server.uri());

    let response = app
        .oneshot(post(
            "/airflow_chat/api/chat",
            Some("Op"),
            r#"{"message": "how is load_sales?", "conversation_id": "conv-1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let events = sse_data(&String::from_utf8(bytes.to_vec()).unwrap());

    assert_eq!(events.last().map(String::as_str), Some("[DONE]"));
    assert_eq!(events.iter().filter(|e| *e == "[DONE]").count(), 1);

    let chunk: Value = serde_json::from_str(&events[0]).unwrap();
    assert_eq!(chunk["content"], "load_sales ran 3 times today.");
    assert_eq!(chunk["conversation_id"], "conv-1");
    assert!(chunk.get("error").is_none());
    assert!(store.get("conv-1").unwrap().initialized);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_conversation_id_gets_generated() {
    let server = MockServer::start().await;
    mount_relay(&server, "hi").await;
    let (app, _) = app_for(&server.uri());

    let response = app
        .oneshot(post("/airflow_chat/api/chat", Some("User"), r#"{"message": "hello"}"#))
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let events = sse_data(&String::from_utf8(bytes.to_vec()).unwrap());

    let chunk: Value = serde_json::from_str(&events[0]).unwrap();
    let id = chunk["conversation_id"].as_str().unwrap();
    assert_eq!(id.len(), 36);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_relay_yields_error_chunk_then_done() {
    let (app, _) = app_for("http://127.0.0.1:1");
    let response = app
        .oneshot(post(
            "/airflow_chat/api/chat",
            Some("Admin"),
            r#"{"message": "hi", "conversation_id": "c9"}"#,
        ))
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let events = sse_data(&String::from_utf8(bytes.to_vec()).unwrap());

    assert_eq!(events.len(), 2);
    let chunk: Value = serde_json::from_str(&events[0]).unwrap();
    assert_eq!(chunk["error"], true);
    assert_eq!(
        chunk["content"],
        "Failed to initialize chat session. Please try again."
    );
    assert_eq!(events[1], "[DONE]");
}

#[tokio::test(flavor = "multi_thread")]
async fn new_chat_initializes_session() {
    let server = MockServer::start().await;
    mount_relay(&server, "").await;
    let (app, store) = app_for(&server.uri());

    let (status, body) =
        json_response(app, post("/airflow_chat/api/new_chat", Some("Admin"), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "initialized");
    assert_eq!(body["message"], "New chat session created");

    let id = body["conversation_id"].as_str().unwrap();
    assert_eq!(
        store.get(id),
        Some(SessionRecord::initialized("chat_session_id=user_1"))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn new_chat_failure_is_500() {
    let (app, store) = app_for("http://127.0.0.1:1");
    let (status, body) =
        json_response(app, post("/airflow_chat/api/new_chat", Some("Admin"), "")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to initialize chat session"}));
    assert!(store.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn clear_chat_forgets_session() {
    let (app, store) = app_for("http://127.0.0.1:1");
    store.put("conv-7", SessionRecord::initialized("a=b"));

    let (status, body) = json_response(
        app.clone(),
        post(
            "/airflow_chat/api/clear_chat",
            Some("Admin"),
            r#"{"conversation_id": "conv-7"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"conversation_id": "conv-7", "cleared": true}));

    let (_, body) = json_response(
        app,
        post(
            "/airflow_chat/api/clear_chat",
            Some("Admin"),
            r#"{"conversation_id": "conv-7"}"#,
        ),
    )
    .await;
    assert_eq!(body["cleared"], false);
}
