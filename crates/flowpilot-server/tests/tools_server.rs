//! Tool server router tests against a mocked orchestrator

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use flowpilot_core::{OrchestratorClient, OrchestratorConfig, ToolServerConfig};
use flowpilot_server::{build_tool_router, ToolServerState};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "tool-token";

fn app(orchestrator: &MockServer) -> Router {
    let client = OrchestratorClient::new(&OrchestratorConfig {
        api_url: format!("{}/api/v1", orchestrator.uri()),
        ..Default::default()
    });
    let config = ToolServerConfig {
        bearer_token: TOKEN.to_string(),
        ..Default::default()
    };
    build_tool_router(ToolServerState::new(client, &config))
}

fn rpc(body: Value) -> Request<Body> {
    Request::post("/mcp")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test(flavor = "multi_thread")]
async fn health_is_open() {
    let server = MockServer::start().await;
    let (status, body) = send(
        app(&server),
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test(flavor = "multi_thread")]
async fn rpc_requires_bearer_token() {
    let server = MockServer::start().await;
    let request = Request::post("/mcp")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}).to_string(),
        ))
        .unwrap();
    let (status, _) = send(app(&server), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread")]
async fn tools_list_advertises_every_operation() {
    let server = MockServer::start().await;
    let (status, body) = send(
        app(&server),
        rpc(json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 7);
    let names: Vec<&str> = body["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "get_connections",
            "get_dags",
            "get_dag",
            "get_tasks",
            "get_task",
            "get_dag_runs",
            "trigger_dag_run",
            "get_dag_runs_batch",
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn rest_tool_listing_matches_rpc() {
    let server = MockServer::start().await;
    let request = Request::get("/mcp/tools/list")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&server), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tools"].as_array().unwrap().len(), 8);
}

#[tokio::test(flavor = "multi_thread")]
async fn tools_call_proxies_to_orchestrator() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/dags/load_sales/details"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"dag_id": "load_sales", "is_paused": false})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (_, body) = send(
        app(&server),
        rpc(json!({
            "jsonrpc": "2.0",
            "id": "a",
            "method": "tools/call",
            "params": {"name": "get_dag", "arguments": {"dag_id": "load_sales"}}
        })),
    )
    .await;

    assert_eq!(body["result"]["isError"], false);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    let dag: Value = serde_json::from_str(text).unwrap();
    assert_eq!(dag["dag_id"], "load_sales");
}

#[tokio::test(flavor = "multi_thread")]
async fn orchestrator_failure_is_tool_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/dags/ghost/tasks"))
        .respond_with(ResponseTemplate::new(404).set_body_string("DAG not found"))
        .mount(&server)
        .await;

    let (_, body) = send(
        app(&server),
        rpc(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {"name": "get_tasks", "arguments": {"dag_id": "ghost"}}
        })),
    )
    .await;

    assert_eq!(body["result"]["isError"], true);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("404"), "unexpected text: {}", text);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_argument_is_invalid_params() {
    let server = MockServer::start().await;
    let (_, body) = send(
        app(&server),
        rpc(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "get_task", "arguments": {"dag_id": "load_sales"}}
        })),
    )
    .await;
    assert_eq!(body["error"]["code"], -32602);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_tool_and_method_are_not_found() {
    let server = MockServer::start().await;
    let (_, body) = send(
        app(&server),
        rpc(json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": {"name": "delete_everything", "arguments": {}}
        })),
    )
    .await;
    assert_eq!(body["error"]["code"], -32601);

    let (_, body) = send(
        app(&server),
        rpc(json!({"jsonrpc": "2.0", "id": 5, "method": "resources/list"})),
    )
    .await;
    assert_eq!(body["error"]["code"], -32601);
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_request_is_parse_error() {
    let server = MockServer::start().await;
    let request = Request::post("/mcp")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app(&server), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
}
