//! Flowpilot Server Library
//!
//! HTTP surfaces over `flowpilot-core`:
//! - tool server: JSON-RPC `tools/list` / `tools/call` over the orchestrator proxy
//! - chat relay: `/chat/new`, `/chat/ask` driving the agent loop
//! - session bridge: `/airflow_chat/*`, the SSE endpoint behind the embedded widget

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use flowpilot_core::FlowpilotConfig;
use std::net::SocketAddr;
use std::sync::Once;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::ApiError;
pub use state::{BridgeState, RelayState, ToolServerState};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber (only once)
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(
                std::env::var("RUST_LOG").unwrap_or_else(|_| {
                    "flowpilot_server=debug,flowpilot_core=info,tower_http=debug".into()
                }),
            ))
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}

/// Tracing and permissive CORS, shared by every router
fn with_middleware(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
    )
}

/// Build the tool server router
pub fn build_tool_router(state: ToolServerState) -> Router {
    let router = Router::new()
        .route("/mcp", post(routes::tools::json_rpc))
        .route("/mcp/tools/list", get(routes::tools::list_tools))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ))
        .route("/health", get(routes::health_check))
        .with_state(state);
    with_middleware(router)
}

/// Build the chat relay router
pub fn build_relay_router(state: RelayState) -> Router {
    let router = Router::new()
        .route("/chat/new", post(routes::relay::new_chat))
        .route("/chat/ask", post(routes::relay::ask))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_access_token,
        ))
        .route("/health", get(routes::health_check))
        .with_state(state);
    with_middleware(router)
}

/// Build the session bridge router
pub fn build_bridge_router(state: BridgeState) -> Router {
    let chat = Router::new()
        .route("/airflow_chat", get(routes::bridge::chat_page))
        .route("/airflow_chat/", get(routes::bridge::chat_page))
        .route("/airflow_chat/api/chat", post(routes::bridge::chat))
        .route("/airflow_chat/api/new_chat", post(routes::bridge::new_chat))
        .route("/airflow_chat/api/clear_chat", post(routes::bridge::clear_chat))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_role,
        ))
        .layer(CatchPanicLayer::custom(error::panic_response));

    let router = Router::new()
        .merge(chat)
        .route("/health", get(routes::health_check))
        .with_state(state);
    with_middleware(router)
}

async fn serve(name: &str, addr: SocketAddr, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("{} listening on http://{}", name, addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run the tool server
pub async fn run_tool_server(config: FlowpilotConfig) -> anyhow::Result<()> {
    init_tracing();
    tracing::info!(orchestrator = %config.orchestrator.api_url, "Starting tool server...");
    let app = build_tool_router(ToolServerState::from_config(&config));
    serve("Tool server", config.tools.bind_address, app).await
}

/// Run the chat relay
pub async fn run_relay(config: FlowpilotConfig) -> anyhow::Result<()> {
    init_tracing();
    tracing::info!(
        tools = %config.relay.tool_server_url,
        model = %config.llm.model,
        "Starting chat relay..."
    );
    let app = build_relay_router(RelayState::from_config(&config));
    serve("Chat relay", config.relay.bind_address, app).await
}

/// Run the session bridge
pub async fn run_bridge(config: FlowpilotConfig) -> anyhow::Result<()> {
    init_tracing();
    tracing::info!(relay = %config.bridge.relay_url, "Starting session bridge...");
    let app = build_bridge_router(BridgeState::from_config(&config));
    serve("Session bridge", config.bridge.bind_address, app).await
}

/// Run all three services on one runtime, stopping at the first failure
pub async fn run_all(config: FlowpilotConfig) -> anyhow::Result<()> {
    tokio::try_join!(
        run_tool_server(config.clone()),
        run_relay(config.clone()),
        run_bridge(config),
    )?;
    Ok(())
}
