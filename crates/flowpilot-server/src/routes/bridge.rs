//! Embedded chat bridge handlers, mounted under `/airflow_chat`

use crate::error::ApiError;
use crate::state::BridgeState;
use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{
        sse::{Event, Sse},
        Html, IntoResponse, Response,
    },
    Json,
};
use flowpilot_core::session::new_conversation_id;
use flowpilot_core::ChatChunk;
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

/// Sentinel event closing every chat stream
pub const DONE_SENTINEL: &str = "[DONE]";

const CHAT_PAGE: &str = include_str!("../../assets/chat_interface.html");

const CHUNK_BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
    #[serde(default)]
    conversation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClearRequest {
    conversation_id: String,
}

/// `GET /airflow_chat/`
pub async fn chat_page() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

/// `POST /airflow_chat/api/chat`
///
/// Streams the relay answer as SSE, one event per chunk, then `[DONE]`.
pub async fn chat(State(state): State<BridgeState>, body: Bytes) -> Result<Response, ApiError> {
    let request: ChatRequest = serde_json::from_slice(&body).map_err(ApiError::internal)?;

    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message is required".into()));
    }
    let conversation_id = request
        .conversation_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(new_conversation_id);
    tracing::debug!(conversation = %conversation_id, "bridge chat");

    let (tx, rx) = mpsc::channel::<ChatChunk>(CHUNK_BUFFER);
    let client = state.client.clone();
    let worker_tx = tx.clone();
    let worker_id = conversation_id.clone();
    let worker = tokio::task::spawn_blocking(move || {
        client.stream_chat_response(&message, &worker_id, &worker_tx);
    });
    tokio::spawn(supervise(worker, tx, conversation_id));

    let events = ReceiverStream::new(rx)
        .map(|chunk| {
            Ok::<_, Infallible>(Event::default().json_data(&chunk).unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to encode chat chunk");
                Event::default().data("{}")
            }))
        })
        .chain(stream::once(async {
            Ok(Event::default().data(DONE_SENTINEL))
        }));

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        Sse::new(events),
    )
        .into_response())
}

/// Report a crashed relay worker as an error chunk before the stream closes
async fn supervise(worker: JoinHandle<()>, tx: mpsc::Sender<ChatChunk>, conversation_id: String) {
    if let Err(e) = worker.await {
        tracing::error!(conversation = %conversation_id, error = %e, "chat worker failed");
        let chunk = ChatChunk::error(
            format!("An unexpected error occurred: {}", e),
            conversation_id,
        );
        let _ = tx.send(chunk).await;
    }
}

/// `POST /airflow_chat/api/new_chat`
pub async fn new_chat(State(state): State<BridgeState>) -> Result<Response, ApiError> {
    let conversation_id = new_conversation_id();
    let client = state.client.clone();
    let id = conversation_id.clone();
    let outcome = tokio::task::spawn_blocking(move || client.initialize_session(&id))
        .await
        .map_err(ApiError::internal)?;

    match outcome {
        Ok(_) => Ok(Json(serde_json::json!({
            "conversation_id": conversation_id,
            "status": "initialized",
            "message": "New chat session created"
        }))
        .into_response()),
        Err(e) => {
            tracing::warn!(error = %e, "failed to initialize chat session");
            Ok((
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to initialize chat session" })),
            )
                .into_response())
        }
    }
}

/// `POST /airflow_chat/api/clear_chat`
pub async fn clear_chat(
    State(state): State<BridgeState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request: ClearRequest = serde_json::from_slice(&body).map_err(ApiError::internal)?;
    let cleared = state.client.clear_session(&request.conversation_id);
    Ok(Json(serde_json::json!({
        "conversation_id": request.conversation_id,
        "cleared": cleared
    })))
}
