//! Chat relay handlers
//!
//! `/chat/new` hands out a session cookie; `/chat/ask` runs one agent turn
//! for that session and streams its output as plain text.

use crate::state::RelayState;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use flowpilot_core::session::{new_session_id, SESSION_COOKIE};
use flowpilot_core::AgentConfig;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub message: String,
}

/// `POST /chat/new`
pub async fn new_chat() -> Response {
    let session_id = new_session_id();
    tracing::info!(session = %session_id, "new relay session");

    let mut response = Json(serde_json::json!({ "results": "ok" })).into_response();
    attach_session_cookie(response.headers_mut(), &session_id);
    response
}

/// `POST /chat/ask`
///
/// Any failure after the response has started aborts the body instead of
/// writing an error message into it.
pub async fn ask(
    State(state): State<RelayState>,
    headers: HeaderMap,
    Json(request): Json<AskRequest>,
) -> Response {
    let (session_id, fresh) = match session_from_cookies(&headers) {
        Some(id) => (id, false),
        None => (new_session_id(), true),
    };
    tracing::debug!(session = %session_id, fresh, "relay ask");

    let config = AgentConfig::for_session(session_id.clone(), state.recursion_limit);
    let output = state.runtime.stream(request.message, config);
    let body = Body::from_stream(ReceiverStream::new(output).map(|item| item.map(Bytes::from)));

    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response();
    if fresh {
        attach_session_cookie(response.headers_mut(), &session_id);
    }
    response
}

fn attach_session_cookie(headers: &mut HeaderMap, session_id: &str) {
    let cookie = format!("{}={}; HttpOnly; Path=/; SameSite=Lax", SESSION_COOKIE, session_id);
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "session cookie is not a valid header value"),
    }
}

/// Relay session id from the `Cookie` header(s)
fn session_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
