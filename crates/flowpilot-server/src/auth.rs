//! Request guards
//!
//! Bearer token for the tool server, shared access token for the relay and
//! role check for the bridge. All are `from_fn_with_state` middleware.

use crate::error::ApiError;
use crate::state::{BridgeState, RelayState, ToolServerState};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Header carrying the relay's shared secret
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

pub async fn require_bearer(
    State(state): State<ToolServerState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.bearer_token.is_empty() {
        let presented = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(state.bearer_token.as_str()) {
            tracing::warn!("rejected tool request without valid bearer token");
            return ApiError::Unauthorized("Unauthorized".into()).into_response();
        }
    }
    next.run(request).await
}

pub async fn require_access_token(
    State(state): State<RelayState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.access_token.is_empty() {
        let presented = request
            .headers()
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if presented != Some(state.access_token.as_str()) {
            tracing::warn!("rejected relay request with missing or wrong access token");
            return ApiError::Unauthorized("Invalid access token".into()).into_response();
        }
    }
    next.run(request).await
}

pub async fn require_role(
    State(state): State<BridgeState>,
    request: Request,
    next: Next,
) -> Response {
    let roles = caller_roles(request.headers(), &state.role_header);
    if roles.is_empty() {
        return ApiError::Unauthorized("Authentication required".into()).into_response();
    }
    if !roles
        .iter()
        .any(|role| state.approved_roles.iter().any(|approved| approved == role))
    {
        tracing::info!(?roles, "caller has no approved role");
        return ApiError::Forbidden("Access denied".into()).into_response();
    }
    next.run(request).await
}

/// Roles listed in `header`, comma separated, blanks dropped
fn caller_roles(headers: &HeaderMap, header: &str) -> Vec<String> {
    headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
