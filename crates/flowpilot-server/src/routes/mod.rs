//! API route handlers

pub mod bridge;
pub mod relay;
pub mod tools;

use axum::{response::IntoResponse, Json};

/// `GET /health`
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": flowpilot_core::version()
    }))
}
