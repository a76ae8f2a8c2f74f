// src/handlers/mod.rs

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub mod admin;
pub mod leaderboard;
pub mod quiz;
pub mod session;
pub mod share;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Fallback for unknown `/api` paths, so they don't fall through to the static files.
pub async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
