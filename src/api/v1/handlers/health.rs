/*
 * Responsibility
 * - GET /health (疎通用)
 * - skipper により JWT 認証を通さない
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
