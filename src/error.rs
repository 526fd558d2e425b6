/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - 認証失敗は内部の kind を保持しつつ、レスポンスでは汎用メッセージに揃える
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::services::auth::error::AuthErrorKind;
use crate::services::auth::options::OptionsError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    // `kind` is for logs/tests only; it never reaches the response body.
    #[error("unauthorized ({})", .0.as_str())]
    Unauthorized(AuthErrorKind),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn auth_kind(&self) -> Option<AuthErrorKind> {
        match self {
            Self::Unauthorized(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "invalid or missing credential".to_string(),
            ),
            // Start-up failures; only reachable if someone turns them into a response.
            AppError::Config(_) | AppError::Options(_) | AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".to_string(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unauthorized_body_is_generic() {
        let err = AppError::Unauthorized(AuthErrorKind::AlgorithmMismatch);
        assert_eq!(err.auth_kind(), Some(AuthErrorKind::AlgorithmMismatch));
        assert_eq!(AppError::Internal.auth_kind(), None);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        assert!(!body.to_string().contains("algorithm"));
    }
}
