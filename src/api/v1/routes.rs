/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - JWT 認証は routes 全体に route_layer で適用 (/health は skipper で除外)
 */
use std::sync::Arc;

use axum::{Router, routing::get};

use crate::api::v1::handlers::{
    health::health,
    whoami::{entry, whoami},
};
use crate::middleware;
use crate::services::auth::{JwtOptions, StandardClaims};
use crate::state::AppState;

pub fn routes(options: Arc<JwtOptions<StandardClaims>>) -> Router<AppState> {
    let router = Router::new()
        .route("/health", get(health))
        .route("/whoami", get(whoami))
        .route("/entry", get(entry))
        // path-parameter lookup (JWT_TOKEN_LOOKUP=param:token) 用
        .route("/shared/{token}", get(whoami));

    middleware::auth::apply(router, options)
}
