/*
 * Responsibility
 * - 認証済み claims をそのまま返す (middleware の動作確認用)
 * - entry 名/種別を返す (ログ相関用ラベルの確認)
 */
use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::api::v1::extractors::{AuthEntry, Authenticated};
use crate::services::auth::StandardClaims;
use crate::state::AppState;

pub async fn whoami(Authenticated(claims): Authenticated<StandardClaims>) -> Json<StandardClaims> {
    Json(claims)
}

pub async fn entry(
    State(state): State<AppState>,
    entry: AuthEntry,
    claims: Option<Authenticated<StandardClaims>>,
) -> Json<Value> {
    Json(json!({
        "name": entry.name,
        "type": entry.kind,
        "scheme": state.jwt.auth_scheme(),
        "algorithm": format!("{:?}", state.jwt.algorithm()),
        "authenticated": claims.is_some(),
        "subject": claims.as_ref().and_then(|c| c.claims().sub.clone()),
    }))
}
