/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::{JwtOptions, StandardClaims};

#[derive(Clone, Debug)]
pub struct AppState {
    pub jwt: Arc<JwtOptions<StandardClaims>>,
}

impl AppState {
    pub fn new(jwt: Arc<JwtOptions<StandardClaims>>) -> Self {
        Self { jwt }
    }
}
