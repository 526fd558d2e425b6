/*
 * Responsibility
 * - middleware の公開インターフェース (re-export)
 * - auth: JWT 認証 (route_layer), http: 横断的な HTTP layer
 */
pub mod auth;
pub mod http;
