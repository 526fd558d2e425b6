/*
 * Responsibility
 * - JWT 認証のコア (抽出 → 鍵解決 → 検証)
 * - HTTP への依存は request (RequestView) と options (skip 判定) に限定
 */
pub mod claims;
pub mod error;
pub mod extractor;
pub mod factory;
pub mod keys;
pub mod lookup;
pub mod options;
pub mod request;
pub mod verifier;

pub use claims::{Claims, StandardClaims};
pub use error::{AuthError, AuthErrorKind, ClaimsError, KeyError};
pub use factory::build_jwt_options;
pub use keys::{KeyResolver, StaticKeyResolver};
pub use lookup::Source;
pub use options::{JwtOptions, JwtOptionsBuilder};
pub use verifier::{JwtParser, TokenParser};
