use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::error::AuthErrorKind;

use super::{AuthEntry, Authenticated};

/// Handler で、 claims を受け取るための extractor
/// middleware が Authenticated<C> を request.extensions() に insert 済みである前提
/// 見つからない場合は 401 を返す（認証がかかってない・skip された・ミドルウェア未設定）
impl<S, C> FromRequestParts<S> for Authenticated<C>
where
    S: Send + Sync,
    C: Clone + Send + Sync + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Authenticated<C>>()
            .cloned()
            .ok_or(AppError::Unauthorized(AuthErrorKind::NoCredential))
    }
}

// `Option<Authenticated<C>>`: handlers shared by protected and skipped routes.
impl<S, C> OptionalFromRequestParts<S> for Authenticated<C>
where
    S: Send + Sync,
    C: Clone + Send + Sync + 'static,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Authenticated<C>>().cloned())
    }
}

impl<S> FromRequestParts<S> for AuthEntry
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthEntry>()
            .cloned()
            .ok_or(AppError::Internal)
    }
}
