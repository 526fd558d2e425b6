//! JWT 認証 middleware: 抽出 → 検証 → Authenticated<C> を extensions に入れる
//!
//! Per request:
//! - `AuthEntry` (entry name/type) is always attached for log correlation.
//! - skip predicate / ignore prefix → downstream without claims.
//! - extractor chain → token parser → `Authenticated<C>` → downstream.
//! - any failure → 401, downstream is not invoked.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::{header, request::Parts},
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, warn};

use crate::api::v1::extractors::{AuthEntry, Authenticated};
use crate::error::AppError;
use crate::services::auth::claims::Claims;
use crate::services::auth::error::{AuthError, AuthErrorKind};
use crate::services::auth::extractor::Walk;
use crate::services::auth::options::JwtOptions;
use crate::services::auth::request::RequestView;
use crate::services::auth::verifier::TokenParser;

// Same bound as the global RequestBodyLimitLayer.
const FORM_BODY_LIMIT: usize = 1024 * 1024;

/// Router に JWT 認証を掛ける。
///
/// `route_layer` で適用するので、router が bind した path parameter も参照できる。
///
/// 例：
/// ```ignore
/// let options = services::auth::build_jwt_options(&config)?;
/// let v1 = middleware::auth::access::apply(api::v1::routes(), options);
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply<S, C>(router: Router<S>, options: Arc<JwtOptions<C>>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    C: Claims,
{
    router.route_layer(middleware::from_fn_with_state(options, jwt_middleware::<C>))
}

async fn jwt_middleware<C: Claims>(
    State(options): State<Arc<JwtOptions<C>>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();
    parts
        .extensions
        .insert(AuthEntry::new(options.entry_name(), options.entry_type()));

    if options.should_skip(&parts) {
        debug!(entry = %options.entry_name(), path = %parts.uri.path(), "jwt authentication skipped");
        return Ok(next.run(Request::from_parts(parts, body)).await);
    }

    let (claims, body) = match authenticate(options.as_ref(), &mut parts, body).await {
        Ok(v) => v,
        Err(err) => return Err(reject(options.as_ref(), &err)),
    };

    // middleware → extractor への受け渡し
    parts.extensions.insert(Authenticated(claims));

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Chain extraction followed by token verification; at most once each.
///
/// The form body is read only when the chain reaches a form source. The body
/// handed back is the one downstream should receive.
pub async fn authenticate<C: Claims>(
    options: &JwtOptions<C>,
    parts: &mut Parts,
    body: Body,
) -> Result<(C, Body), AuthError> {
    let chain = options.chain();
    let mut view = request_view(parts).await;
    let defer_form = chain.needs_form() && is_form_urlencoded(parts);

    let resume_at = match chain.walk(0, &view, defer_form) {
        Walk::Found(token) => return Ok((options.parser().parse(token).await?, body)),
        Walk::Exhausted => return Err(AuthError::NoCredential),
        Walk::NeedsForm(at) => at,
    };

    // Buffer the form so it can be read here and still reach the handler.
    let (resume_at, body) = match axum::body::to_bytes(body, FORM_BODY_LIMIT).await {
        Ok(bytes) => {
            view = view.with_form_body(&bytes);
            (resume_at, Body::from(bytes))
        }
        Err(e) => {
            // Only this extractor fails; later sources still get their turn.
            debug!(error = %e, "failed to read form body");
            (resume_at + 1, Body::empty())
        }
    };

    let token = match chain.walk(resume_at, &view, false) {
        Walk::Found(token) => token,
        Walk::NeedsForm(_) | Walk::Exhausted => return Err(AuthError::NoCredential),
    };
    let claims = options.parser().parse(token).await?;
    Ok((claims, body))
}

async fn request_view(parts: &mut Parts) -> RequestView {
    // Only populated when the middleware runs as a route layer.
    let params = RawPathParams::from_request_parts(parts, &()).await.ok();

    let view = RequestView::from_parts(parts);
    match &params {
        Some(params) => view.with_path_params(params.iter()),
        None => view,
    }
}

fn is_form_urlencoded(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

fn reject<C>(options: &JwtOptions<C>, err: &AuthError) -> AppError {
    let kind: AuthErrorKind = err.kind();
    warn!(
        entry = %options.entry_name(),
        kind = kind.as_str(),
        error = %err,
        "jwt authentication failed"
    );
    AppError::Unauthorized(kind)
}
