//! JWT middleware integration tests
//!
//! Drives a real axum Router through the middleware with `oneshot`.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use axum::{
    Form, Json, Router,
    body::Body,
    extract::Request,
    http::{StatusCode, header},
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::{Value, json};
use tower::ServiceExt;

use jwt_guard::api::v1::extractors::{AuthEntry, Authenticated};
use jwt_guard::middleware;
use jwt_guard::services::auth::{
    AuthError, JwtOptions, JwtOptionsBuilder, StandardClaims, TokenParser,
};

const SECRET: &[u8] = b"ut-signing-key";

fn mint(sub: &str) -> String {
    mint_with(Header::new(Algorithm::HS256), SECRET, sub)
}

fn mint_with(header: Header, secret: &[u8], sub: &str) -> String {
    let exp = chrono::Utc::now().timestamp() + 3600;
    jsonwebtoken::encode(
        &header,
        &json!({"sub": sub, "exp": exp}),
        &EncodingKey::from_secret(secret),
    )
    .unwrap()
}

fn options() -> JwtOptionsBuilder<StandardClaims> {
    JwtOptions::<StandardClaims>::builder()
        .entry_name_and_type("ut-entry", "ut-type")
        .signing_key(DecodingKey::from_secret(SECRET))
}

async fn echo(claims: Option<Authenticated<StandardClaims>>, entry: AuthEntry) -> Json<Value> {
    Json(json!({
        "sub": claims.and_then(|c| c.into_inner().sub),
        "entry": entry.name,
    }))
}

async fn form_echo(
    Authenticated(claims): Authenticated<StandardClaims>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    Json(json!({"sub": claims.sub, "note": form.get("note")}))
}

fn app(options: JwtOptionsBuilder<StandardClaims>) -> Router {
    let router = Router::new()
        .route("/health", get(echo))
        .route("/items/{item}", get(echo).post(echo))
        .route("/notes", post(form_echo));

    middleware::auth::apply(router, Arc::new(options.build().unwrap()))
}

async fn send(app: Router, req: Request) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get_with_bearer(uri: &str, value: &str) -> Request {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, value)
        .body(Body::empty())
        .unwrap()
}

/// Every source populated with a distinct token; the first configured one wins.
#[tokio::test]
async fn test_first_configured_source_wins() {
    let cases = [
        ("header:Authorization,query:token,param:item,cookie:jwt,form:jwt", "from-header"),
        ("query:token,header:Authorization,param:item,cookie:jwt,form:jwt", "from-query"),
        ("param:item,cookie:jwt,form:jwt,header:Authorization,query:token", "from-param"),
        ("cookie:jwt,form:jwt,param:item,query:token,header:Authorization", "from-cookie"),
        ("form:jwt,cookie:jwt,param:item,query:token,header:Authorization", "from-form"),
    ];

    for (lookup, expected) in cases {
        let uri = format!("/items/{}?token={}", mint("from-param"), mint("from-query"));
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", mint("from-header")))
            .header(header::COOKIE, format!("jwt={}", mint("from-cookie")))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("jwt={}", mint("from-form"))))
            .unwrap();

        let (status, body) = send(app(options().token_lookup(lookup)), req).await;
        assert_eq!(status, StatusCode::OK, "lookup {lookup}");
        assert_eq!(body["sub"], expected, "lookup {lookup}");
    }
}

#[tokio::test]
async fn test_header_scheme_must_match_exactly() {
    let token = mint("u1");

    let (status, body) = send(app(options()), get_with_bearer("/items/1", &format!("Bearer {token}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sub"], "u1");
    assert_eq!(body["entry"], "ut-entry");

    for value in [format!("Bearer  {token}"), format!("Basic {token}"), format!("bearer {token}")] {
        let (status, body) = send(app(options()), get_with_bearer("/items/1", &value)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {value:?}");
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_custom_scheme() {
    let token = mint("u1");
    let opts = || options().token_lookup("header:X-Api-Token").auth_scheme("Token");

    let req = Request::builder()
        .uri("/items/1")
        .header("x-api-token", format!("Token {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(opts()), req).await;
    assert_eq!(status, StatusCode::OK);

    let req = Request::builder()
        .uri("/items/1")
        .header("x-api-token", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(opts()), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_credential_is_rejected_without_calling_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let router = Router::new().route(
        "/items/{item}",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "reached"
            }
        }),
    );
    let app = middleware::auth::apply(router, Arc::new(options().build().unwrap()));

    let resp = app
        .oneshot(Request::builder().uri("/items/1").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_skip_bypasses_authentication() {
    let opts = options().skipper(|parts| parts.uri.path() == "/health");

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(opts), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sub"], Value::Null);
    assert_eq!(body["entry"], "ut-entry");

    // Even a valid token is ignored on a skipped route.
    let opts = options().ignore_prefix("/health");
    let (status, body) = send(app(opts), get_with_bearer("/health", &format!("Bearer {}", mint("u1")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sub"], Value::Null);
}

#[tokio::test]
async fn test_algorithm_mismatch_is_rejected() {
    // Valid HS384 signature over the configured secret.
    let token = mint_with(Header::new(Algorithm::HS384), SECRET, "u1");
    let (status, _) = send(app(options()), get_with_bearer("/items/1", &format!("Bearer {token}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        app(options().signing_algorithm(Algorithm::HS384)),
        get_with_bearer("/items/1", &format!("Bearer {token}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unsigned_token_is_rejected() {
    let head = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"attacker"}"#);
    let token = format!("{head}.{payload}.");

    let (status, _) = send(app(options()), get_with_bearer("/items/1", &format!("Bearer {token}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_keyed_mode() {
    let opts = || {
        JwtOptions::<StandardClaims>::builder()
            .signing_keys("k1", DecodingKey::from_secret(b"key-one"))
            .signing_keys("k2", DecodingKey::from_secret(b"key-two"))
    };
    let with_kid = |kid: Option<&str>, secret: &[u8]| {
        let mut jwt_header = Header::new(Algorithm::HS256);
        jwt_header.kid = kid.map(str::to_string);
        format!("Bearer {}", mint_with(jwt_header, secret, "u1"))
    };

    let (status, body) = send(app(opts()), get_with_bearer("/items/1", &with_kid(Some("k2"), b"key-two"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sub"], "u1");

    for value in [
        with_kid(Some("k3"), b"key-two"),
        with_kid(None, b"key-two"),
        with_kid(Some("k1"), b"key-two"),
    ] {
        let (status, _) = send(app(opts()), get_with_bearer("/items/1", &value)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_form_body_still_reaches_handler() {
    let req = Request::builder()
        .method("POST")
        .uri("/notes")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("note=hello&jwt={}", mint("u-form"))))
        .unwrap();

    let (status, body) = send(app(options().token_lookup("form:jwt")), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sub"], "u-form");
    assert_eq!(body["note"], "hello");
}

fn oversized_form(extra: &str) -> Body {
    // Over the 1 MiB form buffer limit.
    Body::from(format!("{extra}pad={}", "x".repeat(2 * 1024 * 1024)))
}

#[tokio::test]
async fn test_oversized_form_does_not_block_earlier_header() {
    let req = Request::builder()
        .method("POST")
        .uri("/items/1")
        .header(header::AUTHORIZATION, format!("Bearer {}", mint("u-header")))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(oversized_form(""))
        .unwrap();

    let opts = options().token_lookup("header:Authorization,form:jwt");
    let (status, body) = send(app(opts), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sub"], "u-header");
}

#[tokio::test]
async fn test_unreadable_form_falls_through_to_later_sources() {
    let req = Request::builder()
        .method("POST")
        .uri("/items/1")
        .header(header::AUTHORIZATION, format!("Bearer {}", mint("u-header")))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(oversized_form(&format!("jwt={}&", mint("u-form"))))
        .unwrap();

    let opts = options().token_lookup("form:jwt,header:Authorization");
    let (status, body) = send(app(opts), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sub"], "u-header");

    let req = Request::builder()
        .method("POST")
        .uri("/items/1")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(oversized_form(&format!("jwt={}&", mint("u-form"))))
        .unwrap();
    let (status, _) = send(app(options().token_lookup("form:jwt")), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

struct OpaqueParser;

#[async_trait]
impl TokenParser<StandardClaims> for OpaqueParser {
    async fn parse(&self, token: &str) -> Result<StandardClaims, AuthError> {
        match token {
            "opaque-ok" => Ok(StandardClaims {
                sub: Some("opaque-user".into()),
                ..StandardClaims::default()
            }),
            _ => Err(AuthError::InvalidSignature),
        }
    }
}

#[tokio::test]
async fn test_parser_override() {
    let opts = || options().token_parser(Arc::new(OpaqueParser));

    let (status, body) = send(app(opts()), get_with_bearer("/items/1", "Bearer opaque-ok")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sub"], "opaque-user");

    let (status, _) = send(app(opts()), get_with_bearer("/items/1", &format!("Bearer {}", mint("u1")))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
