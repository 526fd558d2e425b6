//! Token verification: raw token string -> validated claims.
//!
//! `JwtParser` runs, in order:
//! 1. envelope split (header / payload / signature)
//! 2. declared `alg` against the configured algorithm (no downgrade, no `none`)
//! 3. key resolution
//! 4. signature verification
//! 5. payload decode + `Claims::validate`
//!
//! A replacement `TokenParser` must honor the same sequence.

use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, Validation, errors::ErrorKind};
use serde::Deserialize;

use super::claims::Claims;
use super::error::AuthError;
use super::keys::KeyResolver;

#[async_trait]
pub trait TokenParser<C>: Send + Sync {
    async fn parse(&self, token: &str) -> Result<C, AuthError>;
}

pub struct JwtParser<C> {
    algorithm: Algorithm,
    leeway: u64,
    keys: Arc<dyn KeyResolver>,
    validation: Validation,
    _claims: PhantomData<fn() -> C>,
}

impl<C> std::fmt::Debug for JwtParser<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtParser")
            .field("algorithm", &self.algorithm)
            .field("leeway", &self.leeway)
            .finish()
    }
}

impl<C: Claims> JwtParser<C> {
    pub fn new(algorithm: Algorithm, keys: Arc<dyn KeyResolver>, leeway: u64) -> Self {
        // Signature + algorithm only. Temporal and structural checks belong
        // to `Claims::validate` so each failure has exactly one owner.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            algorithm,
            leeway,
            keys,
            validation,
            _claims: PhantomData,
        }
    }
}

#[async_trait]
impl<C: Claims> TokenParser<C> for JwtParser<C> {
    async fn parse(&self, token: &str) -> Result<C, AuthError> {
        // 1) envelope
        let mut segments = token.split('.');
        let header = match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(header), Some(_), Some(_), None) => header,
            _ => return Err(AuthError::Malformed("expected three segments".into())),
        };

        // 2) algorithm, read as a plain string so "none" and unknown names
        // are reported as a mismatch rather than a parse failure
        let declared = declared_algorithm(header)?;
        if declared.parse::<Algorithm>().ok() != Some(self.algorithm) {
            return Err(AuthError::AlgorithmMismatch {
                expected: self.algorithm,
                actual: declared,
            });
        }

        // 3) key
        let key = self.keys.resolve(token).await?;

        // 4) signature (+ payload decode)
        let data = jsonwebtoken::decode::<C>(token, &key, &self.validation).map_err(classify)?;

        // 5) claims self-check
        let now = chrono::Utc::now().timestamp();
        data.claims.validate(now, self.leeway)?;

        Ok(data.claims)
    }
}

#[derive(Deserialize)]
struct AlgOnly {
    alg: String,
}

fn declared_algorithm(header: &str) -> Result<String, AuthError> {
    let raw = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|e| AuthError::Malformed(format!("header: {e}")))?;
    let header: AlgOnly =
        serde_json::from_slice(&raw).map_err(|e| AuthError::Malformed(format!("header: {e}")))?;
    Ok(header.alg)
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        // InvalidAlgorithm here means the resolved key belongs to another family.
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        _ => AuthError::Malformed(err.to_string()),
    }
}
