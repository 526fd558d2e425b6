//! Failure taxonomy for token authentication.
//!
//! Every failure is terminal for the request. The HTTP layer collapses them
//! into one generic 401 body, but the distinct kinds stay available here for
//! logs and tests.

use jsonwebtoken::Algorithm;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credential found in any configured source")]
    NoCredential,

    #[error("malformed token: {0}")]
    Malformed(String),

    // `actual` is the raw header value; "none" and unknown names land here too.
    #[error("algorithm mismatch: expected {expected:?}, token declares {actual:?}")]
    AlgorithmMismatch {
        expected: Algorithm,
        actual: String,
    },

    #[error("key resolution failed: {0}")]
    KeyResolution(#[from] KeyError),

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("invalid claims: {0}")]
    InvalidClaims(#[from] ClaimsError),
}

/// Machine-readable failure kind (for logs / metrics labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    NoCredential,
    MalformedToken,
    AlgorithmMismatch,
    KeyResolution,
    InvalidSignature,
    InvalidClaims,
}

impl AuthErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoCredential => "no_credential",
            Self::MalformedToken => "malformed_token",
            Self::AlgorithmMismatch => "algorithm_mismatch",
            Self::KeyResolution => "key_resolution",
            Self::InvalidSignature => "invalid_signature",
            Self::InvalidClaims => "invalid_claims",
        }
    }
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::NoCredential => AuthErrorKind::NoCredential,
            Self::Malformed(_) => AuthErrorKind::MalformedToken,
            Self::AlgorithmMismatch { .. } => AuthErrorKind::AlgorithmMismatch,
            Self::KeyResolution(_) => AuthErrorKind::KeyResolution,
            Self::InvalidSignature => AuthErrorKind::InvalidSignature,
            Self::InvalidClaims(_) => AuthErrorKind::InvalidClaims,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("no signing key configured")]
    NoKeyConfigured,

    #[error("token header has no 'kid'")]
    MissingKid,

    #[error("unknown kid: {0}")]
    UnknownKid(String),

    // Override strategies (remote key sets etc.) report their own failures here.
    #[error("key unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    #[error("token is expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("token used before issued")]
    IssuedInFuture,

    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
}
