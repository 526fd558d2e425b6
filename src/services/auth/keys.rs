//! Key resolution for token verification.
//!
//! The default resolver works purely from static configuration and the
//! token's unverified header. Callers may swap in their own `KeyResolver`
//! (e.g. one backed by a remote key set); it is then responsible for its own
//! timeouts.

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey};

use super::error::KeyError;

#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// Resolve the verification key for `token` (raw, still unverified).
    async fn resolve(&self, token: &str) -> Result<Arc<DecodingKey>, KeyError>;
}

/// Single key, or a `kid -> key` map.
///
/// When the map is non-empty it takes precedence and the single key is never
/// consulted.
#[derive(Clone, Default)]
pub struct StaticKeyResolver {
    single: Option<Arc<DecodingKey>>,
    keyed: HashMap<String, Arc<DecodingKey>>,
}

impl fmt::Debug for StaticKeyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        let mut kids: Vec<_> = self.keyed.keys().collect();
        kids.sort();
        f.debug_struct("StaticKeyResolver")
            .field("single", &self.single.is_some())
            .field("kids", &kids)
            .finish()
    }
}

impl StaticKeyResolver {
    pub fn new(
        single: Option<Arc<DecodingKey>>,
        keyed: HashMap<String, Arc<DecodingKey>>,
    ) -> Self {
        Self { single, keyed }
    }

    pub fn is_keyed(&self) -> bool {
        !self.keyed.is_empty()
    }

    fn resolve_sync(&self, token: &str) -> Result<Arc<DecodingKey>, KeyError> {
        if self.is_keyed() {
            // Header is decoded only to read `kid`; nothing is trusted yet.
            let kid = jsonwebtoken::decode_header(token)
                .ok()
                .and_then(|h| h.kid)
                .filter(|kid| !kid.is_empty())
                .ok_or(KeyError::MissingKid)?;

            return self
                .keyed
                .get(&kid)
                .cloned()
                .ok_or(KeyError::UnknownKid(kid));
        }

        self.single.clone().ok_or(KeyError::NoKeyConfigured)
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve(&self, token: &str) -> Result<Arc<DecodingKey>, KeyError> {
        self.resolve_sync(token)
    }
}

/// Build a `DecodingKey` from configured key text.
///
/// HMAC algorithms take the text as the raw secret; the asymmetric families
/// expect a PEM encoded public key (or certificate, for RSA/EC).
pub fn decoding_key(
    algorithm: Algorithm,
    material: &str,
) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Ok(DecodingKey::from_secret(material.as_bytes()))
        }
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => DecodingKey::from_rsa_pem(material.as_bytes()),
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(material.as_bytes()),
        Algorithm::EdDSA => DecodingKey::from_ed_pem(material.as_bytes()),
    }
}
