/*
 * Responsibility
 * - JWT middleware の設定 (Option Set) を 1 度だけ組み立てる
 * - 組み立て後は immutable、Arc で全リクエストから共有
 * - key resolver / token parser は差し替え可能 (未指定ならデフォルト実装)
 */
use std::{collections::HashMap, fmt, sync::Arc};

use axum::{extract::OriginalUri, http::request::Parts};
use jsonwebtoken::{Algorithm, DecodingKey};
use thiserror::Error;

use super::claims::{Claims, StandardClaims};
use super::extractor::ExtractorChain;
use super::keys::{KeyResolver, StaticKeyResolver};
use super::lookup::{LookupError, parse_token_lookup};
use super::verifier::{JwtParser, TokenParser};

pub const DEFAULT_ENTRY_NAME: &str = "jwt-guard";
pub const DEFAULT_ENTRY_TYPE: &str = "jwt";
pub const DEFAULT_TOKEN_LOOKUP: &str = "header:Authorization";
pub const DEFAULT_AUTH_SCHEME: &str = "Bearer";

pub type Skipper = Arc<dyn Fn(&Parts) -> bool + Send + Sync>;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid token lookup: {0}")]
    Lookup(#[from] LookupError),
}

/// Immutable middleware configuration.
pub struct JwtOptions<C = StandardClaims> {
    entry_name: String,
    entry_type: String,
    skipper: Skipper,
    ignore_prefixes: Vec<String>,
    auth_scheme: String,
    algorithm: Algorithm,
    chain: ExtractorChain,
    parser: Arc<dyn TokenParser<C>>,
}

impl<C> fmt::Debug for JwtOptions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtOptions")
            .field("entry_name", &self.entry_name)
            .field("entry_type", &self.entry_type)
            .field("ignore_prefixes", &self.ignore_prefixes)
            .field("auth_scheme", &self.auth_scheme)
            .field("algorithm", &self.algorithm)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl<C: Claims> JwtOptions<C> {
    pub fn builder() -> JwtOptionsBuilder<C> {
        JwtOptionsBuilder::default()
    }
}

impl<C> JwtOptions<C> {
    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }

    pub fn entry_type(&self) -> &str {
        &self.entry_type
    }

    pub fn auth_scheme(&self) -> &str {
        &self.auth_scheme
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn chain(&self) -> &ExtractorChain {
        &self.chain
    }

    pub fn parser(&self) -> &dyn TokenParser<C> {
        self.parser.as_ref()
    }

    /// Ignore-prefix match on the original (un-nested) path, or the skipper.
    pub fn should_skip(&self, parts: &Parts) -> bool {
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |uri| uri.path());

        self.ignore_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
            || (self.skipper)(parts)
    }
}

pub struct JwtOptionsBuilder<C = StandardClaims> {
    entry_name: String,
    entry_type: String,
    skipper: Skipper,
    ignore_prefixes: Vec<String>,
    signing_key: Option<Arc<DecodingKey>>,
    signing_keys: HashMap<String, Arc<DecodingKey>>,
    algorithm: Algorithm,
    token_lookup: String,
    auth_scheme: String,
    leeway: u64,
    key_resolver: Option<Arc<dyn KeyResolver>>,
    parser: Option<Arc<dyn TokenParser<C>>>,
}

impl<C> Default for JwtOptionsBuilder<C> {
    fn default() -> Self {
        Self {
            entry_name: DEFAULT_ENTRY_NAME.to_string(),
            entry_type: DEFAULT_ENTRY_TYPE.to_string(),
            skipper: Arc::new(|_: &Parts| false),
            ignore_prefixes: Vec::new(),
            signing_key: None,
            signing_keys: HashMap::new(),
            algorithm: Algorithm::HS256,
            token_lookup: DEFAULT_TOKEN_LOOKUP.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            leeway: 0,
            key_resolver: None,
            parser: None,
        }
    }
}

impl<C: Claims> JwtOptionsBuilder<C> {
    pub fn entry_name_and_type(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.entry_name = name.into();
        self.entry_type = kind.into();
        self
    }

    pub fn skipper<F>(mut self, skipper: F) -> Self
    where
        F: Fn(&Parts) -> bool + Send + Sync + 'static,
    {
        self.skipper = Arc::new(skipper);
        self
    }

    /// Requests whose path starts with `prefix` bypass authentication.
    pub fn ignore_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.is_empty() {
            self.ignore_prefixes.push(prefix);
        }
        self
    }

    pub fn signing_key(mut self, key: DecodingKey) -> Self {
        self.signing_key = Some(Arc::new(key));
        self
    }

    /// Adds one `kid -> key` entry. Any entry switches resolution to kid mode.
    pub fn signing_keys(mut self, kid: impl Into<String>, key: DecodingKey) -> Self {
        self.signing_keys.insert(kid.into(), Arc::new(key));
        self
    }

    pub fn signing_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// `"header:Authorization,query:token,cookie:jwt"`; parsed by `build`.
    pub fn token_lookup(mut self, lookup: impl Into<String>) -> Self {
        self.token_lookup = lookup.into();
        self
    }

    pub fn auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.auth_scheme = scheme.into();
        self
    }

    pub fn leeway_seconds(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn key_resolver(mut self, resolver: Arc<dyn KeyResolver>) -> Self {
        self.key_resolver = Some(resolver);
        self
    }

    pub fn token_parser(mut self, parser: Arc<dyn TokenParser<C>>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Missing keys are not an error here; they fail at verification time.
    pub fn build(self) -> Result<JwtOptions<C>, OptionsError> {
        let sources = parse_token_lookup(&self.token_lookup, &self.auth_scheme)?;
        let chain = ExtractorChain::new(sources);

        let key_resolver: Arc<dyn KeyResolver> = match self.key_resolver {
            Some(resolver) => resolver,
            None => Arc::new(StaticKeyResolver::new(self.signing_key, self.signing_keys)),
        };
        let parser: Arc<dyn TokenParser<C>> = match self.parser {
            Some(parser) => parser,
            None => Arc::new(JwtParser::<C>::new(
                self.algorithm,
                Arc::clone(&key_resolver),
                self.leeway,
            )),
        };

        Ok(JwtOptions {
            entry_name: self.entry_name,
            entry_type: self.entry_type,
            skipper: self.skipper,
            ignore_prefixes: self.ignore_prefixes,
            auth_scheme: self.auth_scheme,
            algorithm: self.algorithm,
            chain,
            parser,
        })
    }
}
