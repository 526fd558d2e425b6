/*
 * Responsibility
 * - 環境変数からの設定読み込み (PORT, JWT_* など)
 * - 設定値のバリデーション (不正なら起動失敗)
 */
use std::net::SocketAddr;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;

use crate::services::auth::options::{
    DEFAULT_AUTH_SCHEME, DEFAULT_ENTRY_NAME, DEFAULT_ENTRY_TYPE, DEFAULT_TOKEN_LOOKUP,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

pub struct Config {
    pub addr: SocketAddr,

    pub entry_name: String,
    pub entry_type: String,

    pub token_lookup: String,
    pub auth_scheme: String,
    pub signing_algorithm: Algorithm,
    // Raw key material (secret for HS*, PEM otherwise). Never logged.
    pub signing_key: Option<String>,
    pub signing_keys: Vec<(String, String)>,
    pub ignore_prefixes: Vec<String>,
    pub leeway_seconds: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kids: Vec<&str> = self.signing_keys.iter().map(|(kid, _)| kid.as_str()).collect();
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("entry_name", &self.entry_name)
            .field("entry_type", &self.entry_type)
            .field("token_lookup", &self.token_lookup)
            .field("auth_scheme", &self.auth_scheme)
            .field("signing_algorithm", &self.signing_algorithm)
            .field("signing_key", &self.signing_key.is_some())
            .field("signing_kids", &kids)
            .field("ignore_prefixes", &self.ignore_prefixes)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `get` (tests pass a map).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let entry_name = get("JWT_ENTRY_NAME").unwrap_or_else(|| DEFAULT_ENTRY_NAME.to_string());
        let entry_type = get("JWT_ENTRY_TYPE").unwrap_or_else(|| DEFAULT_ENTRY_TYPE.to_string());

        let token_lookup =
            get("JWT_TOKEN_LOOKUP").unwrap_or_else(|| DEFAULT_TOKEN_LOOKUP.to_string());
        let auth_scheme = get("JWT_AUTH_SCHEME").unwrap_or_else(|| DEFAULT_AUTH_SCHEME.to_string());

        let signing_algorithm = match get("JWT_SIGNING_ALGORITHM") {
            Some(v) => Algorithm::from_str(v.trim())
                .map_err(|_| ConfigError::Invalid("JWT_SIGNING_ALGORITHM"))?,
            None => Algorithm::HS256,
        };

        let signing_key = get("JWT_SIGNING_KEY")
            .filter(|v| !v.is_empty())
            .map(|v| unescape_newlines(&v));

        let signing_keys = match get("JWT_SIGNING_KEYS") {
            Some(v) => parse_keyed(&v)?,
            None => Vec::new(),
        };

        let ignore_prefixes = get("JWT_IGNORE_PREFIX")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let leeway_seconds = match get("JWT_LEEWAY_SECONDS") {
            Some(v) => v
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("JWT_LEEWAY_SECONDS"))?,
            None => 0,
        };

        Ok(Self {
            addr,
            entry_name,
            entry_type,
            token_lookup,
            auth_scheme,
            signing_algorithm,
            signing_key,
            signing_keys,
            ignore_prefixes,
            leeway_seconds,
        })
    }
}

// PEM in a single env var: "-----BEGIN PUBLIC KEY-----\nMIIB..."
fn unescape_newlines(v: &str) -> String {
    v.replace("\\n", "\n")
}

// "kid1:material1,kid2:material2"
fn parse_keyed(v: &str) -> Result<Vec<(String, String)>, ConfigError> {
    v.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (kid, material) = entry
                .split_once(':')
                .ok_or(ConfigError::Invalid("JWT_SIGNING_KEYS"))?;
            let kid = kid.trim();
            if kid.is_empty() || material.is_empty() {
                return Err(ConfigError::Invalid("JWT_SIGNING_KEYS"));
            }
            Ok((kid.to_string(), unescape_newlines(material)))
        })
        .collect()
}
