/// Factory: build `JwtOptions` from application `Config`.
use std::sync::Arc;

use tracing::warn;

use crate::config::{Config, ConfigError};
use crate::error::AppError;
use crate::services::auth::claims::StandardClaims;
use crate::services::auth::keys::decoding_key;
use crate::services::auth::options::JwtOptions;

pub fn build_jwt_options(config: &Config) -> Result<Arc<JwtOptions<StandardClaims>>, AppError> {
    let algorithm = config.signing_algorithm;

    let mut builder = JwtOptions::<StandardClaims>::builder()
        .entry_name_and_type(&config.entry_name, &config.entry_type)
        .token_lookup(&config.token_lookup)
        .auth_scheme(&config.auth_scheme)
        .signing_algorithm(algorithm)
        .leeway_seconds(config.leeway_seconds)
        // 疎通確認用 endpoint は常に公開 (nest 配下なので path は "/health")
        .skipper(|parts| parts.uri.path() == "/health");

    for prefix in &config.ignore_prefixes {
        builder = builder.ignore_prefix(prefix);
    }

    if let Some(material) = &config.signing_key {
        let key = decoding_key(algorithm, material).map_err(|e| {
            warn!(error = %e, ?algorithm, "failed to parse JWT_SIGNING_KEY");
            ConfigError::Invalid("JWT_SIGNING_KEY")
        })?;
        builder = builder.signing_key(key);
    }

    for (kid, material) in &config.signing_keys {
        let key = decoding_key(algorithm, material).map_err(|e| {
            warn!(error = %e, kid = %kid, ?algorithm, "failed to parse JWT_SIGNING_KEYS entry");
            ConfigError::Invalid("JWT_SIGNING_KEYS")
        })?;
        builder = builder.signing_keys(kid, key);
    }

    if config.signing_key.is_none() && config.signing_keys.is_empty() {
        // Not fatal: every token will fail key resolution until keys are provided.
        warn!(entry = %config.entry_name, "no JWT signing key configured");
    }

    Ok(Arc::new(builder.build()?))
}
