use std::collections::HashMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::error::ClaimsError;

/// Payload container populated by the verifier.
///
/// A fresh value is deserialized for every request; `validate` is the
/// self-check run after the signature has been verified.
pub trait Claims: DeserializeOwned + Clone + Send + Sync + 'static {
    /// `now` is seconds since the epoch; `leeway` widens every time bound.
    fn validate(&self, now: i64, leeway: u64) -> Result<(), ClaimsError>;
}

/// `aud` may be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, aud: &str) -> bool {
        match self {
            Self::Single(s) => s == aud,
            Self::Multiple(v) => v.iter().any(|s| s == aud),
        }
    }
}

/// Registered claims plus everything else the token carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims for StandardClaims {
    fn validate(&self, now: i64, leeway: u64) -> Result<(), ClaimsError> {
        let leeway = i64::try_from(leeway).unwrap_or(i64::MAX);

        if let Some(exp) = self.exp {
            if now > exp.saturating_add(leeway) {
                return Err(ClaimsError::Expired);
            }
        }
        if let Some(nbf) = self.nbf {
            if now.saturating_add(leeway) < nbf {
                return Err(ClaimsError::NotYetValid);
            }
        }
        if let Some(iat) = self.iat {
            if now.saturating_add(leeway) < iat {
                return Err(ClaimsError::IssuedInFuture);
            }
        }
        if self.sub.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ClaimsError::EmptyClaim("sub"));
        }
        Ok(())
    }
}
