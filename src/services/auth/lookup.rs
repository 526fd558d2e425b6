/*
 * Responsibility
 * - トークンの探索場所 (Source) の定義
 * - "header:Authorization,query:token" 形式のパース
 */
use std::fmt;

use thiserror::Error;

/// One place in a request where a token may live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// `<scheme> <token>` in the named header. An empty scheme takes the raw value.
    Header { name: String, scheme: String },
    Query(String),
    Param(String),
    Cookie(String),
    Form(String),
}

impl Source {
    pub fn header(name: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::Header {
            name: name.into(),
            scheme: scheme.into(),
        }
    }

    pub fn is_form(&self) -> bool {
        matches!(self, Self::Form(_))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header { name, .. } => write!(f, "header:{name}"),
            Self::Query(name) => write!(f, "query:{name}"),
            Self::Param(name) => write!(f, "param:{name}"),
            Self::Cookie(name) => write!(f, "cookie:{name}"),
            Self::Form(name) => write!(f, "form:{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("token lookup is empty")]
    Empty,
    #[error("lookup entry '{0}' is not in <source>:<name> form")]
    InvalidEntry(String),
    #[error("unknown lookup source '{0}'")]
    UnknownSource(String),
    #[error("lookup entry '{0}' has an empty name")]
    EmptyName(String),
}

/// Parse a comma separated lookup list.
///
/// `default_scheme` applies to header entries that do not name their own
/// scheme (`header:X-Token:Token` overrides it for that entry only).
pub fn parse_token_lookup(spec: &str, default_scheme: &str) -> Result<Vec<Source>, LookupError> {
    let sources = spec
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_entry(entry, default_scheme))
        .collect::<Result<Vec<_>, _>>()?;

    if sources.is_empty() {
        return Err(LookupError::Empty);
    }
    Ok(sources)
}

fn parse_entry(entry: &str, default_scheme: &str) -> Result<Source, LookupError> {
    let (tag, rest) = entry
        .split_once(':')
        .ok_or_else(|| LookupError::InvalidEntry(entry.to_string()))?;

    let (name, scheme) = match rest.split_once(':') {
        Some((name, scheme)) => (name.trim(), Some(scheme)),
        None => (rest.trim(), None),
    };
    if name.is_empty() {
        return Err(LookupError::EmptyName(entry.to_string()));
    }

    let name = name.to_string();
    let source = match tag.trim() {
        "header" => Source::Header {
            name,
            scheme: scheme.unwrap_or(default_scheme).to_string(),
        },
        // Only headers carry a scheme.
        _ if scheme.is_some() => return Err(LookupError::InvalidEntry(entry.to_string())),
        "query" => Source::Query(name),
        "param" => Source::Param(name),
        "cookie" => Source::Cookie(name),
        "form" => Source::Form(name),
        other => return Err(LookupError::UnknownSource(other.to_string())),
    };
    Ok(source)
}
