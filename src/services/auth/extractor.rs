//! Token extraction: one `Extractor` per configured source, evaluated in order.

use thiserror::Error;
use tracing::debug;

use super::error::AuthError;
use super::lookup::Source;
use super::request::RequestLookup;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("missing or empty header")]
    MissingHeader,
    #[error("header does not match auth scheme")]
    SchemeMismatch,
    #[error("missing or empty query parameter")]
    MissingQuery,
    #[error("missing or empty path parameter")]
    MissingParam,
    #[error("missing cookie")]
    MissingCookie,
    #[error("missing or empty form field")]
    MissingForm,
}

/// Stateless extractor bound to one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extractor {
    source: Source,
}

impl Extractor {
    pub fn new(source: Source) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn extract<'r>(&self, req: &'r dyn RequestLookup) -> Result<&'r str, ExtractError> {
        match &self.source {
            Source::Header { name, scheme } => {
                let value = non_empty(req.header(name)).ok_or(ExtractError::MissingHeader)?;
                strip_scheme(value, scheme).ok_or(ExtractError::SchemeMismatch)
            }
            Source::Query(name) => non_empty(req.query(name)).ok_or(ExtractError::MissingQuery),
            Source::Param(name) => {
                non_empty(req.path_param(name)).ok_or(ExtractError::MissingParam)
            }
            // An empty cookie value still counts as present.
            Source::Cookie(name) => req.cookie(name).ok_or(ExtractError::MissingCookie),
            Source::Form(name) => non_empty(req.form_field(name)).ok_or(ExtractError::MissingForm),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// "<scheme> <token>" with exactly one separating space (case-sensitive).
fn strip_scheme<'v>(value: &'v str, scheme: &str) -> Option<&'v str> {
    if scheme.is_empty() {
        return Some(value);
    }
    let token = value.strip_prefix(scheme)?.strip_prefix(' ')?;
    if token.is_empty() || token.starts_with(' ') {
        return None;
    }
    Some(token)
}

/// Ordered extractors; the first success wins.
#[derive(Debug, Clone)]
pub struct ExtractorChain {
    extractors: Vec<Extractor>,
}

impl ExtractorChain {
    pub fn new(sources: impl IntoIterator<Item = Source>) -> Self {
        Self {
            extractors: sources.into_iter().map(Extractor::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.extractors.iter().map(Extractor::source)
    }

    pub fn needs_form(&self) -> bool {
        self.extractors.iter().any(|e| e.source().is_form())
    }

    pub fn extract<'r>(&self, req: &'r dyn RequestLookup) -> Result<&'r str, AuthError> {
        match self.walk(0, req, false) {
            Walk::Found(token) => Ok(token),
            Walk::NeedsForm(_) | Walk::Exhausted => Err(AuthError::NoCredential),
        }
    }

    /// Runs extractors from index `start` in order.
    ///
    /// With `defer_form` set, stops in front of the first form extractor so the
    /// caller can read the body only once the chain actually gets that far.
    pub fn walk<'r>(&self, start: usize, req: &'r dyn RequestLookup, defer_form: bool) -> Walk<'r> {
        for (at, extractor) in self.extractors.iter().enumerate().skip(start) {
            if defer_form && extractor.source().is_form() {
                return Walk::NeedsForm(at);
            }
            match extractor.extract(req) {
                Ok(token) => return Walk::Found(token),
                Err(err) => debug!(source = %extractor.source(), error = %err, "no token"),
            }
        }
        Walk::Exhausted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk<'r> {
    Found(&'r str),
    /// Stopped before the form extractor at this index.
    NeedsForm(usize),
    Exhausted,
}
