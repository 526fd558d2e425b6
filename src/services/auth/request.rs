/*
 * Responsibility
 * - 抽出器から見える「リクエスト」の最小インターフェース (RequestLookup)
 * - axum の Parts / path params / cookie / form body から組み立てる RequestView
 */
use axum::http::{HeaderMap, request::Parts};
use axum_extra::extract::cookie::CookieJar;

/// Read-only lookups an extractor needs from the current request.
pub trait RequestLookup {
    fn header(&self, name: &str) -> Option<&str>;
    fn query(&self, name: &str) -> Option<&str>;
    fn path_param(&self, name: &str) -> Option<&str>;
    fn cookie(&self, name: &str) -> Option<&str>;
    fn form_field(&self, name: &str) -> Option<&str>;
}

/// Snapshot of the credential-bearing parts of one request.
#[derive(Debug, Clone, Default)]
pub struct RequestView {
    headers: HeaderMap,
    query: Vec<(String, String)>,
    params: Vec<(String, String)>,
    cookies: CookieJar,
    form: Vec<(String, String)>,
}

impl RequestView {
    pub fn from_parts(parts: &Parts) -> Self {
        let query = parts
            .uri
            .query()
            .map(|q| pairs(q.as_bytes()))
            .unwrap_or_default();

        Self {
            cookies: CookieJar::from_headers(&parts.headers),
            headers: parts.headers.clone(),
            query,
            ..Self::default()
        }
    }

    pub fn with_path_params<'a>(mut self, params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.params = params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    /// `application/x-www-form-urlencoded` body.
    pub fn with_form_body(mut self, body: &[u8]) -> Self {
        self.form = pairs(body);
        self
    }
}

fn pairs(input: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(input).into_owned().collect()
}

// Like url.Values.Get: first value wins.
fn first<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

impl RequestLookup for RequestView {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn query(&self, name: &str) -> Option<&str> {
        first(&self.query, name)
    }

    fn path_param(&self, name: &str) -> Option<&str> {
        first(&self.params, name)
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|c| c.value())
    }

    fn form_field(&self, name: &str) -> Option<&str> {
        first(&self.form, name)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    #[test]
    fn reads_every_location() {
        let (parts, ()) = Request::builder()
            .uri("/items/abc?token=q%20v&token=second")
            .header("x-token", "Bearer h")
            .header("cookie", "session=c1; jwt=c2")
            .body(())
            .unwrap()
            .into_parts();

        let view = RequestView::from_parts(&parts)
            .with_path_params([("id", "abc")])
            .with_form_body(b"jwt=f+v&other=1");

        assert_eq!(view.header("X-Token"), Some("Bearer h"));
        assert_eq!(view.query("token"), Some("q v"));
        assert_eq!(view.path_param("id"), Some("abc"));
        assert_eq!(view.cookie("jwt"), Some("c2"));
        assert_eq!(view.form_field("jwt"), Some("f v"));

        assert_eq!(view.header("missing"), None);
        assert_eq!(view.path_param("missing"), None);
        assert_eq!(view.cookie("missing"), None);
    }
}
