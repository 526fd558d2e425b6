/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の抽出・検証ロジックは middleware/services 側の責務
 */

/// Verified claims for the current request.
///
/// Present only when the JWT middleware authenticated the request; skipped
/// requests carry no `Authenticated` value.
#[derive(Debug, Clone)]
pub struct Authenticated<C>(pub C);

impl<C> Authenticated<C> {
    pub fn claims(&self) -> &C {
        &self.0
    }

    pub fn into_inner(self) -> C {
        self.0
    }
}

/// Entry labels of the middleware that handled the request (ログ相関用).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEntry {
    pub name: String,
    pub kind: String,
}

impl AuthEntry {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}
