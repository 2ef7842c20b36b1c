//! Credential rotation for a provider that has several API keys.
//!
//! [`RotationController`] owns an ordered list of [`Credential`]s and a
//! [`RotationCursor`] into it. A fetch starts at the cursor and walks forward
//! one key per failure until a request succeeds or the list runs out.
//!
//! # Rules
//!
//! - A transport failure, a non-success status, or an undecodable body moves
//!   the cursor to the next key.
//! - A success ends the walk, even if it contains zero articles.
//! - There is no delay between attempts, and at most one attempt per key.
//! - The cursor is kept between calls. A key that worked stays selected for
//!   the next page, and an exhausted list stays exhausted until [`reset`].
//!
//! [`reset`]: RotationController::reset

use crate::api::HttpTransport;
use crate::error::{ExhaustedError, FetchError};
use crate::models::{Article, Credential, PageQuery};
use crate::providers::{NewsProvider, fetch_page};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Index of the next credential to try.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationCursor(usize);

impl RotationCursor {
    #[cfg(test)]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A successful rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationOutcome {
    pub articles: Vec<Article>,
    /// Requests issued by this call, including the successful one.
    pub attempts: usize,
    /// Index of the credential that succeeded.
    pub credential_index: usize,
}

/// Sequences through a provider's credentials until one works.
#[derive(Debug)]
pub struct RotationController<P> {
    provider: P,
    credentials: Vec<Credential>,
    cursor: RotationCursor,
}

impl<P> RotationController<P>
where
    P: NewsProvider,
{
    pub fn new(provider: P, credentials: Vec<Credential>) -> Self {
        Self {
            provider,
            credentials,
            cursor: RotationCursor::default(),
        }
    }

    #[cfg(test)]
    pub fn cursor(&self) -> RotationCursor {
        self.cursor
    }

    #[cfg(test)]
    pub fn is_exhausted(&self) -> bool {
        self.cursor.0 >= self.credentials.len()
    }

    /// Start the next rotation from the first credential again.
    pub fn reset(&mut self) {
        if self.cursor.0 != 0 {
            info!(provider = self.provider.name(), "Resetting credential rotation");
        }
        self.cursor = RotationCursor::default();
    }

    /// Fetch `query`, rotating credentials on failure.
    ///
    /// Takes `&mut self`, so two rotations over the same controller can never
    /// interleave their cursor advances.
    ///
    /// # Errors
    ///
    /// [`ExhaustedError`] once the cursor has moved past the last credential.
    /// `attempts` is the number of requests this call made, which is zero if
    /// the controller was already exhausted.
    #[instrument(level = "info", skip_all, fields(provider = self.provider.name(), page = query.page, category = %query.category))]
    pub async fn fetch_with_rotation<T>(
        &mut self,
        transport: &T,
        query: &PageQuery,
    ) -> Result<RotationOutcome, ExhaustedError>
    where
        T: HttpTransport,
    {
        let t0 = Instant::now();
        let mut attempts = 0usize;
        let mut last: Option<FetchError> = None;

        while let Some(credential) = self.credentials.get(self.cursor.0) {
            attempts += 1;
            let key_number = self.cursor.0 + 1;

            match fetch_page(transport, &self.provider, query, credential).await {
                Ok(articles) => {
                    info!(
                        key = key_number,
                        attempts,
                        count = articles.len(),
                        elapsed_ms = t0.elapsed().as_millis(),
                        "Rotation succeeded"
                    );
                    return Ok(RotationOutcome {
                        articles,
                        attempts,
                        credential_index: self.cursor.0,
                    });
                }
                Err(e) => {
                    warn!(
                        key = key_number,
                        total = self.credentials.len(),
                        error = %e,
                        "API key failed; trying next key"
                    );
                    last = Some(e);
                    self.cursor.0 += 1;
                }
            }
        }

        error!(
            attempts,
            total = self.credentials.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "All API keys exhausted"
        );
        Err(ExhaustedError {
            provider: self.provider.name(),
            attempts,
            last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{Reply, ScriptedTransport};
    use crate::models::Category;
    use crate::providers::NewsApi;
    use serde_json::json;

    const HOST: &str = "newsapi.org";

    fn controller(n: usize) -> RotationController<NewsApi> {
        let provider = NewsApi::new("https://newsapi.org/v2/top-headlines", "us").unwrap();
        let keys = (1..=n).map(|i| Credential::new(format!("key-{i}"))).collect();
        RotationController::new(provider, keys)
    }

    fn one_article() -> Reply {
        Reply::ok_json(json!({"status": "ok", "articles": [{"title": "Lead story"}]}))
    }

    fn keys_used(transport: &ScriptedTransport) -> Vec<String> {
        transport
            .requests_to(HOST)
            .iter()
            .map(|r| {
                r.url
                    .query_pairs()
                    .find(|(k, _)| k == "apiKey")
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_default()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_first_k_failures_then_success_takes_k_plus_one_attempts() {
        for k in 0..4 {
            let mut failures: Vec<Reply> = (0..k)
                .map(|i| {
                    if i % 2 == 0 {
                        Reply::Fail("connection reset".into())
                    } else {
                        Reply::Status(429, r#"{"code":"rateLimited"}"#.into())
                    }
                })
                .collect();
            failures.push(one_article());
            let transport = ScriptedTransport::new().on(HOST, failures);
            let mut rotation = controller(5);

            let outcome = rotation
                .fetch_with_rotation(&transport, &PageQuery::new(Category::Technology, 1))
                .await
                .unwrap();

            assert_eq!(outcome.attempts, k + 1);
            assert_eq!(outcome.credential_index, k);
            assert_eq!(outcome.articles.len(), 1);
            assert_eq!(transport.requests().len(), k + 1);
            let expected: Vec<String> = (1..=k + 1).map(|i| format!("key-{i}")).collect();
            assert_eq!(keys_used(&transport), expected);
        }
    }

    #[tokio::test]
    async fn test_all_failures_exhaust_after_n_attempts() {
        let transport = ScriptedTransport::new().on(
            HOST,
            [
                Reply::Status(401, "apiKeyInvalid".into()),
                Reply::Fail("dns".into()),
                Reply::Status(500, "oops".into()),
            ],
        );
        let mut rotation = controller(3);

        let err = rotation
            .fetch_with_rotation(&transport, &PageQuery::new(Category::All, 1))
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 3);
        assert_eq!(err.provider, "NewsAPI");
        assert!(matches!(err.last, Some(FetchError::Provider { status: 500, .. })));
        assert_eq!(transport.requests().len(), 3);
        assert!(rotation.is_exhausted());
    }

    #[tokio::test]
    async fn test_empty_success_stops_rotation() {
        let transport = ScriptedTransport::new().on(
            HOST,
            [Reply::ok_json(json!({"status": "ok", "articles": []})), one_article()],
        );
        let mut rotation = controller(3);

        let outcome = rotation
            .fetch_with_rotation(&transport, &PageQuery::new(Category::Science, 9))
            .await
            .unwrap();

        assert!(outcome.articles.is_empty());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(rotation.cursor().index(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_success_rotates() {
        let transport = ScriptedTransport::new().on(
            HOST,
            [Reply::Status(200, "not json".into()), one_article()],
        );
        let mut rotation = controller(2);

        let outcome = rotation
            .fetch_with_rotation(&transport, &PageQuery::new(Category::All, 1))
            .await
            .unwrap();
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn test_cursor_sticks_to_working_key_across_calls() {
        let transport = ScriptedTransport::new().on(
            HOST,
            [Reply::Fail("timeout".into()), one_article(), one_article()],
        );
        let mut rotation = controller(3);

        rotation
            .fetch_with_rotation(&transport, &PageQuery::new(Category::All, 1))
            .await
            .unwrap();
        let second = rotation
            .fetch_with_rotation(&transport, &PageQuery::new(Category::All, 2))
            .await
            .unwrap();

        assert_eq!(second.attempts, 1);
        assert_eq!(second.credential_index, 1);
        assert_eq!(keys_used(&transport), vec!["key-1", "key-2", "key-2"]);
    }

    #[tokio::test]
    async fn test_exhaustion_persists_until_reset() {
        let transport = ScriptedTransport::new().on(
            HOST,
            [Reply::Fail("down".into()), one_article()],
        );
        let mut rotation = controller(1);
        let query = PageQuery::new(Category::All, 1);

        assert!(rotation.fetch_with_rotation(&transport, &query).await.is_err());
        let again = rotation.fetch_with_rotation(&transport, &query).await.unwrap_err();
        assert_eq!(again.attempts, 0);
        assert_eq!(transport.requests().len(), 1);

        rotation.reset();
        let outcome = rotation.fetch_with_rotation(&transport, &query).await.unwrap();
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_no_credentials_is_immediately_exhausted() {
        let transport = ScriptedTransport::new();
        let mut rotation = controller(0);
        let err = rotation
            .fetch_with_rotation(&transport, &PageQuery::new(Category::All, 1))
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 0);
        assert!(err.last.is_none());
        assert!(transport.requests().is_empty());
    }
}
