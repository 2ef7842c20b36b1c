//! HTTP transport abstraction with an optional exponential backoff decorator.
//!
//! Providers, the rotation controller, and the feedback client never talk to
//! `reqwest` directly. They go through [`HttpTransport`], which keeps them
//! testable without a network and lets decorators stack on top.
//!
//! # Architecture
//!
//! - [`HttpTransport`]: core trait, GET and JSON POST returning status + body
//! - [`ReqwestTransport`]: the real implementation
//! - [`RetryTransport`]: decorator that retries transient failures
//!
//! # Retry Strategy
//!
//! Only transport errors, `429`, and `5xx` are retried. The delay between
//! retries is:
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```
//!
//! The rotating NewsAPI client is never wrapped: a failing key is rotated away
//! immediately instead of being retried.

use crate::error::FetchError;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};
use url::Url;

/// Status and body of a completed HTTP exchange.
///
/// A non-success status is still an `Ok` at this layer; deciding what a
/// status means is the caller's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_retryable(&self) -> bool {
        self.status == 429 || self.status >= 500
    }
}

/// Trait for async HTTP access.
///
/// Implementors only report [`FetchError::Transport`]; status handling is left
/// to callers.
pub trait HttpTransport {
    /// Issue a GET and collect the body as text.
    async fn get(&self, url: &Url) -> Result<HttpResponse, FetchError>;

    /// POST `body` as `application/json` and collect the response body.
    async fn post_json(
        &self,
        url: &Url,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, FetchError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport. `timeout` of `None` leaves requests unbounded.
    pub fn new(timeout: Option<StdDuration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("awful_headlines/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, FetchError> {
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpResponse { status, body })
    }

    async fn post_json(
        &self,
        url: &Url,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, FetchError> {
        let resp = self.client.post(url.clone()).json(body).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Backoff knobs for [`RetryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    pub base_delay: StdDuration,
    /// Cap on the exponential part of the delay.
    pub max_delay: StdDuration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn delay_for(&self, attempt: usize) -> StdDuration {
        let shift = (attempt.saturating_sub(1)).min(31) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0, StdDuration::from_secs(1))
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`HttpTransport`].
///
/// A retryable status is only retried while attempts remain; the last
/// response is handed back as-is so the caller can report its status and body.
pub struct RetryTransport<'a, T> {
    inner: &'a T,
    policy: RetryPolicy,
}

impl<'a, T> RetryTransport<'a, T>
where
    T: HttpTransport,
{
    pub fn new(inner: &'a T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn with_backoff<F, Fut>(&self, what: &str, mut call: F) -> Result<HttpResponse, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<HttpResponse, FetchError>>,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let result = call().await;
            let retryable = match &result {
                Ok(resp) => resp.is_retryable(),
                Err(FetchError::Transport(_)) => true,
                Err(_) => false,
            };
            if !retryable {
                return result;
            }

            attempt += 1;
            if attempt > self.policy.max_retries {
                if self.policy.max_retries > 0 {
                    error!(
                        attempt,
                        max = self.policy.max_retries,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        what,
                        "request exhausted retries"
                    );
                }
                return result;
            }

            let delay = self.policy.delay_for(attempt);
            match &result {
                Ok(resp) => warn!(
                    attempt,
                    max = self.policy.max_retries,
                    status = resp.status,
                    ?delay,
                    what,
                    "retryable status; backing off"
                ),
                Err(e) => warn!(
                    attempt,
                    max = self.policy.max_retries,
                    error = %e,
                    ?delay,
                    what,
                    "request failed; backing off"
                ),
            }
            sleep(delay).await;
        }
    }
}

impl<T> fmt::Debug for RetryTransport<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTransport")
            .field("max_retries", &self.policy.max_retries)
            .field("base_delay", &self.policy.base_delay)
            .field("max_delay", &self.policy.max_delay)
            .finish()
    }
}

impl<T> HttpTransport for RetryTransport<'_, T>
where
    T: HttpTransport,
{
    #[instrument(level = "debug", skip_all, fields(host = url.host_str().unwrap_or_default()))]
    async fn get(&self, url: &Url) -> Result<HttpResponse, FetchError> {
        debug!("GET with backoff");
        self.with_backoff("get", || self.inner.get(url)).await
    }

    #[instrument(level = "debug", skip_all, fields(host = url.host_str().unwrap_or_default()))]
    async fn post_json(
        &self,
        url: &Url,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, FetchError> {
        self.with_backoff("post", || self.inner.post_json(url, body))
            .await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Reply, ScriptedTransport};
    use super::*;

    fn url() -> Url {
        Url::parse("http://flaky.test/v1/news").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_after_server_errors() {
        let transport = ScriptedTransport::new().on(
            "flaky.test",
            [
                Reply::Status(503, "busy".into()),
                Reply::Fail("reset".into()),
                Reply::Status(200, "{}".into()),
            ],
        );
        let retrying = RetryTransport::new(&transport, RetryPolicy::new(3, StdDuration::from_millis(10)));

        let resp = retrying.get(&url()).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_and_returns_last_response() {
        let transport = ScriptedTransport::new().on(
            "flaky.test",
            std::iter::repeat_n(Reply::Status(500, "boom".into()), 5),
        );
        let retrying = RetryTransport::new(&transport, RetryPolicy::new(2, StdDuration::from_millis(10)));

        let resp = retrying.get(&url()).await.unwrap();
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body, "boom");
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let transport = ScriptedTransport::new().on(
            "flaky.test",
            [Reply::Status(401, "invalid_access_key".into())],
        );
        let retrying = RetryTransport::new(&transport, RetryPolicy::new(5, StdDuration::from_millis(10)));

        let resp = retrying.get(&url()).await.unwrap();
        assert_eq!(resp.status, 401);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_is_a_passthrough() {
        let transport = ScriptedTransport::new().on("flaky.test", [Reply::Fail("dns".into())]);
        let retrying = RetryTransport::new(&transport, RetryPolicy::default());

        assert!(matches!(
            retrying.get(&url()).await,
            Err(FetchError::Transport(_))
        ));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_credentials() {
        let transport = ReqwestTransport::new(Some(StdDuration::from_secs(2))).unwrap();
        let url = Url::parse("http://127.0.0.1:1/v1/news?access_key=SUPERSECRETKEY123&limit=10")
            .unwrap();

        let err = transport.get(&url).await.unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, FetchError::Transport(_)));
        assert!(!text.contains("SUPERSECRETKEY123"), "{text}");
        assert!(text.contains("127.0.0.1"));
        assert!(text.contains("limit=10"));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: StdDuration::from_secs(1),
            max_delay: StdDuration::from_secs(4),
        };
        let delay = policy.delay_for(8);
        assert!(delay >= StdDuration::from_secs(4));
        assert!(delay <= StdDuration::from_millis(4250));
    }
}
