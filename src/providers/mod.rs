//! News provider clients.
//!
//! Each provider knows how to turn a [`PageQuery`] plus a [`Credential`] into
//! a request URL, and how to turn a response body into normalized
//! [`Article`]s. Everything else (sending, status handling, logging) is shared
//! in [`fetch_page`].
//!
//! # Supported Providers
//!
//! | Provider | Module | Pagination | Article list | Image field |
//! |----------|--------|------------|--------------|-------------|
//! | NewsAPI | [`newsapi`] | `page=<n>` | `articles` | `urlToImage` |
//! | Mediastack | [`mediastack`] | `offset=(n-1)*size` | `data` | `image` |
//!
//! The category parameter is only sent when the category is not the "all"
//! sentinel. An empty article list is a normal, successful outcome.

use crate::api::HttpTransport;
use crate::error::FetchError;
use crate::models::{Article, Credential, PageQuery};
use crate::utils::{redact_url, truncate_for_log};
use tracing::{debug, info, instrument, warn};
use url::Url;

pub mod mediastack;
pub mod newsapi;

pub use mediastack::Mediastack;
pub use newsapi::NewsApi;

/// How much of an error body to keep in the logs.
const LOG_BODY_PREVIEW: usize = 300;

/// A news API that can be queried page by page.
pub trait NewsProvider {
    /// Human-readable label, also stamped onto every article as its source.
    fn name(&self) -> &'static str;

    /// Build the full request URL for `query` authenticated with `credential`.
    fn build_request(&self, query: &PageQuery, credential: &Credential) -> Url;

    /// Extract and normalize the article list from a successful response body.
    fn parse_response(&self, body: &str) -> Result<Vec<Article>, serde_json::Error>;
}

/// Perform one request against `provider` and normalize the result.
///
/// # Errors
///
/// - [`FetchError::Transport`] when no response arrived
/// - [`FetchError::Provider`] for a non-success status, carrying the body
/// - [`FetchError::Decode`] when a success body is not the expected JSON
#[instrument(level = "info", skip_all, fields(provider = provider.name(), page = query.page, category = %query.category))]
pub async fn fetch_page<T, P>(
    transport: &T,
    provider: &P,
    query: &PageQuery,
    credential: &Credential,
) -> Result<Vec<Article>, FetchError>
where
    T: HttpTransport,
    P: NewsProvider + ?Sized,
{
    let url = provider.build_request(query, credential);
    debug!(url = %redact_url(&url), "Requesting URL");

    let resp = transport.get(&url).await?;
    if !resp.is_success() {
        warn!(
            status = resp.status,
            body = %truncate_for_log(&resp.body, LOG_BODY_PREVIEW),
            "Provider request failed"
        );
        return Err(FetchError::Provider {
            status: resp.status,
            body: resp.body,
        });
    }

    let articles = provider.parse_response(&resp.body).inspect_err(|e| {
        warn!(
            error = %e,
            body = %truncate_for_log(&resp.body, LOG_BODY_PREVIEW),
            "Provider returned non-conforming JSON"
        )
    })?;
    info!(count = articles.len(), "Fetched articles");
    Ok(articles)
}

/// Parse a configured base endpoint, rejecting anything that can't carry a
/// query string.
pub(crate) fn parse_base(base_url: &str) -> Result<Url, url::ParseError> {
    let url = Url::parse(base_url)?;
    if url.cannot_be_a_base() {
        return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
    }
    Ok(url)
}
