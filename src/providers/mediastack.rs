//! Mediastack news client.
//!
//! Queries [`/v1/news`](https://mediastack.com/documentation) using
//! `limit`/`offset` pagination. Only a single key is configured for this
//! provider, so its failures are shown to the user directly instead of being
//! rotated away.

use super::{NewsProvider, parse_base};
use crate::models::{Article, Credential, PageQuery, parse_published_at};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://api.mediastack.com/v1/news";

/// `{ "pagination": {...}, "data": [...] }`
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Vec<RawArticle>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawArticle {
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    image: Option<String>,
    published_at: Option<String>,
}

/// Mediastack client configuration.
#[derive(Debug, Clone)]
pub struct Mediastack {
    base: Url,
    countries: String,
}

impl Mediastack {
    pub fn new(base_url: &str, countries: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: parse_base(base_url)?,
            countries: countries.to_string(),
        })
    }
}

impl NewsProvider for Mediastack {
    fn name(&self) -> &'static str {
        "Mediastack"
    }

    fn build_request(&self, query: &PageQuery, credential: &Credential) -> Url {
        let mut url = self.base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("access_key", credential.expose())
                .append_pair("limit", &query.page_size.to_string())
                .append_pair("offset", &query.offset.to_string())
                .append_pair("countries", &self.countries);
            if let Some(category) = query.category.as_filter() {
                pairs.append_pair("categories", category);
            }
        }
        url
    }

    fn parse_response(&self, body: &str) -> Result<Vec<Article>, serde_json::Error> {
        let parsed: Envelope = serde_json::from_str(body)?;
        Ok(parsed
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|raw| Article {
                published_at: parse_published_at(raw.published_at.as_deref()),
                title: raw.title,
                description: raw.description,
                url: raw.url,
                image_url: raw.image,
                author: raw.author,
                content: None,
                source: Some(self.name().to_string()),
            })
            .collect())
    }
}
