//! NewsAPI top headlines client.
//!
//! Queries [`/v2/top-headlines`](https://newsapi.org/docs/endpoints/top-headlines)
//! with a 1-based `page` index. This is the provider that rotates across
//! several API keys, since the free tier rate-limits aggressively.
//!
//! # Response Shape
//!
//! ```json
//! { "status": "ok", "totalResults": 38,
//!   "articles": [{ "source": {"id": null, "name": "CNN"}, "author": "...",
//!                  "title": "...", "description": "...", "url": "...",
//!                  "urlToImage": "...", "publishedAt": "2024-05-06T12:00:00Z" }] }
//! ```

use super::{NewsProvider, parse_base};
use crate::models::{Article, Credential, PageQuery, parse_published_at};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2/top-headlines";

#[derive(Debug, Deserialize)]
struct TopHeadlines {
    #[serde(default)]
    articles: Option<Vec<RawArticle>>,
}

#[allow(non_snake_case)]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawArticle {
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    urlToImage: Option<String>,
    publishedAt: Option<String>,
    content: Option<String>,
}

/// NewsAPI client configuration.
#[derive(Debug, Clone)]
pub struct NewsApi {
    base: Url,
    country: String,
}

impl NewsApi {
    pub fn new(base_url: &str, country: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: parse_base(base_url)?,
            country: country.to_string(),
        })
    }
}

impl NewsProvider for NewsApi {
    fn name(&self) -> &'static str {
        "NewsAPI"
    }

    fn build_request(&self, query: &PageQuery, credential: &Credential) -> Url {
        let mut url = self.base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("apiKey", credential.expose())
                .append_pair("country", &self.country)
                .append_pair("pageSize", &query.page_size.to_string())
                .append_pair("page", &query.page.to_string());
            if let Some(category) = query.category.as_filter() {
                pairs.append_pair("category", category);
            }
        }
        url
    }

    fn parse_response(&self, body: &str) -> Result<Vec<Article>, serde_json::Error> {
        let parsed: TopHeadlines = serde_json::from_str(body)?;
        Ok(parsed
            .articles
            .unwrap_or_default()
            .into_iter()
            .map(|raw| Article {
                published_at: parse_published_at(raw.publishedAt.as_deref()),
                title: raw.title,
                description: raw.description,
                url: raw.url,
                image_url: raw.urlToImage,
                author: raw.author,
                content: raw.content,
                source: Some(self.name().to_string()),
            })
            .collect())
    }
}
