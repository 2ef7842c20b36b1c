//! Runtime configuration.
//!
//! Settings come from an optional YAML file, then CLI flags and environment
//! variables override them. API keys are never compiled in.
//!
//! # Example `config.yaml`
//!
//! ```yaml
//! newsapi:
//!   keys: ["first-key", "second-key", "third-key"]
//! mediastack:
//!   key: "mediastack-key"
//! country: us
//! page_size: 10
//! feedback_url: http://localhost:8080/feedback
//! layout: regions
//! request_retries: 2
//! ```

use crate::api::{HttpTransport, RetryPolicy};
use crate::cli::Cli;
use crate::error::ConfigError;
use crate::feedback::{DEFAULT_FEEDBACK_URL, FeedbackClient};
use crate::models::Credential;
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::providers::{Mediastack, NewsApi, mediastack, newsapi};
use crate::rotation::RotationController;
use crate::session::{Layout, Session, SessionOptions, SingleKeySource};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsApiConfig {
    pub base_url: String,
    /// Tried in order; the first that works is kept until it fails.
    pub keys: Vec<Credential>,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            base_url: newsapi::DEFAULT_BASE_URL.to_string(),
            keys: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediastackConfig {
    pub base_url: String,
    pub key: Option<Credential>,
}

impl Default for MediastackConfig {
    fn default() -> Self {
        Self {
            base_url: mediastack::DEFAULT_BASE_URL.to_string(),
            key: None,
        }
    }
}

/// Everything needed to build a [`Session`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub newsapi: NewsApiConfig,
    pub mediastack: MediastackConfig,
    /// Two-letter country code sent to both providers.
    pub country: String,
    pub page_size: u32,
    pub feedback_url: String,
    pub layout: Layout,
    /// Quiet period before a category change is applied.
    pub debounce_ms: u64,
    pub loader_min_display_ms: u64,
    /// Retries for the single-key provider (0 = none).
    pub request_retries: usize,
    pub retry_base_delay_ms: u64,
    /// Per-request timeout; unset means no timeout.
    pub request_timeout_secs: Option<u64>,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            newsapi: NewsApiConfig::default(),
            mediastack: MediastackConfig::default(),
            country: "us".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            feedback_url: DEFAULT_FEEDBACK_URL.to_string(),
            layout: Layout::Regions,
            debounce_ms: 300,
            loader_min_display_ms: 300,
            request_retries: 0,
            retry_base_delay_ms: 1000,
            request_timeout_secs: None,
        }
    }
}

impl NewsConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str, path: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no provider can page with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::InvalidPageSize(self.page_size));
        }
        Ok(())
    }

    /// Load from `path`, or fall back to defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        let config = Self::from_yaml(&yaml, path)?;
        info!(
            newsapi_keys = config.newsapi.keys.len(),
            mediastack = config.mediastack.key.is_some(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Let flags and environment variables win over the file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if !cli.newsapi_keys.is_empty() {
            self.newsapi.keys = cli
                .newsapi_keys
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(Credential::new)
                .collect();
        }
        if let Some(key) = cli.mediastack_key.as_deref().map(str::trim) {
            if !key.is_empty() {
                self.mediastack.key = Some(Credential::new(key));
            }
        }
        if let Some(url) = &cli.feedback_url {
            self.feedback_url = url.clone();
        }
        if let Some(layout) = cli.layout {
            self.layout = layout;
        }
        if let Some(retries) = cli.retries {
            self.request_retries = retries;
        }
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            layout: self.layout,
            loader_min_display: Duration::from_millis(self.loader_min_display_ms),
            retry: RetryPolicy::new(
                self.request_retries,
                Duration::from_millis(self.retry_base_delay_ms),
            ),
        }
    }

    /// Build the providers and a [`Session`] over `transport`.
    ///
    /// A provider without credentials is left out. Having neither is an error.
    pub fn build_session<T: HttpTransport>(&self, transport: T) -> Result<Session<T>, ConfigError> {
        self.validate()?;
        let primary = if self.newsapi.keys.is_empty() {
            None
        } else {
            let provider = NewsApi::new(&self.newsapi.base_url, &self.country)
                .map_err(|source| invalid_url("newsapi.base_url", &self.newsapi.base_url, source))?;
            Some(RotationController::new(provider, self.newsapi.keys.clone()))
        };

        let secondary = match &self.mediastack.key {
            Some(key) => {
                let provider = Mediastack::new(&self.mediastack.base_url, &self.country)
                    .map_err(|source| {
                        invalid_url("mediastack.base_url", &self.mediastack.base_url, source)
                    })?;
                Some(SingleKeySource::new(provider, key.clone()))
            }
            None => None,
        };

        let feedback_url = Url::parse(&self.feedback_url)
            .map_err(|source| invalid_url("feedback_url", &self.feedback_url, source))?;

        Session::new(
            transport,
            primary,
            secondary,
            FeedbackClient::new(feedback_url),
            self.page_size,
            self.session_options(),
        )
    }
}

fn invalid_url(field: &'static str, value: &str, source: url::ParseError) -> ConfigError {
    ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        source,
    }
}
