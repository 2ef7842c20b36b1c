//! Error types shared across providers, rotation, feedback, and configuration.
//!
//! None of these are fatal to an interactive session: the [`Session`](crate::session::Session)
//! turns them into user-facing messages after logging them. Only configuration
//! errors at startup abort the process.

use crate::utils::redact_url;
use thiserror::Error;

/// A single request to a news provider failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, TLS, reset...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider error (status {status}): {body}")]
    Provider { status: u16, body: String },

    /// The provider answered 2xx but the body was not the JSON we expect.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for FetchError {
    /// reqwest appends the request URL to its message, and provider URLs carry
    /// the API key, so the URL is stripped and re-attached redacted.
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(redact_url);
        let err = err.without_url();
        match url {
            Some(url) => FetchError::Transport(format!("{err} ({url})")),
            None => FetchError::Transport(err.to_string()),
        }
    }
}

/// Every credential of a rotating provider has been tried and failed.
#[derive(Debug, Error)]
#[error("all credentials for {provider} failed after {attempts} attempt(s)")]
pub struct ExhaustedError {
    pub provider: &'static str,
    /// Attempts made by the call that reported exhaustion. Zero when the
    /// cursor was already past the last credential.
    pub attempts: usize,
    #[source]
    pub last: Option<FetchError>,
}

/// Feedback was rejected locally or by the backend.
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Feedback must be at least {min} characters long")]
    TooShort { min: usize },

    #[error("feedback endpoint returned status {status}")]
    Rejected { status: u16 },

    #[error(transparent)]
    Transport(#[from] FetchError),
}

/// Startup configuration could not be assembled.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid {field} URL {value:?}: {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("page_size must be at least 1 (got {0})")]
    InvalidPageSize(u32),

    #[error("no news provider configured: supply at least one NewsAPI key or a Mediastack key")]
    NoProviders,
}
