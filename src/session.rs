//! The browsing session: command handlers between the UI and the core.
//!
//! A [`Session`] owns everything that lives for one browsing session:
//!
//! - the NewsAPI [`RotationController`] (and its rotation cursor)
//! - the single-key Mediastack [`SingleKeySource`]
//! - the [`Pagination`] state and the current [`Category`]
//! - the [`FeedbackClient`]
//!
//! The UI adapter (the interactive loop in `repl`, or the one-shot path in
//! `main`) only ever calls the handlers here and hands in a [`RenderSink`].
//!
//! # Fetch Cycle
//!
//! 1. `loading(true)` on the sink
//! 2. NewsAPI (rotating) and Mediastack (retrying) are fetched concurrently
//! 3. Both results are turned into regions, or merged into one
//! 4. `render` once, then `loading(false)` after the minimum loader time
//!
//! Commands are handled one at a time, so a slow response can never land on
//! top of a newer page.

use crate::api::{HttpTransport, RetryPolicy, RetryTransport};
use crate::error::{ConfigError, ExhaustedError, FeedbackError, FetchError};
use crate::feedback::{FeedbackClient, FeedbackForm};
use crate::models::{Article, Category, Credential, PageQuery, PageView, Region, RegionOutcome};
use crate::outputs::RenderSink;
use crate::pagination::Pagination;
use crate::providers::{Mediastack, NewsApi, NewsProvider, fetch_page};
use crate::rotation::{RotationController, RotationOutcome};
use itertools::Itertools;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, instrument, warn};

/// Shown when every NewsAPI key failed.
pub const EXHAUSTED_MESSAGE: &str = "Failed to fetch news from News API. Please try again later.";

/// Prefix for failures of the single-key provider; the error text follows.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch news. Please try again later.";

pub const FEEDBACK_OK_MESSAGE: &str = "Feedback submitted successfully!";
pub const FEEDBACK_FAILED_MESSAGE: &str = "Error submitting feedback. Please try again.";

pub const MERGED_LABEL: &str = "All sources";

pub const HELP_TEXT: &str = "\
Commands:
  next | n                 next page
  prev | p                 previous page
  page <n>                 jump to page n
  category <name> | c      switch category (all, business, entertainment,
                           general, health, science, sports, technology)
  reload | r               retry from the first API key
  feedback <email> <text>  send feedback
  login | signup           account actions
  help | ?                 this text
  quit | q                 exit";

/// How provider results are laid out on the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// One region per provider, primary first.
    #[default]
    Regions,
    /// One region, all articles newest first.
    Merged,
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regions" => Ok(Layout::Regions),
            "merged" => Ok(Layout::Merged),
            other => Err(format!("unknown layout {other:?} (expected regions or merged)")),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Layout::Regions => "regions",
            Layout::Merged => "merged",
        })
    }
}

/// A user intent, as produced by the UI adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load,
    Reload,
    SetCategory(Category),
    NextPage,
    PreviousPage,
    GoToPage(u32),
    Feedback(FeedbackForm),
    Login,
    SignUp,
    Help,
    Quit,
}

/// Whether the UI loop should keep going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A provider with exactly one credential. Its errors reach the user as-is.
#[derive(Debug)]
pub struct SingleKeySource<P> {
    provider: P,
    credential: Credential,
}

impl<P: NewsProvider> SingleKeySource<P> {
    pub fn new(provider: P, credential: Credential) -> Self {
        Self {
            provider,
            credential,
        }
    }

    pub async fn fetch<T: HttpTransport>(
        &self,
        transport: &T,
        query: &PageQuery,
    ) -> Result<Vec<Article>, FetchError> {
        fetch_page(transport, &self.provider, query, &self.credential).await
    }
}

/// Session-wide knobs that are not provider configuration.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub layout: Layout,
    /// The loader stays up at least this long, so fast responses don't flicker.
    pub loader_min_display: Duration,
    /// Backoff for the single-key provider only.
    pub retry: RetryPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            layout: Layout::Regions,
            loader_min_display: Duration::from_millis(300),
            retry: RetryPolicy::default(),
        }
    }
}

/// One browsing session.
pub struct Session<T> {
    transport: T,
    primary: Option<RotationController<NewsApi>>,
    secondary: Option<SingleKeySource<Mediastack>>,
    feedback: FeedbackClient,
    pagination: Pagination,
    category: Category,
    options: SessionOptions,
}

impl<T> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("primary", &self.primary)
            .field("secondary", &self.secondary)
            .field("pagination", &self.pagination)
            .field("category", &self.category)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<T> Session<T>
where
    T: HttpTransport,
{
    /// Assemble a session. At least one provider is required.
    pub fn new(
        transport: T,
        primary: Option<RotationController<NewsApi>>,
        secondary: Option<SingleKeySource<Mediastack>>,
        feedback: FeedbackClient,
        page_size: u32,
        options: SessionOptions,
    ) -> Result<Self, ConfigError> {
        if primary.is_none() && secondary.is_none() {
            return Err(ConfigError::NoProviders);
        }
        Ok(Self {
            transport,
            primary,
            secondary,
            feedback,
            pagination: Pagination::new(page_size),
            category: Category::All,
            options,
        })
    }

    pub fn query(&self) -> PageQuery {
        self.pagination.query(self.category)
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn category(&self) -> Category {
        self.category
    }

    #[cfg(test)]
    pub fn primary(&self) -> Option<&RotationController<NewsApi>> {
        self.primary.as_ref()
    }

    /// Set where browsing starts without fetching anything.
    pub fn set_position(&mut self, category: Category, page: u32) {
        self.category = category;
        self.pagination.go_to_page(page);
    }

    /// Dispatch one command.
    pub async fn handle<S: RenderSink>(&mut self, command: Command, sink: &mut S) -> Flow {
        debug!(?command, "Handling command");
        match command {
            Command::Load => self.initial_load(sink).await,
            Command::Reload => self.reload(sink).await,
            Command::SetCategory(category) => self.change_category(category, sink).await,
            Command::NextPage => self.next_page(sink).await,
            Command::PreviousPage => {
                self.previous_page(sink).await;
            }
            Command::GoToPage(page) => self.go_to_page(page, sink).await,
            Command::Feedback(form) => self.submit_feedback(&form, sink).await,
            Command::Login => sink.notify("Login functionality coming soon!"),
            Command::SignUp => sink.notify("Sign-Up functionality coming soon!"),
            Command::Help => sink.notify(HELP_TEXT),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    pub async fn initial_load<S: RenderSink>(&mut self, sink: &mut S) {
        self.refresh(sink).await;
    }

    /// New filter: back to page 1 with a fresh rotation budget.
    pub async fn change_category<S: RenderSink>(&mut self, category: Category, sink: &mut S) {
        info!(from = %self.category, to = %category, "Category changed");
        self.category = category;
        self.pagination.reset();
        if let Some(rotation) = self.primary.as_mut() {
            rotation.reset();
        }
        self.refresh(sink).await;
    }

    pub async fn next_page<S: RenderSink>(&mut self, sink: &mut S) {
        self.pagination.next();
        self.refresh(sink).await;
    }

    /// Returns `false` without fetching when already on page 1.
    pub async fn previous_page<S: RenderSink>(&mut self, sink: &mut S) -> bool {
        if !self.pagination.previous() {
            debug!("Already on the first page");
            return false;
        }
        self.refresh(sink).await;
        true
    }

    pub async fn go_to_page<S: RenderSink>(&mut self, page: u32, sink: &mut S) {
        self.pagination.go_to_page(page);
        self.refresh(sink).await;
    }

    /// Same page again, starting from the first API key.
    pub async fn reload<S: RenderSink>(&mut self, sink: &mut S) {
        if let Some(rotation) = self.primary.as_mut() {
            rotation.reset();
        }
        self.refresh(sink).await;
    }

    pub async fn submit_feedback<S: RenderSink>(&mut self, form: &FeedbackForm, sink: &mut S) {
        match self.feedback.submit(&self.transport, form).await {
            Ok(()) => sink.notify(FEEDBACK_OK_MESSAGE),
            Err(e @ (FeedbackError::InvalidEmail | FeedbackError::TooShort { .. })) => {
                sink.notify(&e.to_string())
            }
            Err(_) => sink.notify(FEEDBACK_FAILED_MESSAGE),
        }
    }

    #[instrument(level = "info", skip_all, fields(category = %self.category, page = self.pagination.page(), offset = self.pagination.current_offset()))]
    async fn refresh<S: RenderSink>(&mut self, sink: &mut S) {
        let query = self.query();
        let started = Instant::now();
        sink.loading(true);

        let transport = &self.transport;
        let primary = &mut self.primary;
        let secondary = &self.secondary;
        let retrying = RetryTransport::new(transport, self.options.retry.clone());

        let primary_fut = async {
            match primary.as_mut() {
                Some(rotation) => Some(rotation.fetch_with_rotation(transport, &query).await),
                None => None,
            }
        };
        let secondary_fut = async {
            match secondary.as_ref() {
                Some(source) => Some(source.fetch(&retrying, &query).await),
                None => None,
            }
        };
        let (primary_result, secondary_result) = futures::join!(primary_fut, secondary_fut);

        let regions = match self.options.layout {
            Layout::Regions => regions_layout(primary_result, secondary_result),
            Layout::Merged => vec![merged_layout(primary_result, secondary_result)],
        };
        let view = PageView {
            query,
            previous_enabled: self.pagination.previous_enabled(),
            regions,
        };
        sink.render(&view).await;

        let elapsed = started.elapsed();
        if elapsed < self.options.loader_min_display {
            sleep(self.options.loader_min_display - elapsed).await;
        }
        sink.loading(false);
    }
}

fn articles_outcome(articles: Vec<Article>) -> RegionOutcome {
    if articles.is_empty() {
        RegionOutcome::NoResults
    } else {
        RegionOutcome::Articles(articles)
    }
}

fn exhausted_message(e: &ExhaustedError) -> String {
    error!(provider = e.provider, attempts = e.attempts, "Showing exhaustion message");
    EXHAUSTED_MESSAGE.to_string()
}

fn fetch_failed_message(e: &FetchError) -> String {
    error!(error = %e, "Showing fetch failure message");
    format!("{FETCH_FAILED_MESSAGE}\n{e}")
}

fn regions_layout(
    primary: Option<Result<RotationOutcome, ExhaustedError>>,
    secondary: Option<Result<Vec<Article>, FetchError>>,
) -> Vec<Region> {
    let mut regions = Vec::with_capacity(2);
    if let Some(result) = primary {
        let outcome = match result {
            Ok(rotated) => articles_outcome(rotated.articles),
            Err(e) => RegionOutcome::Failed(exhausted_message(&e)),
        };
        regions.push(Region {
            label: "NewsAPI".to_string(),
            outcome,
        });
    }
    if let Some(result) = secondary {
        let outcome = match result {
            Ok(articles) => articles_outcome(articles),
            Err(e) => RegionOutcome::Failed(fetch_failed_message(&e)),
        };
        regions.push(Region {
            label: "Mediastack".to_string(),
            outcome,
        });
    }
    regions
}

/// Newest first; undated articles sink to the end in their original order.
fn merged_layout(
    primary: Option<Result<RotationOutcome, ExhaustedError>>,
    secondary: Option<Result<Vec<Article>, FetchError>>,
) -> Region {
    let mut batches: Vec<Vec<Article>> = Vec::new();
    let mut failures: Vec<String> = Vec::new();

    match primary {
        Some(Ok(rotated)) => batches.push(rotated.articles),
        Some(Err(e)) => failures.push(exhausted_message(&e)),
        None => {}
    }
    match secondary {
        Some(Ok(articles)) => batches.push(articles),
        Some(Err(e)) => failures.push(fetch_failed_message(&e)),
        None => {}
    }

    let outcome = if batches.is_empty() {
        RegionOutcome::Failed(failures.join("\n"))
    } else {
        if !failures.is_empty() {
            warn!(failed = failures.len(), "Merging partial results");
        }
        let merged = batches
            .into_iter()
            .flatten()
            .sorted_by(|a, b| b.published_at.cmp(&a.published_at))
            .collect::<Vec<_>>();
        articles_outcome(merged)
    };

    Region {
        label: MERGED_LABEL.to_string(),
        outcome,
    }
}
