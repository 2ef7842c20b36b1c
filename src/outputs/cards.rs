//! Terminal rendering of article cards.
//!
//! Each page is written as Markdown-flavoured text: a header with the
//! category and page, one section per region, one card per article, and a
//! footer showing the state of the previous/next controls.

use super::{NO_RESULTS_MESSAGE, RenderSink};
use crate::models::{Article, PageView, RegionOutcome};
use crate::utils::upcase;
use std::io::Write;
use tracing::warn;

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/350x200";
pub const PLACEHOLDER_TITLE: &str = "No title available";
pub const PLACEHOLDER_DESCRIPTION: &str = "No description available.";
pub const PLACEHOLDER_LINK: &str = "#";

/// Format one article card, substituting placeholders for missing fields.
pub fn article_card(article: &Article) -> String {
    let title = article.title.as_deref().unwrap_or(PLACEHOLDER_TITLE);
    let mut card = format!("### {title}\n");
    let published = article
        .published_at
        .map(|p| p.format("%Y-%m-%d %H:%M UTC").to_string());
    match (published, article.author.as_deref()) {
        (Some(published), Some(author)) => card.push_str(&format!("_{published} · {author}_\n")),
        (Some(published), None) => card.push_str(&format!("_{published}_\n")),
        (None, Some(author)) => card.push_str(&format!("_{author}_\n")),
        (None, None) => {}
    }
    card.push_str(&format!(
        "![{}]({})\n",
        article.title.as_deref().unwrap_or("News Image"),
        article.image_url.as_deref().unwrap_or(PLACEHOLDER_IMAGE)
    ));
    card.push_str(article.description.as_deref().unwrap_or(PLACEHOLDER_DESCRIPTION));
    card.push('\n');
    card.push_str(&format!(
        "[Read more]({})\n",
        article.url.as_deref().unwrap_or(PLACEHOLDER_LINK)
    ));
    card
}

/// Format a whole page.
pub fn page_to_markdown(view: &PageView) -> String {
    let mut md = format!(
        "# {} headlines · page {}\n\n",
        upcase(view.query.category.as_str()),
        view.query.page
    );

    for region in &view.regions {
        md.push_str(&format!("## {}\n\n", region.label));
        match &region.outcome {
            RegionOutcome::Articles(articles) => {
                for article in articles {
                    md.push_str(&article_card(article));
                    md.push('\n');
                }
            }
            RegionOutcome::NoResults => md.push_str(&format!("{NO_RESULTS_MESSAGE}\n\n")),
            RegionOutcome::Failed(message) => md.push_str(&format!("{message}\n\n")),
        }
    }

    let previous = if view.previous_enabled { "[prev]" } else { "[prev: disabled]" };
    md.push_str(&format!("{previous}  page {}  [next]\n", view.query.page));
    md
}

/// [`RenderSink`] writing cards to any `io::Write`, usually stdout.
#[derive(Debug)]
pub struct TerminalSink<W> {
    out: W,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            warn!(error = %e, "Failed to write to terminal");
        }
    }
}

impl<W: Write> RenderSink for TerminalSink<W> {
    fn loading(&mut self, active: bool) {
        if active {
            self.emit("Loading…\n");
        }
    }

    async fn render(&mut self, view: &PageView) {
        let md = page_to_markdown(view);
        self.emit(&md);
    }

    fn notify(&mut self, message: &str) {
        self.emit(&format!("» {message}\n"));
    }
}
